// Building-scoped resource accessors.
//
// Each method maps typed parameters onto one endpoint under
// `/buildings`. Nothing here retries or caches.

use crate::client::{ApiClient, Segment};
use crate::error::Error;
use crate::query::QueryParams;
use crate::types::{
    AlertList, Building, BuildingList, EnergyData, EnergyQuery, EquipmentList, HvacStatus,
    IaqStatus, KpiPeriod, Kpis, SetpointResponse, SetpointUpdate,
};

impl ApiClient {
    /// `GET /buildings`
    pub async fn list_buildings(&self) -> Result<BuildingList, Error> {
        self.get("/buildings").await
    }

    /// `GET /buildings/{id}`
    pub async fn get_building(&self, building_id: &str) -> Result<Building, Error> {
        self.get(&format!("/buildings/{}", Segment(building_id))).await
    }

    /// `GET /buildings/{id}/energy?from&to&resolution`
    pub async fn get_energy(
        &self,
        building_id: &str,
        query: &EnergyQuery,
    ) -> Result<EnergyData, Error> {
        let params = QueryParams::new()
            .push("from", query.from)
            .push("to", query.to)
            .push("resolution", query.resolution.map(|r| r.to_string()));
        self.get_with_query(&format!("/buildings/{}/energy", Segment(building_id)), params)
            .await
    }

    /// `GET /buildings/{id}/equipment`
    pub async fn get_equipment(&self, building_id: &str) -> Result<EquipmentList, Error> {
        self.get(&format!("/buildings/{}/equipment", Segment(building_id)))
            .await
    }

    /// `GET /buildings/{id}/alerts`
    pub async fn get_alerts(&self, building_id: &str) -> Result<AlertList, Error> {
        self.get(&format!("/buildings/{}/alerts", Segment(building_id))).await
    }

    /// `GET /buildings/{id}/hvac`
    pub async fn get_hvac(&self, building_id: &str) -> Result<HvacStatus, Error> {
        self.get(&format!("/buildings/{}/hvac", Segment(building_id))).await
    }

    /// `GET /buildings/{id}/iaq`
    pub async fn get_iaq(&self, building_id: &str) -> Result<IaqStatus, Error> {
        self.get(&format!("/buildings/{}/iaq", Segment(building_id))).await
    }

    /// `GET /buildings/{id}/kpis?period`
    pub async fn get_kpis(
        &self,
        building_id: &str,
        period: Option<KpiPeriod>,
    ) -> Result<Kpis, Error> {
        let params = QueryParams::new().push("period", period.map(|p| p.to_string()));
        self.get_with_query(&format!("/buildings/{}/kpis", Segment(building_id)), params)
            .await
    }

    /// `POST /buildings/{id}/setpoints`
    ///
    /// The response is authoritative for the zone it names; callers should
    /// apply `applied_settings` rather than their own request.
    pub async fn update_setpoint(
        &self,
        building_id: &str,
        update: &SetpointUpdate,
    ) -> Result<SetpointResponse, Error> {
        self.post(&format!("/buildings/{}/setpoints", Segment(building_id)), update)
            .await
    }
}
