#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use chrono::{TimeZone, Utc};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use twinboard_api::types::{
    CustomScenarioRequest, EnergyQuery, EquipmentStatus, HvacMode, KpiPeriod, QuickMpcRequest,
    ReportPeriod, Resolution, RoiRequest, ScenarioRequest, ScenarioType, SetpointUpdate,
    SimulationMode, SimulationRequest,
};
use twinboard_api::{ApiClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api/v1", server.uri())).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), &base_url);
    (server, client)
}

fn building_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "area_sqm": 12500.0,
        "floors": 4,
        "location": {
            "address": "Campus de Espinardo",
            "city": "Murcia",
            "country": "Spain",
            "latitude": 38.02,
            "longitude": -1.17
        },
        "year_built": 2008,
        "building_type": "University",
        "occupancy_rate": 72.5,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-06-15T10:30:00Z"
    })
}

// ── Buildings ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_buildings() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buildings": [building_json("pleiades-a", "Pleiades A"), building_json("pleiades-b", "Pleiades B")],
            "total": 2
        })))
        .mount(&server)
        .await;

    let list = tokio_test::assert_ok!(client.list_buildings().await);
    assert_eq!(list.total, 2);
    assert_eq!(list.buildings[0].id, "pleiades-a");
    assert_eq!(list.buildings[1].location.city, "Murcia");
}

#[tokio::test]
async fn test_not_found_carries_status_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Building not found"))
        .mount(&server)
        .await;

    let err = client.get_building("nope").await.unwrap_err();
    match err {
        Error::Api { status, ref message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Building not found");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_building_id_is_one_path_segment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/wing%2F3%3Fx/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [],
            "total": 0,
            "by_severity": { "critical": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let alerts = client.get_alerts("wing/3?x").await.unwrap();
    assert_eq!(alerts.total, 0);
    assert_eq!(alerts.by_severity["critical"], 0);
}

#[tokio::test]
async fn test_empty_error_body_uses_generic_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/b1/hvac"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client.get_hvac("b1").await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "API Error: 502");
}

#[tokio::test]
async fn test_invalid_json_is_a_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/b1/equipment"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.get_equipment("b1").await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Energy ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_energy_query_parameters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/b1/energy"))
        .and(query_param("from", "2024-06-14T00:00:00.000Z"))
        .and(query_param("resolution", "hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "building_id": "b1",
            "period_start": "2024-06-14T00:00:00",
            "period_end": "2024-06-15T00:00:00",
            "resolution": "hourly",
            "data_points": [
                { "timestamp": "2024-06-14T00:00:00", "value": 41.2 },
                { "timestamp": "2024-06-14T01:00:00", "value": 39.8 }
            ],
            "breakdown": { "hvac": 40.0, "lighting": 20.0, "it_equipment": 15.0, "other": 6.0, "total": 81.0 },
            "cost_usd": 12.15,
            "carbon_kg": 20.25
        })))
        .mount(&server)
        .await;

    let query = EnergyQuery {
        from: Some(Utc.with_ymd_and_hms(2024, 6, 14, 0, 0, 0).unwrap()),
        to: None,
        resolution: Some(Resolution::Hourly),
    };
    let energy = client.get_energy("b1", &query).await.unwrap();
    assert_eq!(energy.data_points.len(), 2);
    assert!((energy.breakdown.total - 81.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_kpis_period_is_optional() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/b1/kpis"))
        .respond_with(ResponseTemplate::new(400).set_body_string("stop here"))
        .mount(&server)
        .await;

    let _ = client.get_kpis("b1", Some(KpiPeriod::Week)).await;
    let _ = client.get_kpis("b1", None).await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].url.query(), Some("period=week"));
    assert_eq!(received[1].url.query(), None);
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_setpoint_posts_json() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/buildings/b1/setpoints"))
        .and(body_json(json!({ "zone_id": "z1", "temperature": 21.0, "mode": "cooling" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "zone_id": "z1",
            "applied_settings": { "temperature": 21.0, "mode": "cooling" },
            "message": "Setpoints updated for zone z1"
        })))
        .mount(&server)
        .await;

    let update = SetpointUpdate {
        zone_id: "z1".into(),
        temperature: Some(21.0),
        humidity: None,
        mode: Some(HvacMode::Cooling),
    };
    let resp = client.update_setpoint("b1", &update).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.applied_settings.mode, Some(HvacMode::Cooling));
    assert_eq!(resp.applied_settings.humidity, None);
}

// ── Simulation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_scenario_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/simulation/scenarios/run"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"detail":"Scenario 'bogus' not found"}"#),
        )
        .mount(&server)
        .await;

    let request = ScenarioRequest {
        building_id: "b1".into(),
        scenario_id: "bogus".into(),
        duration_hours: 24,
        custom_parameters: None,
    };
    let err = client.run_scenario(&request).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.detail(), "Scenario 'bogus' not found");
}

fn scenario_response_json(id: &str) -> serde_json::Value {
    json!({
        "scenario_id": id,
        "scenario_name": "Custom: setpoint_change",
        "baseline_energy_kwh": 1200.0,
        "scenario_energy_kwh": 1080.0,
        "energy_savings_kwh": 120.0,
        "energy_savings_percent": 10.0,
        "cost_savings_eur": 18.0,
        "carbon_savings_kg": 48.0,
        "comfort_impact": -0.2,
        "baseline_timeline": [],
        "scenario_timeline": [],
        "recommendations": ["Raise cooling setpoint by 1 °C"]
    })
}

#[tokio::test]
async fn test_run_simulation_posts_request() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/simulation/run"))
        .and(body_json(json!({
            "building_id": "b1",
            "duration_hours": 2,
            "setpoint": 21.5,
            "hvac_mode": "cool"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "building_id": "b1",
            "duration_hours": 2,
            "timestamps": ["2024-06-15T10:00:00", "2024-06-15T11:00:00"],
            "temperatures": [22.1, 21.7],
            "energy_kwh": [12.0, 11.4],
            "hvac_power": [-12.0, -11.4],
            "total_energy_kwh": 23.4,
            "total_cost_eur": 3.51,
            "comfort_score": 0.97,
            "peak_power_kw": 12.0
        })))
        .mount(&server)
        .await;

    let request = SimulationRequest {
        building_id: "b1".into(),
        duration_hours: 2,
        setpoint: 21.5,
        hvac_mode: SimulationMode::Cool,
    };
    let run = client.run_simulation(&request).await.unwrap();
    assert_eq!(run.temperatures.len(), 2);
    assert!((run.peak_power_kw - 12.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_custom_scenario_splits_query_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/simulation/scenarios/custom"))
        .and(query_param("building_id", "b1"))
        .and(query_param("scenario_type", "setpoint_change"))
        .and(query_param("duration_hours", "48"))
        .and(body_json(json!({ "delta_temp": 1.0, "hours": [9, 10, 11] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(scenario_response_json("custom_setpoint_change")))
        .mount(&server)
        .await;

    let mut parameters = serde_json::Map::new();
    parameters.insert("delta_temp".into(), json!(1.0));
    parameters.insert("hours".into(), json!([9, 10, 11]));
    let request = CustomScenarioRequest {
        building_id: "b1".into(),
        scenario_type: ScenarioType::SetpointChange,
        duration_hours: Some(48),
        parameters,
    };
    let outcome = client.run_custom_scenario(&request).await.unwrap();
    assert_eq!(outcome.scenario_id, "custom_setpoint_change");
    assert_eq!(outcome.recommendations.len(), 1);
}

#[tokio::test]
async fn test_quick_mpc_sends_only_given_values() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/simulation/mpc/quick"))
        .and(query_param("building_id", "b1"))
        .and(query_param("current_temp", "24.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "optimal_setpoints": [22.0, 22.5, 23.0],
            "cost_savings_percent": 12.4,
            "comfort_score": 0.93,
            "status": "optimal"
        })))
        .mount(&server)
        .await;

    let request = QuickMpcRequest {
        building_id: "b1".into(),
        current_temp: Some(24.5),
        setpoint: None,
    };
    let quick = client.quick_mpc(&request).await.unwrap();
    assert_eq!(quick.status, "optimal");
    assert_eq!(quick.optimal_setpoints.len(), 3);

    let received = server.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap_or_default().to_owned();
    assert!(!query.contains("setpoint="), "unexpected key in {query}");
}

#[tokio::test]
async fn test_calculate_roi_omits_unset_parameters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/simulation/roi/calculate"))
        .and(query_param("annual_energy_kwh", "1000000"))
        .and(query_param("savings_percent", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "annual_energy_cost_eur": 150000.0,
            "annual_savings_eur": 37500.0,
            "net_annual_savings_eur": 32500.0,
            "payback_months": 18.5,
            "payback_years": 1.54,
            "npv_5_years_eur": 90709.41,
            "irr_percent": 65.0,
            "5_year_total_savings_eur": 162500.0,
            "carbon_reduction_tons": 62.5
        })))
        .mount(&server)
        .await;

    let request = RoiRequest {
        annual_energy_kwh: 1_000_000.0,
        savings_percent: Some(25.0),
        ..RoiRequest::default()
    };
    let roi = client.calculate_roi(&request).await.unwrap();
    assert!((roi.payback_months - 18.5).abs() < f64::EPSILON);

    let received = server.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap_or_default().to_owned();
    assert!(!query.contains("energy_price_eur"), "unexpected key in {query}");
}

// ── Reports ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_report_returns_raw_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/reports/b1/pdf"))
        .and(query_param("period", "month"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.7 fake".to_vec()),
        )
        .mount(&server)
        .await;

    let doc = client.generate_report("b1", ReportPeriod::Month).await.unwrap();
    assert_eq!(doc.content_type.as_deref(), Some("application/pdf"));
    assert!(doc.body.starts_with(b"%PDF"));
    assert_eq!(doc.file_name(), "b1-month-report.pdf");
}

// ── Equipment enums ─────────────────────────────────────────────────

#[tokio::test]
async fn test_equipment_status_decoding() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/b1/equipment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "equipment": [{
                "id": "ahu-1",
                "building_id": "b1",
                "name": "AHU-1",
                "type": "AHU",
                "status": "alarm",
                "location": "Roof",
                "health_score": 41.0,
                "last_maintenance": "2024-03-01T08:00:00",
                "next_maintenance": null,
                "power_kw": 18.2,
                "runtime_hours": 10234.0
            }],
            "total": 1,
            "status_summary": { "running": 0, "warning": 0, "alarm": 1, "offline": 0 }
        })))
        .mount(&server)
        .await;

    let list = client.get_equipment("b1").await.unwrap();
    assert_eq!(list.equipment[0].status, EquipmentStatus::Alarm);
    assert_eq!(list.equipment[0].equipment_type, "AHU");
    assert!(list.equipment[0].next_maintenance.is_none());
    assert_eq!(list.status_summary.get("alarm"), Some(&1));
}
