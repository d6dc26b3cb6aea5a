// Report download accessor.

use reqwest::header::{ACCEPT, HeaderValue};

use crate::client::{ApiClient, RequestOptions, Segment};
use crate::error::Error;
use crate::query::QueryParams;
use crate::types::{ReportDocument, ReportPeriod};

impl ApiClient {
    /// `GET /reports/{id}/pdf?period`
    pub async fn generate_report(
        &self,
        building_id: &str,
        period: ReportPeriod,
    ) -> Result<ReportDocument, Error> {
        let options = RequestOptions::get()
            .with_query(QueryParams::new().push("period", Some(period.to_string())))
            .with_header(ACCEPT, HeaderValue::from_static("application/pdf"));
        let (content_type, body) = self
            .request_bytes(&format!("/reports/{}/pdf", Segment(building_id)), options)
            .await?;
        Ok(ReportDocument {
            building_id: building_id.to_owned(),
            period,
            content_type,
            body,
        })
    }
}
