//! Service-level introspection endpoints: status, version, metrics and
//! usage reports.
//!
//! The response shapes vary between deployments, so these return the raw
//! [`serde_json::Value`] rather than typed payloads.

use serde_json::Value;

use crate::client::dispatch::{append_query, PubSubClient};
use crate::client::retry::RetryPolicy;
use crate::error::Result;
use crate::protocol::Operation;

fn report_params(
    projects: &[String],
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(start_date) = start_date {
        pairs.push(("start_date", start_date.to_string()));
    }
    if let Some(end_date) = end_date {
        pairs.push(("end_date", end_date.to_string()));
    }
    if !projects.is_empty() {
        pairs.push(("projects", projects.join(",")));
    }
    pairs
}

impl PubSubClient {
    /// Health status of the service.
    pub async fn status(&self, policy: &RetryPolicy) -> Result<Value> {
        let url = self.origin_url(Operation::ApiStatus);
        self.call(Operation::ApiStatus, url, None, policy).await
    }

    /// Operational metrics of the service.
    pub async fn metrics(&self, policy: &RetryPolicy) -> Result<Value> {
        let url = self.origin_url(Operation::ApiMetrics);
        self.call(Operation::ApiMetrics, url, None, policy).await
    }

    /// Build and component versions of the service.
    pub async fn version(&self, policy: &RetryPolicy) -> Result<Value> {
        let url = self.origin_url(Operation::ApiVersion);
        self.call(Operation::ApiVersion, url, None, policy).await
    }

    /// Per-project virtual appliance metrics over a time period.
    ///
    /// Dates are `YYYY-MM-DD`; omitted bounds default to the service-side
    /// full range, and an empty `projects` slice means all projects.
    pub async fn va_metrics(
        &self,
        projects: &[String],
        start_date: Option<&str>,
        end_date: Option<&str>,
        policy: &RetryPolicy,
    ) -> Result<Value> {
        let url = append_query(
            &self.origin_url(Operation::ApiVaMetrics),
            &report_params(projects, start_date, end_date),
        );
        self.call(Operation::ApiVaMetrics, url, None, policy).await
    }

    /// Usage report combining the va metrics with operational metrics, for
    /// the projects the requesting user administers.
    pub async fn usage_report(
        &self,
        projects: &[String],
        start_date: Option<&str>,
        end_date: Option<&str>,
        policy: &RetryPolicy,
    ) -> Result<Value> {
        let url = append_query(
            &self.origin_url(Operation::ApiUsageReport),
            &report_params(projects, start_date, end_date),
        );
        self.call(Operation::ApiUsageReport, url, None, policy).await
    }
}
