use tracing::error;

use crate::models::{AuditEvent, PerformanceMetric};

use super::Store;

impl Store {
    /// Best-effort application-level audit write (§7 recovery policy: "a
    /// failed audit write is logged and swallowed, never surfaced to the
    /// caller"). The trigger-backed events in [`super::schema`] cover the
    /// cases that must never be lost; this covers everything else (denied
    /// requests, rate-limit hits, reward selection).
    pub async fn append_audit(&self, event: &AuditEvent) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (event_type, participant_fk, endpoint, method, status_code, ip_hash, user_agent, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&event.event_type)
        .bind(event.participant_fk)
        .bind(&event.endpoint)
        .bind(&event.method)
        .bind(event.status_code as i32)
        .bind(&event.ip_hash)
        .bind(&event.user_agent)
        .bind(&event.details)
        .execute(self.pool())
        .await;

        if let Err(err) = result {
            error!(error = %err, event_type = %event.event_type, "audit write failed");
        }
    }

    pub async fn append_metric(&self, metric: &PerformanceMetric) {
        let result = sqlx::query(
            r#"
            INSERT INTO performance_metrics (endpoint, response_time_ms, status_code, request_size, response_size)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&metric.endpoint)
        .bind(metric.response_time_ms)
        .bind(metric.status_code as i32)
        .bind(metric.request_size)
        .bind(metric.response_size)
        .execute(self.pool())
        .await;

        if let Err(err) = result {
            error!(error = %err, endpoint = %metric.endpoint, "metric write failed");
        }
    }
}
