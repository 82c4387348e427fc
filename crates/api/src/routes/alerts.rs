//! Alert Routes

use alerting::{Alert, Decision, ProcessReport, SuppressedCount};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

/// Request body: a single alert or a batch
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AlertBatch {
    One(Alert),
    Many(Vec<Alert>),
}

impl AlertBatch {
    fn into_vec(self) -> Vec<Alert> {
        match self {
            AlertBatch::One(alert) => vec![alert],
            AlertBatch::Many(alerts) => alerts,
        }
    }
}

/// Result of one channel delivery
#[derive(Debug, Serialize)]
pub struct DeliveryRecord {
    pub channel: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What happened to one alert
#[derive(Debug, Serialize)]
pub struct AlertOutcome {
    pub key: String,
    pub decision: &'static str,
    /// Present only when notified; -1 means no suppression context
    pub suppressed_count: Option<SuppressedCount>,
    pub deliveries: Vec<DeliveryRecord>,
}

impl AlertOutcome {
    fn new(alert: &Alert, report: ProcessReport) -> Self {
        let (decision, suppressed_count) = match report.decision {
            Decision::Ignored => ("ignored", None),
            Decision::Suppressed => ("suppressed", None),
            Decision::Notify(count) => ("notified", Some(count)),
        };
        Self {
            key: alert.dedup_key(),
            decision,
            suppressed_count,
            deliveries: report
                .deliveries
                .into_iter()
                .map(|d| DeliveryRecord {
                    channel: d.channel,
                    delivered: d.result.is_ok(),
                    error: d.result.err().map(|e| e.to_string()),
                })
                .collect(),
        }
    }
}

/// Response for the alerts endpoint
#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub data: Vec<AlertOutcome>,
    pub count: usize,
    pub notified: usize,
}

/// One rejected alert
#[derive(Debug, Serialize)]
pub struct RejectedAlert {
    pub position: usize,
    pub message: String,
}

/// Response when a request is rejected
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Problem with the request as a whole
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Problems with individual alerts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RejectedAlert>,
}

impl ErrorResponse {
    fn request(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            errors: Vec::new(),
        }
    }
}

/// Collect alerts. The whole batch is rejected if any alert is invalid.
pub async fn post_alerts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AlertBatch>, JsonRejection>,
) -> Response {
    let alerts = match payload {
        Ok(Json(batch)) => batch.into_vec(),
        Err(rejection) => {
            warn!("Rejected alert request: {}", rejection.body_text());
            let body = ErrorResponse::request(rejection.body_text());
            return (rejection.status(), Json(body)).into_response();
        }
    };

    let validation = state.validator.validate_batch(&alerts);
    if let Some(error) = validation.batch_error {
        warn!("Rejected alert batch: {}", error);
        let body = ErrorResponse::request(error.to_string());
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    if !validation.valid {
        warn!("Rejected alert batch: {} invalid", validation.errors.len());
        let errors = validation
            .errors
            .into_iter()
            .map(|(position, e)| RejectedAlert {
                position,
                message: e.to_string(),
            })
            .collect();
        let body = ErrorResponse {
            error: None,
            errors,
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    let mut data = Vec::with_capacity(alerts.len());
    for alert in &alerts {
        let report = state.manager.process(alert, chrono::Utc::now()).await;
        data.push(AlertOutcome::new(alert, report));
    }

    let notified = data.iter().filter(|o| o.suppressed_count.is_some()).count();
    Json(CollectResponse {
        count: data.len(),
        notified,
        data,
    })
    .into_response()
}
