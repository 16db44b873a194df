//! Calculator API routes
//!
//! Every request is evaluated from scratch; the router holds only the
//! evaluation switches read at startup.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use fiber_calc::{
    evaluate_with, CalcError, Calculator, EvalConfig, FieldSpec, Fields, Mode, Readout,
};

#[derive(Clone, Copy, Default)]
pub struct CalcState {
    pub eval: EvalConfig,
}

/// Build calculator routes with state
pub fn calculator_router(state: CalcState) -> Router {
    Router::new()
        .route("/calculators", get(list_calculators))
        .route("/calculate/:mode", post(calculate))
        .with_state(state)
}

#[derive(Serialize)]
pub struct ModeInfo {
    pub mode: Mode,
    pub fields: &'static [FieldSpec],
}

#[derive(Serialize)]
pub struct CalculatorInfo {
    pub page_id: &'static str,
    pub title: &'static str,
    pub modes: Vec<ModeInfo>,
}

/// A form field as sent by clients: text as typed, a bare JSON number, or
/// `null` for a field left blank
#[derive(Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Blank(()),
}

impl FieldValue {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
            Self::Blank(()) => String::new(),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct CalculateRequest {
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

#[derive(Serialize)]
pub struct CalculateResponse {
    pub request_id: Uuid,
    pub computed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub readout: Readout,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl CalculateRequest {
    /// An empty body is an empty form; anything else must be a JSON request.
    fn from_body(headers: &HeaderMap, body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let is_json = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|mime| {
                let mime = mime.trim();
                mime == "application/json" || mime.ends_with("+json")
            })
            .unwrap_or(false);
        if !is_json {
            return Err(ApiError::UnsupportedMediaType);
        }

        serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
    }
}

/// Failures a calculate request can end in
#[derive(Debug)]
pub enum ApiError {
    UnknownMode(String),
    UnsupportedMediaType,
    InvalidBody(String),
    Validation(CalcError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::UnknownMode(mode) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "unknown_mode".to_string(),
                    message: format!("Unknown calculator mode: {}", mode),
                },
            ),
            ApiError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorBody {
                    error: "unsupported_media_type".to_string(),
                    message: "Expected request with `Content-Type: application/json`".to_string(),
                },
            ),
            ApiError::InvalidBody(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "invalid_body".to_string(),
                    message: format!("Failed to parse the request body as JSON: {}", reason),
                },
            ),
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: err.kind().to_string(),
                    message: err.to_string(),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn list_calculators() -> Json<Vec<CalculatorInfo>> {
    let calculators = Calculator::ALL
        .iter()
        .map(|calc| CalculatorInfo {
            page_id: calc.page_id(),
            title: calc.title(),
            modes: calc
                .modes()
                .iter()
                .map(|mode| ModeInfo {
                    mode: *mode,
                    fields: mode.fields(),
                })
                .collect(),
        })
        .collect();

    Json(calculators)
}

pub async fn calculate(
    State(state): State<CalcState>,
    Path(mode): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CalculateResponse>, ApiError> {
    let mode: Mode = mode.parse().map_err(|_| ApiError::UnknownMode(mode.clone()))?;
    let request = CalculateRequest::from_body(&headers, &body)?;

    let fields: Fields = request
        .fields
        .into_iter()
        .map(|(k, v)| (k, v.into_text()))
        .collect();

    let readout = evaluate_with(mode, &fields, &state.eval).map_err(|err| {
        tracing::debug!("{} rejected: {}", mode, err);
        ApiError::Validation(err)
    })?;

    Ok(Json(CalculateResponse {
        request_id: Uuid::new_v4(),
        computed_at: Utc::now(),
        readout,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn post_json(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn entry<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
        body["entries"]
            .as_array()?
            .iter()
            .find(|e| e["key"] == key)?["value"]
            .as_str()
    }

    #[tokio::test]
    async fn test_calculate_refractive() {
        let router = calculator_router(CalcState::default());
        let (status, body) = post_json(
            router,
            "/calculate/na-refractive",
            r#"{"fields": {"n1": "1.50", "n2": "1.48"}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "na-refractive");
        assert_eq!(entry(&body, "numerical_aperture"), Some("0.2441"));
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_numeric_fields_accepted() {
        let router = calculator_router(CalcState::default());
        let (status, body) =
            post_json(router, "/calculate/dbm-to-mw", r#"{"fields": {"dbm": 10}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry(&body, "power_mw"), Some("10 mW"));
    }

    #[tokio::test]
    async fn test_validation_error_is_422() {
        let router = calculator_router(CalcState::default());
        let (status, body) = post_json(
            router,
            "/calculate/na-refractive",
            r#"{"fields": {"n1": "1.48", "n2": "1.50"}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "invalid_index_ordering");
        assert_eq!(
            body["message"],
            "n2 must be smaller than n1 for total internal reflection"
        );
    }

    #[tokio::test]
    async fn test_unknown_mode_is_404() {
        let router = calculator_router(CalcState::default());
        let (status, body) = post_json(router, "/calculate/snell", "{}").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown_mode");
    }

    #[tokio::test]
    async fn test_link_budget_lenient_and_strict() {
        let lenient = calculator_router(CalcState::default());
        let (status, body) = post_json(lenient, "/calculate/link-budget", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry(&body, "power_budget"), Some("0 dB"));

        let strict = calculator_router(CalcState {
            eval: EvalConfig {
                strict_link_budget: true,
            },
        });
        let (status, body) = post_json(strict, "/calculate/link-budget", "{}").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "not_a_number");
    }

    async fn post_raw(uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let response = calculator_router(CalcState::default())
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_json_body_without_content_type_is_415() {
        let (status, body) = post_raw(
            "/calculate/link-budget",
            None,
            r#"{"fields": {"tx_power_dbm": "3", "rx_sensitivity_dbm": "-28"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"], "unsupported_media_type");

        let (status, _) = post_raw("/calculate/link-budget", Some("text/plain"), "{}").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_form() {
        let (status, body) = post_raw("/calculate/link-budget", None, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry(&body, "total_loss"), Some("0 dB"));

        let (status, body) = post_raw("/calculate/dbm-to-mw", None, "").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "not_a_number");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (status, body) = post_raw(
            "/calculate/link-budget",
            Some("application/json"),
            r#"{"fields": {"tx_power_dbm": "3""#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_body");

        let (status, _) = post_raw(
            "/calculate/na-refractive",
            Some("application/json; charset=utf-8"),
            r#"{"fields": {"n1": "1.50", "n2": true}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_null_field_reads_as_blank() {
        let router = calculator_router(CalcState::default());
        let (status, body) = post_json(
            router,
            "/calculate/na-refractive",
            r#"{"fields": {"n1": "1.50", "n2": "1.48", "note": null}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry(&body, "numerical_aperture"), Some("0.2441"));

        let router = calculator_router(CalcState::default());
        let (status, body) = post_json(
            router,
            "/calculate/na-refractive",
            r#"{"fields": {"n1": "1.50", "n2": null}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "not_a_number");
    }

    #[tokio::test]
    async fn test_list_calculators() {
        let router = calculator_router(CalcState::default());
        let response = router
            .oneshot(Request::builder().uri("/calculators").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let calculators = body.as_array().unwrap();
        assert_eq!(calculators.len(), 4);
        assert_eq!(calculators[0]["page_id"], "NACalculator");
        assert_eq!(calculators[0]["modes"][0]["fields"][0]["default"], "1.50");
    }
}
