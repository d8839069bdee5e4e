use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::{FromRequest, FromRequestParts};

use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToSchema, openapi};

use validator::ValidationErrors;

/// The body of every failed request: `{"success": false, "error": "..."}`, optionally with
/// diagnostic details in `extra_info`
#[derive(Serialize, Debug, ToSchema)]
pub struct FailureBody {
    #[schema(example = false)]
    success: bool,
    #[schema(example = "Invalid verification code")]
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra_info: Option<ExtraInfo>,
}

impl FailureBody {
    pub fn new(error: impl Into<String>) -> FailureBody {
        FailureBody {
            success: false,
            error: error.into(),
            extra_info: None,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response type carrying a [FailureBody] along with the HTTP status to send it with
#[derive(Debug)]
pub struct FailureResponse {
    status: StatusCode,
    body: FailureBody,
}

impl FailureResponse {
    pub fn new(status: StatusCode, error: impl Into<String>) -> FailureResponse {
        FailureResponse {
            status,
            body: FailureBody::new(error),
        }
    }

    /// A failure reported in the response body of an otherwise successful (200) exchange
    pub fn in_band(error: impl Into<String>) -> FailureResponse {
        Self::new(StatusCode::OK, error)
    }

    pub fn not_found(error: impl Into<String>) -> FailureResponse {
        Self::new(StatusCode::NOT_FOUND, error)
    }
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}

/// Response type for unexpected failures, which get logged but never leak their cause to clients
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        tracing::error!("Request failed unexpectedly: {:#}", self.0);
        FailureResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not access data to complete your request",
        )
        .into_response()
    }
}

/// Response type that wraps validation errors and turns them into [FailureBody]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(FailureBody {
                success: false,
                error: "Submitted data was invalid.".to_owned(),
                extra_info: Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(FailureBody {
                success: false,
                error: "The passed request body contained malformed or unreadable JSON.".to_owned(),
                extra_info: Some(ExtraInfo::Message(self.parse_problem)),
            }),
        )
            .into_response()
    }
}

/// Wrapper for [axum::extract::Path] which reports unparseable path parameters with our
/// data structure for API errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(PathErrorResponse))]
pub struct Path<T>(pub T);

/// Response type representing path parameters that could not be parsed
pub struct PathErrorResponse {
    parse_problem: String,
}

impl From<PathRejection> for PathErrorResponse {
    fn from(value: PathRejection) -> Self {
        PathErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for PathErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(FailureBody {
                success: false,
                error: "The request path contained an invalid parameter.".to_owned(),
                extra_info: Some(ExtraInfo::Message(self.parse_problem)),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::deserialize_body;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn failure_body_omits_missing_extra_info() {
        let response = FailureResponse::not_found("Todo not found").into_response();
        assert_eq!(StatusCode::NOT_FOUND, response.status());

        let body: Value = deserialize_body(response.into_body()).await;
        assert_eq!(json!({"success": false, "error": "Todo not found"}), body);
    }

    #[tokio::test]
    async fn generic_errors_hide_their_cause() {
        let response =
            GenericErrorResponse(anyhow::anyhow!("secret database details")).into_response();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());

        let body: Value = deserialize_body(response.into_body()).await;
        assert!(!body.to_string().contains("secret"));
        assert_eq!(Value::Bool(false), body["success"]);
    }
}
