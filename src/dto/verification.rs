use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct SendCodeRequest {
    #[schema(example = "someone@example.com")]
    pub email: String,
}

/// Result of requesting a code. `demo_code` is only present when the mail transport failed and
/// demo mode handed the code back directly.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct SendCodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "042917")]
    pub demo_code: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct VerifyCodeRequest {
    #[schema(example = "someone@example.com")]
    pub email: String,
    #[schema(example = "042917")]
    pub code: String,
}

#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct VerifyCodeResponse {
    pub success: bool,
}
