use crate::domain::verification::CodeDelivery;
use crate::domain::verification::driven_ports::{CodeMailer, CodeStore};
use crate::domain::verification::driving_ports::{VerificationError, VerificationPort};
use crate::routing_utils::{FailureResponse, GenericErrorResponse, Json};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::response::ErrorResponse;
use axum::routing::post;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;

const CODE_SENT: &str = "Verification code sent to your email";
const DEMO_MODE: &str = "Demo mode: Email service unavailable";
const SEND_FAILED: &str = "Failed to send verification code";

#[derive(OpenApi)]
#[openapi(
    paths(send_code, verify_code),
    components(schemas(
        dto::verification::SendCodeRequest,
        dto::verification::SendCodeResponse,
        dto::verification::VerifyCodeRequest,
        dto::verification::VerifyCodeResponse,
    ))
)]
/// Defines the OpenAPI documentation for the email verification API
pub struct VerificationApi;
/// Constant used to group verification endpoints in OpenAPI documentation
pub const VERIFICATION_API_GROUP: &str = "Verification";

pub fn verification_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/send-code",
            post(
                |State(app_state): AppState,
                 Json(request): Json<dto::verification::SendCodeRequest>| async move {
                    let verification_service = domain::verification::VerificationService {};
                    send_code(
                        request,
                        app_state.demo_code_fallback,
                        &app_state.code_store,
                        app_state.ext_cxn.mailer(),
                        &verification_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/verify-code",
            post(
                |State(app_state): AppState,
                 Json(request): Json<dto::verification::VerifyCodeRequest>| async move {
                    let verification_service = domain::verification::VerificationService {};
                    verify_code(request, &app_state.code_store, &verification_service).await
                },
            ),
        )
}

#[utoipa::path(
    post,
    path = "/send-code",
    tag = VERIFICATION_API_GROUP,
    request_body = dto::verification::SendCodeRequest,
    responses(
        (status = 200, description = "The code was mailed or handed back in demo mode. Delivery failures come back as `{success: false, error}`.", body = dto::verification::SendCodeResponse),
    ),
)]
/// Issues a new verification code for an email address, replacing any earlier one
async fn send_code(
    request: dto::verification::SendCodeRequest,
    demo_fallback: bool,
    code_store: &impl CodeStore,
    mailer: &impl CodeMailer,
    verification_service: &impl VerificationPort,
) -> Result<Json<dto::verification::SendCodeResponse>, ErrorResponse> {
    info!("Verification code requested for {}", request.email);
    let delivery = verification_service
        .request_code(&request.email, demo_fallback, code_store, mailer)
        .await;

    match delivery {
        Ok(CodeDelivery::Sent) => Ok(Json(dto::verification::SendCodeResponse {
            success: true,
            message: Some(CODE_SENT.to_owned()),
            demo_code: None,
        })),
        Ok(CodeDelivery::Undelivered { code }) => Ok(Json(dto::verification::SendCodeResponse {
            success: true,
            message: Some(DEMO_MODE.to_owned()),
            demo_code: Some(code),
        })),
        Err(VerificationError::DeliveryFailed(cause)) => {
            error!("Could not mail verification code: {cause:#}");
            Err(FailureResponse::in_band(SEND_FAILED).into())
        }
        Err(VerificationError::PortError(cause)) => Err(GenericErrorResponse(cause).into()),
        Err(other) => Err(FailureResponse::in_band(other.to_string()).into()),
    }
}

#[utoipa::path(
    post,
    path = "/verify-code",
    tag = VERIFICATION_API_GROUP,
    request_body = dto::verification::VerifyCodeRequest,
    responses(
        (status = 200, description = "The code matched and has been used up. Wrong codes come back as `{success: false, error}`.", body = dto::verification::VerifyCodeResponse),
    ),
)]
/// Checks a verification code. A matching code can only be used once.
async fn verify_code(
    request: dto::verification::VerifyCodeRequest,
    code_store: &impl CodeStore,
    verification_service: &impl VerificationPort,
) -> Result<Json<dto::verification::VerifyCodeResponse>, ErrorResponse> {
    match verification_service
        .verify_code(&request.email, &request.code, code_store)
        .await
    {
        Ok(()) => Ok(Json(dto::verification::VerifyCodeResponse { success: true })),
        Err(VerificationError::PortError(cause)) => Err(GenericErrorResponse(cause).into()),
        Err(rejected) => {
            info!("Rejected verification code for {}", request.email);
            Err(FailureResponse::in_band(rejected.to_string()).into())
        }
    }
}
