use utoipa::OpenApi;

pub mod media;
pub mod todo;
pub mod verification;

/// Schemas shared across the API that aren't attached to a single endpoint group
#[derive(OpenApi)]
#[openapi(components(schemas(
    crate::routing_utils::FailureBody,
    crate::routing_utils::ExtraInfo,
    crate::routing_utils::ValidationErrorSchema,
)))]
pub struct OpenApiSchemas;
