use crate::dto;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(info(
    title = "TaskFlow API",
    description = "To-do list, email verification and video download endpoints"
))]
struct TaskFlowApi;

/// Constructs the route on the API that renders the swagger UI and returns the OpenAPI schema.
/// Merges in OpenAPI definitions from other locations in the app, such as the [dto] package
/// and submodules of [api][crate::api]
pub fn build_documentation() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_docs())
}

fn api_docs() -> utoipa::openapi::OpenApi {
    let mut api_docs = TaskFlowApi::openapi();
    api_docs.merge(dto::OpenApiSchemas::openapi());
    api_docs.merge(super::todo::TodoApi::openapi());
    api_docs.merge(super::verification::VerificationApi::openapi());
    api_docs.merge(super::media::MediaApi::openapi());

    api_docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let docs = api_docs();
        let paths: Vec<&str> = docs.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/todos",
            "/api/todos/{todo_id}",
            "/send-code",
            "/verify-code",
            "/check-ytdlp",
            "/download-video",
            "/download-file",
        ] {
            assert!(paths.contains(&expected), "{expected} missing from {paths:?}");
        }
    }
}
