use crate::domain::media::DownloadedFile;
use crate::domain::media::driven_ports::MediaExtractor;
use crate::domain::media::driving_ports::{MediaError, MediaPort};
use crate::routing_utils::{FailureResponse, GenericErrorResponse, Json};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(check_backend, describe_media, fetch_media),
    components(schemas(
        dto::media::BackendState,
        dto::media::BackendStatus,
        dto::media::DescribeRequest,
        dto::media::MediaDescription,
        dto::media::Rendition,
        dto::media::FetchRequest,
        dto::media::BackendMissing,
    ))
)]
/// Defines the OpenAPI documentation for the media retrieval API
pub struct MediaApi;
/// Constant used to group media endpoints in OpenAPI documentation
pub const MEDIA_API_GROUP: &str = "Media";

pub fn media_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/check-ytdlp",
            get(|State(app_state): AppState| async move {
                let media_service = domain::media::MediaService {};
                check_backend(app_state.ext_cxn.extractor(), &media_service).await
            }),
        )
        .route(
            "/download-video",
            post(
                |State(app_state): AppState,
                 Json(request): Json<dto::media::DescribeRequest>| async move {
                    let media_service = domain::media::MediaService {};
                    describe_media(request, app_state.ext_cxn.extractor(), &media_service).await
                },
            ),
        )
        .route(
            "/download-file",
            post(
                |State(app_state): AppState, Json(request): Json<dto::media::FetchRequest>| async move {
                    let media_service = domain::media::MediaService {};
                    fetch_media(request, app_state.ext_cxn.extractor(), &media_service).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/check-ytdlp",
    tag = MEDIA_API_GROUP,
    responses(
        (status = 200, description = "Whether yt-dlp is installed", body = dto::media::BackendStatus),
    ),
)]
/// Reports whether the extractor backend is installed
async fn check_backend(
    extractor: &impl MediaExtractor,
    media_service: &impl MediaPort,
) -> Json<dto::media::BackendStatus> {
    Json(media_service.backend_status(extractor).await.into())
}

#[utoipa::path(
    post,
    path = "/download-video",
    tag = MEDIA_API_GROUP,
    request_body = dto::media::DescribeRequest,
    responses(
        (status = 200, description = "The renditions available for the video. Unsupported URLs and analysis failures come back as `{success: false, error}`.", body = dto::media::MediaDescription),
    ),
)]
/// Describes a video and the renditions that can be downloaded. Without yt-dlp this returns
/// fixed demo data.
async fn describe_media(
    request: dto::media::DescribeRequest,
    extractor: &impl MediaExtractor,
    media_service: &impl MediaPort,
) -> Result<Json<dto::media::MediaDescription>, FailureResponse> {
    info!("Describing {}", request.url);
    match media_service.describe(&request.url, extractor).await {
        Ok(description) => Ok(Json(description.into())),
        Err(err) => {
            error!("Could not describe {}: {err}", request.url);
            Err(FailureResponse::in_band(err.to_string()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/download-file",
    tag = MEDIA_API_GROUP,
    request_body = dto::media::FetchRequest,
    responses(
        (status = 200, description = "The downloaded file as an attachment. Failures come back as `{success: false, error}`."),
        (status = 400, description = "Malformed request body", body = crate::routing_utils::FailureBody),
    ),
)]
/// Downloads one rendition of a video and sends it back as an attachment. Failures come back
/// as `{success: false, error}` with a 200 status.
async fn fetch_media(
    request: dto::media::FetchRequest,
    extractor: &impl MediaExtractor,
    media_service: &impl MediaPort,
) -> Response {
    info!("Downloading {} as {}", request.url, request.format_id);
    match media_service
        .fetch(&request.url, &request.format_id, extractor)
        .await
    {
        Ok(file) => attachment(file),
        Err(MediaError::BackendMissing) => Json(dto::media::BackendMissing {
            success: false,
            error: MediaError::BackendMissing.to_string(),
            redirect_url: request.url,
            message: "Please install yt-dlp".to_owned(),
        })
        .into_response(),
        Err(err) => {
            error!("Could not download {}: {err}", request.url);
            FailureResponse::in_band(err.to_string()).into_response()
        }
    }
}

/// Turns a downloaded file into a response which browsers save instead of display
fn attachment(file: DownloadedFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    let disposition = match HeaderValue::from_bytes(disposition.as_bytes()) {
        Ok(value) => value,
        Err(header_err) => {
            return GenericErrorResponse(anyhow::anyhow!(
                "unusable file name {}: {header_err}",
                file.file_name
            ))
            .into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(file.bytes.len())),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
        ],
        file.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::{deserialize_body, read_body_bytes};
    use crate::domain::media::test_util::FakeMediaExtractor;
    use crate::domain::media::{MediaService, RawMediaInfo};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    fn header_of<'resp>(response: &'resp Response, name: header::HeaderName) -> &'resp str {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    mod check_backend {
        use super::*;

        #[tokio::test]
        async fn reports_missing_backend() {
            let Json(status) =
                check_backend(&FakeMediaExtractor::unavailable(), &MediaService {}).await;
            let body = serde_json::to_value(status).expect("status should serialize");

            assert_eq!(
                json!({"status": "not_installed", "message": "yt-dlp not available"}),
                body
            );
        }

        #[tokio::test]
        async fn reports_installed_version() {
            let Json(status) = check_backend(
                &FakeMediaExtractor::available().locked(),
                &MediaService {},
            )
            .await;
            let body = serde_json::to_value(status).expect("status should serialize");

            assert_eq!(json!({"status": "installed", "version": "2024.08.06"}), body);
        }
    }

    mod describe_media {
        use super::*;

        #[tokio::test]
        async fn demo_description_without_backend() {
            let response = describe_media(
                dto::media::DescribeRequest {
                    url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_owned(),
                },
                &FakeMediaExtractor::unavailable(),
                &MediaService {},
            )
            .await
            .into_response();
            let body: Value = deserialize_body(response.into_body()).await;

            assert_eq!(Value::Bool(true), body["success"]);
            assert_eq!("Demo Video - yt-dlp not installed", body["title"]);
            assert_eq!("demo", body["video_id"]);
            assert_eq!("demo_720p", body["formats"][0]["format_id"]);
            assert_eq!(3, body["formats"].as_array().map(Vec::len).unwrap_or_default());
        }

        #[tokio::test]
        async fn invalid_url_is_reported_in_band() {
            let response = describe_media(
                dto::media::DescribeRequest {
                    url: "https://vimeo.com/123".to_owned(),
                },
                &FakeMediaExtractor::unavailable(),
                &MediaService {},
            )
            .await
            .into_response();
            assert_eq!(StatusCode::OK, response.status());

            let body: Value = deserialize_body(response.into_body()).await;
            assert_eq!(json!({"success": false, "error": "Invalid YouTube URL"}), body);
        }

        #[tokio::test]
        async fn extractor_metadata_gets_defaults() {
            let mut extractor = FakeMediaExtractor::available();
            extractor
                .extract_info_result
                .set_returned_anyhow(Ok(RawMediaInfo::default()));

            let response = describe_media(
                dto::media::DescribeRequest {
                    url: "https://youtu.be/abc".to_owned(),
                },
                &extractor.locked(),
                &MediaService {},
            )
            .await
            .into_response();
            let body: Value = deserialize_body(response.into_body()).await;

            assert_eq!("Unknown Title", body["title"]);
            assert_eq!(json!(0.0), body["duration"]);
            assert_eq!(json!(0), body["view_count"]);
            assert_eq!("best[height<=720]", body["formats"][0]["format_id"]);
        }
    }

    mod fetch_media {
        use super::*;

        fn fetch_request(format_id: &str) -> dto::media::FetchRequest {
            dto::media::FetchRequest {
                url: "https://youtu.be/abc".to_owned(),
                format_id: format_id.to_owned(),
            }
        }

        #[tokio::test]
        async fn sends_file_as_attachment() {
            let mut extractor = FakeMediaExtractor::available();
            extractor.produced_file = Some(("download.mp4".to_owned(), vec![7u8; 32]));

            let response = fetch_media(
                fetch_request("demo_720p"),
                &extractor.locked(),
                &MediaService {},
            )
            .await;
            assert_eq!(StatusCode::OK, response.status());
            assert_eq!("video/mp4", header_of(&response, header::CONTENT_TYPE));
            assert_eq!(
                "attachment; filename=\"download.mp4\"",
                header_of(&response, header::CONTENT_DISPOSITION)
            );
            assert_eq!("32", header_of(&response, header::CONTENT_LENGTH));
            assert_eq!("bytes", header_of(&response, header::ACCEPT_RANGES));

            let bytes = read_body_bytes(response.into_body()).await;
            assert_eq!(vec![7u8; 32], bytes);
        }

        #[tokio::test]
        async fn missing_backend_redirects_back() {
            let response = fetch_media(
                fetch_request("demo_720p"),
                &FakeMediaExtractor::unavailable(),
                &MediaService {},
            )
            .await;
            let body: Value = deserialize_body(response.into_body()).await;

            assert_eq!(
                json!({
                    "success": false,
                    "error": "yt-dlp not installed",
                    "redirect_url": "https://youtu.be/abc",
                    "message": "Please install yt-dlp",
                }),
                body
            );
        }

        #[tokio::test]
        async fn nothing_downloaded_is_reported_in_band() {
            let response = fetch_media(
                fetch_request("137"),
                &FakeMediaExtractor::available().locked(),
                &MediaService {},
            )
            .await;
            assert_eq!(StatusCode::OK, response.status());

            let body: Value = deserialize_body(response.into_body()).await;
            assert_eq!(json!({"success": false, "error": "No file downloaded"}), body);
        }
    }
}
