use crate::domain;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(test, derive(Deserialize))]
pub enum BackendState {
    Installed,
    NotInstalled,
}

/// Whether the extractor backend is installed, and which version
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct BackendStatus {
    pub status: BackendState,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2024.08.06")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<domain::media::BackendStatus> for BackendStatus {
    fn from(value: domain::media::BackendStatus) -> Self {
        match value {
            domain::media::BackendStatus::Installed { version } => BackendStatus {
                status: BackendState::Installed,
                version: Some(version),
                message: None,
            },
            domain::media::BackendStatus::NotInstalled => BackendStatus {
                status: BackendState::NotInstalled,
                version: None,
                message: Some("yt-dlp not available".to_owned()),
            },
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct DescribeRequest {
    #[schema(example = "https://youtu.be/dQw4w9WgXcQ")]
    pub url: String,
}

/// A rendition of the video that can be requested from the download endpoint via `format_id`
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct Rendition {
    #[schema(example = "720p")]
    pub quality: String,
    #[schema(example = "25.3 MB")]
    pub size: String,
    #[schema(example = "mp4")]
    pub format: String,
    #[schema(example = "22")]
    pub format_id: String,
}

impl From<domain::media::Rendition> for Rendition {
    fn from(value: domain::media::Rendition) -> Self {
        Rendition {
            quality: value.quality,
            size: value.size,
            format: value.format,
            format_id: value.format_id,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct MediaDescription {
    pub success: bool,
    pub title: String,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    pub formats: Vec<Rendition>,
    pub video_id: String,
}

impl From<domain::media::MediaDescription> for MediaDescription {
    fn from(value: domain::media::MediaDescription) -> Self {
        MediaDescription {
            success: true,
            title: value.title,
            thumbnail: value.thumbnail,
            duration: value.duration,
            view_count: value.view_count,
            formats: value.formats.into_iter().map(Rendition::from).collect(),
            video_id: value.video_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct FetchRequest {
    #[schema(example = "https://youtu.be/dQw4w9WgXcQ")]
    pub url: String,
    #[schema(example = "demo_720p")]
    pub format_id: String,
}

/// Sent instead of a file when the download can't happen because no extractor is installed
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct BackendMissing {
    pub success: bool,
    pub error: String,
    pub redirect_url: String,
    pub message: String,
}
