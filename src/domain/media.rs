//! Media retrieval facade. Everything that actually talks to video sites lives behind the
//! [driven_ports::MediaExtractor] port; this module only picks renditions, builds format
//! selection expressions and shapes the downloaded file for an HTTP response.

use crate::domain::media::driven_ports::MediaExtractor;
use crate::domain::media::driving_ports::MediaError;
use anyhow::Context;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

const MIB: f64 = 1024.0 * 1024.0;

/// Maximum number of renditions offered for a single video
pub const MAX_RENDITIONS: usize = 4;
/// Container every merged audio/video download is remuxed into
pub const MERGE_CONTAINER: &str = "mp4";
/// File stem the extractor writes downloads as, before the extension
pub const OUTPUT_STEM: &str = "download";
/// Longest sanitized base filename sent back in `Content-Disposition`
pub const MAX_FILENAME_BASE: usize = 50;

const VIDEO_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

static NON_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("filename character pattern is valid"));
static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("separator pattern is valid"));

/// One selectable quality/format variant of a remote video
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Rendition {
    pub quality: String,
    pub size: String,
    pub format: String,
    pub format_id: String,
}

impl Rendition {
    fn new(quality: &str, size: &str, format: &str, format_id: &str) -> Rendition {
        Rendition {
            quality: quality.to_owned(),
            size: size.to_owned(),
            format: format.to_owned(),
            format_id: format_id.to_owned(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct MediaDescription {
    pub title: String,
    pub thumbnail: String,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub formats: Vec<Rendition>,
    pub video_id: String,
}

/// A single stream as reported by the extractor
#[derive(Debug, Clone, Default)]
pub struct RawFormat {
    pub format_id: String,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
    pub abr: Option<f64>,
}

impl RawFormat {
    fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }
}

/// Metadata the extractor returns for a URL without downloading anything
#[derive(Debug, Clone, Default)]
pub struct RawMediaInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub formats: Vec<RawFormat>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct AudioExtraction {
    pub codec: &'static str,
    pub quality: &'static str,
}

/// Everything the extractor needs to know to produce a file for one download
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct DownloadRequest {
    pub format_selector: String,
    pub merge_container: &'static str,
    pub output_stem: &'static str,
    pub audio_extraction: Option<AudioExtraction>,
}

impl DownloadRequest {
    /// Builds the download settings for a selector token handed out by [describe][driving_ports::MediaPort::describe]
    pub fn for_token(selector_token: &str) -> DownloadRequest {
        let audio_extraction = is_audio_token(selector_token).then_some(AudioExtraction {
            codec: "mp3",
            quality: "128",
        });

        DownloadRequest {
            format_selector: format_selector(selector_token),
            merge_container: MERGE_CONTAINER,
            output_stem: OUTPUT_STEM,
            audio_extraction,
        }
    }
}

/// A downloaded file, fully read into memory and ready to be sent back
#[derive(PartialEq, Eq, Debug)]
pub struct DownloadedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum BackendStatus {
    Installed { version: String },
    NotInstalled,
}

pub mod driven_ports {
    use super::*;

    pub trait MediaExtractor {
        /// Whether the extractor backend can be used at all
        fn is_available(&self) -> bool;

        async fn version(&self) -> Result<String, anyhow::Error>;

        async fn extract_info(&self, url: &str) -> Result<RawMediaInfo, anyhow::Error>;

        /// Downloads [url] into [target_dir] as described by [request]
        async fn download(
            &self,
            url: &str,
            request: &DownloadRequest,
            target_dir: &Path,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum MediaError {
        #[error("Invalid YouTube URL")]
        InvalidUrl,
        #[error("yt-dlp not installed")]
        BackendMissing,
        #[error("Failed to analyze video: {0:#}")]
        AnalysisFailed(anyhow::Error),
        #[error("No file downloaded")]
        NoFileProduced,
        #[error("Download failed: {0:#}")]
        DownloadFailed(anyhow::Error),
    }

    pub trait MediaPort {
        async fn backend_status(&self, extractor: &impl driven_ports::MediaExtractor) -> BackendStatus;

        /// Lists the renditions a user can pick from for [url]
        async fn describe(
            &self,
            url: &str,
            extractor: &impl driven_ports::MediaExtractor,
        ) -> Result<MediaDescription, MediaError>;

        /// Downloads the rendition identified by [selector_token] and reads it into memory
        async fn fetch(
            &self,
            url: &str,
            selector_token: &str,
            extractor: &impl driven_ports::MediaExtractor,
        ) -> Result<DownloadedFile, MediaError>;
    }
}

pub struct MediaService {}

impl driving_ports::MediaPort for MediaService {
    async fn backend_status(&self, extractor: &impl MediaExtractor) -> BackendStatus {
        if !extractor.is_available() {
            return BackendStatus::NotInstalled;
        }

        let version = match extractor.version().await {
            Ok(version) => version,
            Err(version_err) => {
                warn!("Could not determine the extractor version: {version_err:#}");
                "unknown".to_owned()
            }
        };
        BackendStatus::Installed { version }
    }

    async fn describe(
        &self,
        url: &str,
        extractor: &impl MediaExtractor,
    ) -> Result<MediaDescription, MediaError> {
        if !is_supported_url(url) {
            return Err(MediaError::InvalidUrl);
        }
        if !extractor.is_available() {
            debug!("No extractor available, describing {url} with demo renditions");
            return Ok(demo_description());
        }

        let info = extractor
            .extract_info(url)
            .await
            .map_err(MediaError::AnalysisFailed)?;
        let formats = select_renditions(&info.formats);
        info!(url, rendition_count = formats.len(), "Described media");

        Ok(MediaDescription {
            title: info.title.unwrap_or_else(|| "Unknown Title".to_owned()),
            thumbnail: info.thumbnail.unwrap_or_default(),
            duration: Some(info.duration.unwrap_or_default()),
            view_count: Some(info.view_count.unwrap_or_default()),
            formats,
            video_id: info.id.unwrap_or_default(),
        })
    }

    async fn fetch(
        &self,
        url: &str,
        selector_token: &str,
        extractor: &impl MediaExtractor,
    ) -> Result<DownloadedFile, MediaError> {
        if !extractor.is_available() {
            return Err(MediaError::BackendMissing);
        }

        let request = DownloadRequest::for_token(selector_token);
        debug!(url, selector = %request.format_selector, "Starting download");

        let scratch_dir = tempfile::Builder::new()
            .prefix("taskflow-download-")
            .tempdir()
            .context("creating a scratch directory for the download")
            .map_err(MediaError::DownloadFailed)?;

        extractor
            .download(url, &request, scratch_dir.path())
            .await
            .map_err(MediaError::DownloadFailed)?;

        let produced = first_file_in(scratch_dir.path())
            .await
            .map_err(MediaError::DownloadFailed)?
            .ok_or(MediaError::NoFileProduced)?;
        let bytes = tokio::fs::read(&produced)
            .await
            .with_context(|| format!("reading downloaded file {}", produced.display()))
            .map_err(MediaError::DownloadFailed)?;

        let produced_name = produced
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Err(cleanup_err) = scratch_dir.close() {
            warn!("Failed to remove download scratch directory: {cleanup_err}");
        }

        info!(url, size = bytes.len(), "Downloaded {produced_name}");
        Ok(DownloadedFile {
            file_name: sanitize_filename(&produced_name),
            content_type: content_type_for(&produced_name),
            bytes,
        })
    }
}

/// Only links to the video sharing sites the extractor is used for are accepted
pub fn is_supported_url(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    VIDEO_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{known}")))
}

/// Fixed description handed out when no extractor backend is installed
pub fn demo_description() -> MediaDescription {
    MediaDescription {
        title: "Demo Video - yt-dlp not installed".to_owned(),
        thumbnail: "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_owned(),
        duration: None,
        view_count: None,
        formats: vec![
            Rendition::new("720p", "~25 MB", "mp4", "demo_720p"),
            Rendition::new("480p", "~15 MB", "mp4", "demo_480p"),
            Rendition::new("Audio Only", "~3 MB", "mp3", "demo_audio"),
        ],
        video_id: "demo".to_owned(),
    }
}

fn fallback_renditions() -> Vec<Rendition> {
    vec![
        Rendition::new("720p", "~25 MB", "mp4", "best[height<=720]"),
        Rendition::new("480p", "~15 MB", "mp4", "best[height<=480]"),
        Rendition::new("Audio Only", "~3 MB", "mp3", "bestaudio"),
    ]
}

fn megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / MIB)
}

/// Picks at most [MAX_RENDITIONS] renditions out of the raw stream list: one video rendition per
/// vertical resolution (first seen wins), then the audio-only stream with the highest bitrate.
pub fn select_renditions(formats: &[RawFormat]) -> Vec<Rendition> {
    let mut renditions = Vec::new();
    let mut seen_qualities = HashSet::new();

    for format in formats.iter().filter(|format| format.has_video()) {
        let (Some(height), Some(filesize)) = (format.height, format.filesize) else {
            continue;
        };
        if height == 0 || filesize == 0 {
            continue;
        }

        let quality = format!("{height}p");
        if seen_qualities.insert(quality.clone()) {
            renditions.push(Rendition {
                quality,
                size: megabytes(filesize),
                format: format.ext.clone().unwrap_or_else(|| "mp4".to_owned()),
                format_id: format.format_id.clone(),
            });
        }
    }

    // Ties keep the earliest stream
    let best_audio = formats
        .iter()
        .filter(|format| format.has_audio() && !format.has_video())
        .fold(None::<&RawFormat>, |best, candidate| match best {
            Some(best) if candidate.abr.unwrap_or(0.0) <= best.abr.unwrap_or(0.0) => Some(best),
            _ => Some(candidate),
        });
    if let Some(audio) = best_audio {
        let size = match audio.filesize {
            Some(filesize) if filesize > 0 => megabytes(filesize),
            _ => "3.0 MB".to_owned(),
        };
        renditions.push(Rendition {
            quality: "Audio Only".to_owned(),
            size,
            format: "mp3".to_owned(),
            format_id: audio.format_id.clone(),
        });
    }

    if renditions.is_empty() {
        renditions = fallback_renditions();
    }
    renditions.truncate(MAX_RENDITIONS);

    renditions
}

fn is_audio_token(selector_token: &str) -> bool {
    selector_token.contains("audio")
}

/// Maps a selector token onto the format selection expression handed to the extractor. The
/// token is not validated here; the extractor rejects expressions it can't parse.
pub fn format_selector(selector_token: &str) -> String {
    if selector_token.starts_with("demo_") {
        let selector = if is_audio_token(selector_token) {
            "bestaudio"
        } else if selector_token.contains("720p") {
            "best[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720]"
        } else if selector_token.contains("480p") {
            "best[height<=480][ext=mp4]+bestaudio[ext=m4a]/best[height<=480]"
        } else {
            "best[ext=mp4]+bestaudio[ext=m4a]/best"
        };
        return selector.to_owned();
    }

    if is_audio_token(selector_token) {
        selector_token.to_owned()
    } else {
        format!("{selector_token}+bestaudio/best")
    }
}

fn split_extension(file_name: &str) -> (&str, &str) {
    let path = Path::new(file_name);
    match (path.file_stem(), path.extension()) {
        (Some(_), Some(ext)) => {
            let ext_len = ext.len() + 1;
            file_name.split_at(file_name.len() - ext_len)
        }
        _ => (file_name, ""),
    }
}

/// MIME type for a file, based on its extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let (_, ext) = split_extension(file_name);
    match ext.to_ascii_lowercase().as_str() {
        ".mp4" => "video/mp4",
        ".webm" => "video/webm",
        ".mkv" => "video/x-matroska",
        ".mp3" => "audio/mpeg",
        ".m4a" => "audio/mp4",
        ".ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Makes a filename safe to put in a `Content-Disposition` header. The extension is kept as is.
pub fn sanitize_filename(file_name: &str) -> String {
    let (base, ext) = split_extension(file_name);

    let stripped = NON_FILENAME_CHARS.replace_all(base, "");
    let truncated: String = stripped.trim().chars().take(MAX_FILENAME_BASE).collect();
    let collapsed = SEPARATOR_RUNS.replace_all(&truncated, "-");

    let safe_base = if collapsed.is_empty() {
        OUTPUT_STEM
    } else {
        collapsed.as_ref()
    };
    format!("{safe_base}{ext}")
}

async fn first_file_in(dir: &Path) -> Result<Option<PathBuf>, anyhow::Error> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .context("listing the download directory")?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .context("reading the download directory")?
    {
        let file_type = entry
            .file_type()
            .await
            .context("inspecting a downloaded file")?;
        if file_type.is_file() {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}
