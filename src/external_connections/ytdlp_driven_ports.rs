//! Driven adapter which shells out to the `yt-dlp` binary. Arguments are always handed to the
//! process directly, never through a shell.

use crate::domain::media::driven_ports::MediaExtractor;
use crate::domain::media::{DownloadRequest, RawFormat, RawMediaInfo};
use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, warn};

const BINARY_NAME: &str = "yt-dlp";

pub struct YtDlpExtractor {
    binary_path: Option<PathBuf>,
}

impl YtDlpExtractor {
    pub fn new(binary_path: Option<PathBuf>) -> YtDlpExtractor {
        YtDlpExtractor { binary_path }
    }

    /// An extractor with no backing binary. Every operation fails.
    pub fn unavailable() -> YtDlpExtractor {
        Self::new(None)
    }

    /// Uses [explicit_path] if it points at a file, otherwise looks for `yt-dlp` on the `PATH`
    pub fn discover(explicit_path: Option<&Path>) -> YtDlpExtractor {
        if let Some(path) = explicit_path {
            if path.is_file() {
                return Self::new(Some(path.to_path_buf()));
            }
            warn!("Configured yt-dlp path {} is not a file", path.display());
            return Self::unavailable();
        }

        match which::which(BINARY_NAME) {
            Ok(found) => Self::new(Some(found)),
            Err(lookup_err) => {
                debug!("yt-dlp not found on PATH: {lookup_err}");
                Self::unavailable()
            }
        }
    }

    pub fn is_installed(&self) -> bool {
        self.binary_path.is_some()
    }

    pub fn binary_path_display(&self) -> String {
        self.binary_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_default()
    }

    async fn run(&self, args: &[OsString]) -> Result<Output, anyhow::Error> {
        let binary = self
            .binary_path
            .as_ref()
            .ok_or_else(|| anyhow!("yt-dlp is not installed"))?;

        let output = Command::new(binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("running {}", binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(output)
    }
}

impl MediaExtractor for YtDlpExtractor {
    fn is_available(&self) -> bool {
        self.is_installed()
    }

    async fn version(&self) -> Result<String, anyhow::Error> {
        let output = self.run(&[OsString::from("--version")]).await?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    async fn extract_info(&self, url: &str) -> Result<RawMediaInfo, anyhow::Error> {
        let output = self.run(&info_args(url)).await?;
        let info: YtDlpInfo = serde_json::from_slice(&output.stdout)
            .context("parsing the metadata yt-dlp printed")?;

        Ok(info.into())
    }

    async fn download(
        &self,
        url: &str,
        request: &DownloadRequest,
        target_dir: &Path,
    ) -> Result<(), anyhow::Error> {
        self.run(&download_args(url, request, target_dir)).await?;

        Ok(())
    }
}

fn info_args(url: &str) -> Vec<OsString> {
    vec![
        "--dump-single-json".into(),
        "--no-warnings".into(),
        "--".into(),
        url.into(),
    ]
}

/// Command line for downloading [url] into [target_dir]
pub fn download_args(url: &str, request: &DownloadRequest, target_dir: &Path) -> Vec<OsString> {
    let output_template = target_dir.join(format!("{}.%(ext)s", request.output_stem));

    let mut args: Vec<OsString> = vec![
        "--quiet".into(),
        "--no-warnings".into(),
        "--format".into(),
        request.format_selector.as_str().into(),
        "--output".into(),
        output_template.into_os_string(),
        "--merge-output-format".into(),
        request.merge_container.into(),
    ];
    if let Some(ref extraction) = request.audio_extraction {
        args.extend([
            "--extract-audio".into(),
            "--audio-format".into(),
            extraction.codec.into(),
            "--audio-quality".into(),
            format!("{}K", extraction.quality).into(),
        ]);
    }
    args.extend(["--".into(), url.into()]);

    args
}

/// The parts of yt-dlp's JSON metadata output that get used
#[derive(Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    formats: Option<Vec<YtDlpFormat>>,
}

#[derive(Deserialize)]
struct YtDlpFormat {
    format_id: String,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    filesize: Option<u64>,
    abr: Option<f64>,
}

impl From<YtDlpInfo> for RawMediaInfo {
    fn from(value: YtDlpInfo) -> Self {
        RawMediaInfo {
            id: value.id,
            title: value.title,
            thumbnail: value.thumbnail,
            duration: value.duration,
            view_count: value.view_count,
            formats: value
                .formats
                .unwrap_or_default()
                .into_iter()
                .map(RawFormat::from)
                .collect(),
        }
    }
}

impl From<YtDlpFormat> for RawFormat {
    fn from(value: YtDlpFormat) -> Self {
        RawFormat {
            format_id: value.format_id,
            ext: value.ext,
            vcodec: value.vcodec,
            acodec: value.acodec,
            height: value.height,
            filesize: value.filesize,
            abr: value.abr,
        }
    }
}
