pub mod smtp_driven_ports;
pub mod ytdlp_driven_ports;

use crate::app_env::AppConfig;
use smtp_driven_ports::SmtpCodeMailer;
use tracing::{info, warn};
use ytdlp_driven_ports::YtDlpExtractor;

/// Data structure which owns clients for connecting to external systems.
/// Allows business logic to be agnostic of the external systems it communicates with
/// so driven adapters can easily be swapped out for other implementations
pub struct ExternalConnectivity {
    mailer: Option<SmtpCodeMailer>,
    extractor: YtDlpExtractor,
}

impl ExternalConnectivity {
    /// Accepts the set of clients used to connect to external systems and constructs
    /// an instance of ExternalConnectivity owning those clients
    pub fn new(mailer: Option<SmtpCodeMailer>, extractor: YtDlpExtractor) -> Self {
        ExternalConnectivity { mailer, extractor }
    }

    /// Builds the SMTP transport (if mail is configured) and locates the extractor binary
    pub fn from_config(config: &AppConfig) -> Result<Self, anyhow::Error> {
        let mailer = match config.mail {
            Some(ref mail_settings) => Some(SmtpCodeMailer::new(mail_settings)?),
            None => {
                warn!("SMTP is not configured, verification codes can't be mailed");
                None
            }
        };

        let extractor = YtDlpExtractor::discover(config.ytdlp_path.as_deref());
        if extractor.is_installed() {
            info!("Using yt-dlp at {}", extractor.binary_path_display());
        } else {
            warn!("yt-dlp was not found, media descriptions will be demo data");
        }

        Ok(ExternalConnectivity { mailer, extractor })
    }

    /// The mail transport for verification codes. [None] when SMTP isn't configured.
    pub fn mailer(&self) -> &Option<SmtpCodeMailer> {
        &self.mailer
    }

    pub fn extractor(&self) -> &YtDlpExtractor {
        &self.extractor
    }
}
