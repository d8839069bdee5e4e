use crate::app_env::MailSettings;
use crate::domain::verification::driven_ports::CodeMailer;
use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const CODE_SUBJECT: &str = "TaskFlow - Your Verification Code";

/// Sends verification codes through an SMTP relay using STARTTLS and a login
pub struct SmtpCodeMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpCodeMailer {
    /// Builds the transport. No connection is made until the first message goes out.
    pub fn new(settings: &MailSettings) -> Result<SmtpCodeMailer, anyhow::Error> {
        let sender: Mailbox = settings
            .sender
            .parse()
            .with_context(|| format!("parsing sender address {}", settings.sender))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)
            .with_context(|| format!("configuring SMTP relay {}", settings.smtp_server))?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(SmtpCodeMailer { transport, sender })
    }
}

impl CodeMailer for SmtpCodeMailer {
    async fn send_code(&self, email: &str, code: &str) -> Result<(), anyhow::Error> {
        let message = compose_code_message(&self.sender, email, code)?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("sending verification mail to {email}"))?;

        Ok(())
    }
}

/// Builds the plain-text mail carrying [code]
pub fn compose_code_message(
    sender: &Mailbox,
    email: &str,
    code: &str,
) -> Result<Message, anyhow::Error> {
    let recipient: Mailbox = email
        .parse()
        .with_context(|| format!("parsing recipient address {email}"))?;

    let body = format!(
        "Your TaskFlow verification code is: {code}\n\n\
         Enter this code to verify your email address.\n\n\
         If you didn't request this code, you can ignore this email.\n"
    );

    Message::builder()
        .from(sender.clone())
        .to(recipient)
        .subject(CODE_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .context("building verification mail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    fn sender() -> Mailbox {
        "noreply@example.com".parse().expect("sender should parse")
    }

    #[test]
    fn message_carries_subject_and_code() {
        let message = compose_code_message(&sender(), "someone@example.com", "042917")
            .expect("message should build");
        let formatted = String::from_utf8(message.formatted()).expect("mail should be UTF-8");

        assert!(formatted.contains(&format!("Subject: {CODE_SUBJECT}")));
        assert!(formatted.contains("To: someone@example.com"));
        assert!(formatted.contains("042917"));
    }

    #[test]
    fn rejects_unparseable_recipient() {
        let message = compose_code_message(&sender(), "not an address", "042917");
        assert_that!(message).is_err();
    }

    #[tokio::test]
    async fn transport_builds_without_connecting() {
        let mailer = SmtpCodeMailer::new(&MailSettings {
            smtp_server: "smtp.example.com".to_owned(),
            smtp_port: 587,
            sender: "noreply@example.com".to_owned(),
            password: "hunter2".to_owned(),
        });
        assert!(mailer.is_ok());
    }
}
