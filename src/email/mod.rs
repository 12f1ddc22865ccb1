//! Moderator mail delivery
//!
//! The engine sends exactly one kind of mail: a "review awaiting
//! moderation" note to the moderation inbox. Delivery is lettre over SMTP,
//! configured from the environment, with a mock mode (`SMTP_MOCK=true`)
//! that logs the message instead of sending it.

pub mod templates;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::env;

pub type EmailResult<T> = Result<T, EmailError>;

#[derive(Debug)]
pub enum EmailError {
    /// Bad SMTP settings or an unparseable address
    Config(String),
    /// Message assembly failure
    Build(lettre::error::Error),
    /// Transport failure
    Send(lettre::transport::smtp::Error),
}

impl std::fmt::Display for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailError::Config(msg) => write!(f, "Email config error: {}", msg),
            EmailError::Build(e) => write!(f, "Email build error: {}", e),
            EmailError::Send(e) => write!(f, "Email send error: {}", e),
        }
    }
}

impl std::error::Error for EmailError {}

impl From<lettre::error::Error> for EmailError {
    fn from(e: lettre::error::Error) -> Self {
        EmailError::Build(e)
    }
}

impl From<lettre::transport::smtp::Error> for EmailError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        EmailError::Send(e)
    }
}

/// SMTP settings, read from the environment per message. Moderator mail is
/// rare enough that a pooled transport is not worth holding open.
#[derive(Clone, Debug)]
pub struct MailerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub sender_name: String,
    pub tls: bool,
    pub mock: bool,
}

impl MailerConfig {
    pub fn from_env() -> EmailResult<Self> {
        Ok(MailerConfig {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| EmailError::Config("Invalid SMTP_PORT".to_string()))?,
            username: env::var("SMTP_USERNAME").unwrap_or_else(|_| "noreply@localhost".to_string()),
            password: env::var("SMTP_PASSWORD").unwrap_or_else(|_| String::new()),
            sender: env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| "noreply@localhost".to_string()),
            sender_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Starboard".to_string()),
            tls: env::var("SMTP_USE_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            mock: env::var("SMTP_MOCK")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }

    fn sender_mailbox(&self) -> EmailResult<Mailbox> {
        format!("{} <{}>", self.sender_name, self.sender)
            .parse()
            .map_err(|e| EmailError::Config(format!("Invalid sender address: {}", e)))
    }
}

/// Send a moderation notice with text and HTML alternatives. Mock mode
/// logs the text body and reports success without touching the network.
pub async fn send_moderation_email(
    to: &str,
    subject: &str,
    body_text: &str,
    body_html: &str,
) -> EmailResult<()> {
    let config = MailerConfig::from_env()?;

    if config.mock {
        log::info!("MOCK EMAIL:");
        log::info!("  To: {}", to);
        log::info!("  Subject: {}", subject);
        log::info!("  Body: {}", body_text);
        return Ok(());
    }

    let recipient: Mailbox = to
        .parse()
        .map_err(|e| EmailError::Config(format!("Invalid recipient address: {}", e)))?;

    let message = Message::builder()
        .from(config.sender_mailbox()?)
        .to(recipient)
        .subject(subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(body_text.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(body_html.to_string()),
                ),
        )?;

    let credentials = Credentials::new(config.username.clone(), config.password.clone());
    let mailer = if config.tls {
        SmtpTransport::relay(&config.host)?
            .credentials(credentials)
            .port(config.port)
            .build()
    } else {
        SmtpTransport::builder_dangerous(&config.host)
            .credentials(credentials)
            .port(config.port)
            .build()
    };

    mailer.send(&message)?;
    log::info!("Moderation email sent to {}", to);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_config() -> MailerConfig {
        MailerConfig {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            sender: "reviews@example.com".to_string(),
            sender_name: "Starboard".to_string(),
            tls: true,
            mock: false,
        }
    }

    #[test]
    fn test_sender_mailbox_carries_name_and_address() {
        let mailbox = test_config().sender_mailbox().expect("sender should parse");
        let rendered = mailbox.to_string();
        assert!(rendered.contains("Starboard"));
        assert!(rendered.contains("reviews@example.com"));
    }

    #[test]
    fn test_bad_sender_address_is_a_config_error() {
        let mut config = test_config();
        config.sender = "not an address".to_string();
        assert!(matches!(
            config.sender_mailbox(),
            Err(EmailError::Config(_))
        ));
    }

    #[actix_rt::test]
    #[serial]
    async fn test_mock_mode_short_circuits_transport() {
        env::set_var("SMTP_MOCK", "true");
        let result =
            send_moderation_email("mods@example.com", "Subject", "text body", "<p>html</p>").await;
        env::remove_var("SMTP_MOCK");
        assert!(result.is_ok(), "Mock delivery should succeed, got {:?}", result);
    }
}
