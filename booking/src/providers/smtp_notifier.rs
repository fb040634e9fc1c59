//! SMTP notifier implementation using Lettre.

use crate::config::SmtpConfig;
use crate::error::{BookingError, Result};
use crate::providers::{ConsoleNotifier, Notice, Notifier};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// SMTP notifier using Lettre.
///
/// Sends real email; suitable for production use.
///
/// # Examples
///
/// ```ignore
/// use interview_booking::config::Config;
/// use interview_booking::providers::SmtpNotifier;
///
/// let notifier = SmtpNotifier::from_config(&Config::from_env().smtp)?;
/// ```
#[derive(Clone)]
pub struct SmtpNotifier {
    /// SMTP relay host.
    smtp_server: String,

    /// SMTP relay port.
    smtp_port: u16,

    /// SMTP credentials.
    credentials: Credentials,

    /// Parsed sender.
    from: Mailbox,
}

impl SmtpNotifier {
    /// Create a new SMTP notifier.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NotificationFailed` if the sender address is invalid.
    pub fn new(
        smtp_server: String,
        smtp_port: u16,
        smtp_username: String,
        smtp_password: String,
        from_email: &str,
        from_name: &str,
    ) -> Result<Self> {
        let from = format!("{from_name} <{from_email}>")
            .parse()
            .map_err(|e| BookingError::NotificationFailed(format!("Invalid from address: {e}")))?;

        Ok(Self {
            smtp_server,
            smtp_port,
            credentials: Credentials::new(smtp_username, smtp_password),
            from,
        })
    }

    /// Create a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NotificationFailed` if no password is configured
    /// or the sender address is invalid.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let password = config.password.clone().ok_or_else(|| {
            BookingError::NotificationFailed("SMTP password not configured".to_string())
        })?;

        Self::new(
            config.host.clone(),
            config.port,
            config.username.clone(),
            password,
            &config.from_email,
            &config.from_name,
        )
    }

    /// Build SMTP transport.
    fn build_transport(&self) -> Result<SmtpTransport> {
        Ok(SmtpTransport::relay(&self.smtp_server)
            .map_err(|e| BookingError::NotificationFailed(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, notice: Notice) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(notice
                .to
                .parse()
                .map_err(|e| BookingError::NotificationFailed(format!("Invalid to address: {e}")))?)
            .subject(notice.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body)
            .map_err(|e| BookingError::NotificationFailed(format!("Failed to build email: {e}")))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| BookingError::NotificationFailed(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| BookingError::NotificationFailed(format!("Email task failed: {e}")))?
        .map(|_| ())
    }
}

/// Notifier selected from configuration.
///
/// SMTP when a password is configured, console logging otherwise.
#[derive(Clone)]
pub enum MailNotifier {
    /// Real delivery.
    Smtp(SmtpNotifier),
    /// Development mode.
    Console(ConsoleNotifier),
}

impl MailNotifier {
    /// Pick the notifier for `config`.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NotificationFailed` if SMTP is configured with
    /// an invalid sender address.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        if config.is_enabled() {
            Ok(Self::Smtp(SmtpNotifier::from_config(config)?))
        } else {
            Ok(Self::Console(ConsoleNotifier::new()))
        }
    }
}

impl Notifier for MailNotifier {
    async fn send(&self, notice: Notice) -> Result<()> {
        match self {
            Self::Smtp(notifier) => notifier.send(notice).await,
            Self::Console(notifier) => notifier.send(notice).await,
        }
    }
}
