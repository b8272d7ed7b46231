//! Notification gateway for account emails.
//!
//! [`Mailer`] is the seam the account flows talk to. [`EmailService`]
//! delivers over SMTP with `lettre`; [`OutboxMailer`] logs messages and
//! keeps the most recent ones in a bounded in-memory outbox, which is what
//! development and tests run with.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Which account flow an email belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEmailKind {
    /// Sent after registration.
    Confirmation,
    /// Sent by the forgot-password flow.
    PasswordReset,
}

/// An account email addressed to a user and carrying an opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEmail {
    /// Flow this email belongs to.
    pub kind: AuthEmailKind,
    /// Recipient display name.
    pub name: String,
    /// Recipient address.
    pub email: String,
    /// Opaque token the user must present.
    pub token: String,
}

impl AuthEmail {
    /// Builds a confirmation email.
    #[must_use]
    pub fn confirmation(name: &str, email: &str, token: &str) -> Self {
        Self::new(AuthEmailKind::Confirmation, name, email, token)
    }

    /// Builds a password reset email.
    #[must_use]
    pub fn password_reset(name: &str, email: &str, token: &str) -> Self {
        Self::new(AuthEmailKind::PasswordReset, name, email, token)
    }

    fn new(kind: AuthEmailKind, name: &str, email: &str, token: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            email: email.to_string(),
            token: token.to_string(),
        }
    }

    /// Renders subject and plain-text body.
    #[must_use]
    pub fn render(&self, frontend_url: &str) -> (String, String) {
        match self.kind {
            AuthEmailKind::Confirmation => (
                "CashTrackr - Confirma tu cuenta".to_string(),
                format!(
                    r"Hola {name},

Has creado tu cuenta en CashTrackr, ya esta casi lista.

Visita el siguiente enlace:
{frontend_url}/auth/confirm-account

e ingresa el código: {token}",
                    name = self.name,
                    token = self.token,
                ),
            ),
            AuthEmailKind::PasswordReset => (
                "CashTrackr - Reestablece tu password".to_string(),
                format!(
                    r"Hola {name},

Has solicitado reestablecer tu password.

Visita el siguiente enlace:
{frontend_url}/auth/new-password

e ingresa el código: {token}",
                    name = self.name,
                    token = self.token,
                ),
            ),
        }
    }
}

/// Delivers account emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one account email.
    async fn send(&self, email: AuthEmail) -> Result<(), EmailError>;
}

/// SMTP email service.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        Ok(transport)
    }

    /// Builds the MIME message for an account email.
    fn build_message(&self, email: &AuthEmail) -> Result<Message, EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let (subject, body) = email.render(&self.config.frontend_url);

        Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(email
                .email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, email: AuthEmail) -> Result<(), EmailError> {
        let message = self.build_message(&email)?;
        let transport = self.create_transport()?;
        transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        info!(to = %email.email, kind = ?email.kind, "Email sent");
        Ok(())
    }
}

/// Emails an [`OutboxMailer`] keeps before dropping the oldest.
pub const OUTBOX_CAPACITY: usize = 100;

/// In-process outbox used instead of SMTP.
///
/// Holds at most `capacity` emails; older ones are dropped.
#[derive(Debug)]
pub struct OutboxMailer {
    frontend_url: String,
    capacity: usize,
    sent: Mutex<VecDeque<AuthEmail>>,
}

impl OutboxMailer {
    /// Creates an empty outbox holding up to [`OUTBOX_CAPACITY`] emails.
    #[must_use]
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self::with_capacity(frontend_url, OUTBOX_CAPACITY)
    }

    /// Creates an empty outbox holding up to `capacity` emails.
    #[must_use]
    pub fn with_capacity(frontend_url: impl Into<String>, capacity: usize) -> Self {
        Self {
            frontend_url: frontend_url.into(),
            capacity: capacity.max(1),
            sent: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns the retained emails, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<AuthEmail> {
        self.sent
            .lock()
            .map(|sent| sent.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the token of the most recent email of `kind` sent to `address`.
    #[must_use]
    pub fn latest_token(&self, kind: AuthEmailKind, address: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|email| email.kind == kind && email.email == address)
            .map(|email| email.token)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: AuthEmail) -> Result<(), EmailError> {
        let (subject, body) = email.render(&self.frontend_url);
        info!(to = %email.email, subject = %subject, body = %body, "Email queued in outbox");

        let mut sent = self
            .sent
            .lock()
            .map_err(|e| EmailError::SendError(e.to_string()))?;
        if sent.len() == self.capacity {
            sent.pop_front();
        }
        sent.push_back(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
    }

    #[test]
    fn test_render_confirmation_contains_token_and_link() {
        let email = AuthEmail::confirmation("Erik", "erik@test.com", "123456");
        let (subject, body) = email.render("http://localhost:3000");

        assert_eq!(subject, "CashTrackr - Confirma tu cuenta");
        assert!(body.contains("Hola Erik"));
        assert!(body.contains("http://localhost:3000/auth/confirm-account"));
        assert!(body.contains("123456"));
    }

    #[test]
    fn test_render_password_reset_links_new_password_page() {
        let email = AuthEmail::password_reset("Erik", "erik@test.com", "654321");
        let (subject, body) = email.render("https://app.example");

        assert_eq!(subject, "CashTrackr - Reestablece tu password");
        assert!(body.contains("https://app.example/auth/new-password"));
        assert!(body.contains("654321"));
    }

    #[test]
    fn test_build_message_rejects_invalid_recipient() {
        let service = EmailService::new(EmailConfig::default());
        let email = AuthEmail::confirmation("Erik", "not an address", "123456");

        assert!(matches!(
            service.build_message(&email),
            Err(EmailError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_create_transport() {
        let service = EmailService::new(EmailConfig::default());
        assert!(service.create_transport().is_ok());
    }

    #[tokio::test]
    async fn test_outbox_records_latest_token() {
        let outbox = OutboxMailer::new("http://localhost:3000");

        outbox
            .send(AuthEmail::confirmation("A", "a@test.com", "111111"))
            .await
            .unwrap();
        outbox
            .send(AuthEmail::password_reset("A", "a@test.com", "222222"))
            .await
            .unwrap();
        outbox
            .send(AuthEmail::confirmation("A", "a@test.com", "333333"))
            .await
            .unwrap();

        assert_eq!(outbox.sent().len(), 3);
        assert_eq!(
            outbox.latest_token(AuthEmailKind::Confirmation, "a@test.com"),
            Some("333333".to_string())
        );
        assert_eq!(
            outbox.latest_token(AuthEmailKind::PasswordReset, "a@test.com"),
            Some("222222".to_string())
        );
        assert_eq!(
            outbox.latest_token(AuthEmailKind::Confirmation, "b@test.com"),
            None
        );
    }

    #[tokio::test]
    async fn test_outbox_drops_oldest_beyond_capacity() {
        let outbox = OutboxMailer::with_capacity("http://localhost:3000", 3);

        for i in 0..10 {
            outbox
                .send(AuthEmail::confirmation("A", &format!("{i}@test.com"), "111111"))
                .await
                .unwrap();
        }

        let kept: Vec<String> = outbox.sent().into_iter().map(|e| e.email).collect();
        assert_eq!(kept, ["7@test.com", "8@test.com", "9@test.com"]);
        assert_eq!(
            outbox.latest_token(AuthEmailKind::Confirmation, "0@test.com"),
            None
        );
    }

    #[test]
    fn test_default_outbox_is_bounded() {
        let outbox = OutboxMailer::new("http://localhost:3000");
        assert_eq!(outbox.capacity, OUTBOX_CAPACITY);
    }

    #[test]
    fn test_email_error_display() {
        assert_eq!(
            EmailError::SendError("msg".into()).to_string(),
            "Failed to send email: msg"
        );
    }
}
