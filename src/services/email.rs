//! Outbound email for the password reset flow.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    Send(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn password_reset(to: impl Into<String>, reset_url: &str) -> Self {
        Self {
            to: to.into(),
            subject: "Password reset token".to_string(),
            body: format!(
                "You are receiving this email because you (or someone else) has requested \
                 the reset of a password. Please make a PUT request to: \n\n {}",
                reset_url
            ),
        }
    }
}

/// Email sender trait for abstraction
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// SMTP email sender
pub struct SmtpEmailSender {
    config: EmailConfig,
}

impl SmtpEmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        if self.config.smtp_user.is_empty() {
            // Local development relays (mailhog, mailpit) speak plain SMTP
            return Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build());
        }

        let creds = Credentials::new(self.config.smtp_user.clone(), self.config.smtp_password.clone());
        Ok(AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::Send(format!("SMTP relay error: {}", e)))?
            .credentials(creds)
            .port(self.config.smtp_port)
            .build())
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| EmailError::Address(format!("from: {}", e)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| EmailError::Address(format!("to: {}", e)))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport()?
            .send(message)
            .await
            .map_err(|e| EmailError::Send(e.to_string()))?;

        tracing::info!("Sent email to {}", email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn reset_email_contains_url() {
        let email = OutgoingEmail::password_reset("a@b.co", "http://host/api/v1/auth/resetpassword/abc");
        assert_eq!(email.to, "a@b.co");
        assert!(email.body.ends_with("http://host/api/v1/auth/resetpassword/abc"));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let sender = SmtpEmailSender::new(AppConfig::development().email);
        let email = OutgoingEmail::password_reset("not an address", "http://x");
        assert!(matches!(sender.send(email).await, Err(EmailError::Address(_))));
    }
}
