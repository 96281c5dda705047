use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("failed to send mail: {0}")]
    Transport(String),
}

/// Envoi des emails (OTP, confirmation). Sans configuration SMTP, le mail est
/// seulement loggé (sans le contenu).
#[derive(Clone)]
pub struct Mailer {
    config: Option<MailConfig>,
}

impl Mailer {
    pub fn new(config: Option<MailConfig>) -> Self {
        Self { config }
    }

    pub async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<(), MailError> {
        let Some(config) = self.config.clone() else {
            tracing::info!(%to, %subject, "SMTP not configured, mail skipped");
            return Ok(());
        };

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::Address(config.from.clone()))?;
        let recipient: Mailbox = to.parse().map_err(|_| MailError::Address(to.to_string()))?;

        let email = Message::builder()
            .from(from)
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        let mailer = SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(Credentials::new(config.smtp_user, config.smtp_pass))
            .build();

        // lettre est bloquant : on sort du thread du worker
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }

    /// Envoi dont l'échec est loggé puis ignoré : l'état du compte est déjà valide
    pub async fn send_logged(&self, to: &str, subject: &str, html_body: String) {
        if let Err(e) = self.send(to, subject, html_body).await {
            tracing::warn!(%to, error = %e, "mail dispatch failed");
        }
    }
}

pub fn verification_code_body(code: &str) -> String {
    format!("<p>Your verification code is <b>{}</b>. It expires in 10 minutes.</p>", code)
}

pub fn verification_success_body(name: &str) -> String {
    format!(
        "<p>Hi {},<br>Your email has been successfully verified. You can now log in to your account.</p>",
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_smtp_is_a_noop() {
        let mailer = Mailer::new(None);
        assert!(mailer.send("someone@example.com", "Hello", "<p>hi</p>".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_reported() {
        let mailer = Mailer::new(Some(MailConfig {
            smtp_host: "localhost".to_string(),
            smtp_user: String::new(),
            smtp_pass: String::new(),
            from: "noreply@example.com".to_string(),
        }));

        let result = mailer.send("not an address", "Hello", String::new()).await;
        assert!(matches!(result, Err(MailError::Address(_))));
    }
}
