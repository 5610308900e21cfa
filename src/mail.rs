use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, email: &str, username: &str, code: &str)
        -> anyhow::Result<()>;
}

/// Sends mail through a Resend-compatible HTTP API.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
}

impl HttpMailer {
    pub fn new(api_url: &str, api_key: &str, from: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build mail http client")?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

fn verification_text(username: &str, code: &str) -> String {
    format!(
        "Hello {username},\n\n\
         Thank you for registering. Please use the following verification code \
         to complete your registration:\n\n{code}\n\n\
         If you did not request this code, please ignore this email.\n"
    )
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_verification(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> anyhow::Result<()> {
        let mail = OutgoingMail {
            from: &self.from,
            to: [email],
            subject: "Verification code",
            text: verification_text(username, code),
        };
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&mail)
            .send()
            .await
            .context("mail api request")?
            .error_for_status()
            .context("mail api status")?;
        debug!(%username, "verification mail sent");
        Ok(())
    }
}

/// Development mailer: writes the code to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> anyhow::Result<()> {
        info!(%email, %username, %code, "mail disabled; verification code");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    let mailer = match &cfg.api_key {
        Some(key) => Arc::new(HttpMailer::new(&cfg.api_url, key, &cfg.from)?) as Arc<dyn Mailer>,
        None => Arc::new(LogMailer) as Arc<dyn Mailer>,
    };
    Ok(mailer)
}

#[cfg(test)]
pub use recording::RecordingMailer;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_contains_code_and_name() {
        let body = verification_text("alice", "123456");
        assert!(body.contains("Hello alice"));
        assert!(body.contains("123456"));
    }

    #[test]
    fn outgoing_mail_shape() {
        let mail = OutgoingMail {
            from: "a@b.dev",
            to: ["c@d.dev"],
            subject: "Verification code",
            text: "x".into(),
        };
        let json = serde_json::to_value(&mail).unwrap();
        assert_eq!(json["to"][0], "c@d.dev");
        assert_eq!(json["from"], "a@b.dev");
    }

    #[test]
    fn no_key_means_log_mailer() {
        let cfg = MailConfig {
            api_url: "https://mail.invalid/emails".into(),
            api_key: None,
            from: "a@b.dev".into(),
        };
        assert!(from_config(&cfg).is_ok());
    }

    #[tokio::test]
    async fn recording_mailer_keeps_codes() {
        let m = RecordingMailer::default();
        m.send_verification("x@y.dev", "x", "111111").await.unwrap();
        m.send_verification("x@y.dev", "x", "222222").await.unwrap();
        assert_eq!(m.last_code_for("x@y.dev").as_deref(), Some("222222"));
        assert_eq!(m.count(), 2);
        m.fail(true);
        assert!(m.send_verification("x@y.dev", "x", "3").await.is_err());
    }
}
