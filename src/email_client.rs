use std::{fmt, time::Duration};

use eyre::Context as _;
use futures::future::BoxFuture;
use reqwest::Url;

use crate::{config::endpoint, domain::SubscriberEmail};

/// Something that can deliver a plain-text email.
pub trait MailSender: Send + Sync {
    fn send<'a>(
        &'a self,
        recipient: &'a SubscriberEmail,
        subject: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, eyre::Result<()>>;
}

/// Sends mail through the Gmail API `messages.send` endpoint using an OAuth access token.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    send_url: Url,
    access_token: String,
    timeout: Duration,
}

#[derive(serde::Serialize)]
struct SendMessageRequest<'a> {
    raw: &'a str,
}

impl EmailClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: &Url,
        access_token: String,
        timeout: Duration,
    ) -> Self {
        let send_url = endpoint(base_url, "gmail/v1/users/me/messages/send");

        Self {
            http_client,
            send_url,
            access_token,
            timeout,
        }
    }

    #[tracing::instrument(skip(self, recipient, body), fields(%recipient))]
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        body: &str,
    ) -> eyre::Result<()> {
        let message = render_message(recipient, subject, body);
        let raw = base64::encode_config(message, base64::URL_SAFE);

        self.http_client
            .post(self.send_url.clone())
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .json(&SendMessageRequest { raw: &raw })
            .send()
            .await
            .context("failed to reach the email API")?
            .error_for_status()
            .context("the email API rejected the message")?;

        Ok(())
    }
}

impl MailSender for EmailClient {
    fn send<'a>(
        &'a self,
        recipient: &'a SubscriberEmail,
        subject: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, eyre::Result<()>> {
        Box::pin(self.send_email(recipient, subject, body))
    }
}

impl fmt::Debug for EmailClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailClient")
            .field("send_url", &self.send_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn render_message(recipient: &SubscriberEmail, subject: &str, body: &str) -> String {
    format!(
        "To: {}\r\n\
        Subject: {}\n\
        MIME-version: 1.0;\n\
        Content-Type: text/plain; charset=\"UTF-8\";\n\
        \n\
        \n\
        {}",
        recipient, subject, body,
    )
}
