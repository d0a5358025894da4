use std::{fmt, time};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::domain::{EmailAddress, RateAlert, Subscriber};
use crate::utils::error_chain_fmt;

/// Delivers a rate alert to one subscriber
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &Subscriber, alert: &RateAlert) -> Result<(), SendError>;
}

/// Email delivery error type
#[derive(thiserror::Error)]
pub enum SendError {
    #[error("Failed to reach the email API")]
    Transport(#[from] reqwest::Error),
    #[error("The email API rejected the message: {0}")]
    Rejected(String),
    #[error("The email API returned an unreadable response")]
    InvalidResponse(#[source] reqwest::Error),
}

impl fmt::Debug for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// How rate alerts are rendered into emails
#[derive(Clone, Debug)]
pub struct AlertTemplate {
    pub subject: String,
    /// Provider-side template; plain HTML/text bodies are sent when absent
    pub template_id: Option<String>,
    pub from_currency: String,
    pub to_currency: String,
}

/// Variables substituted into the provider-side template
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TemplateData {
    from_currency: String,
    to_currency: String,
    rate: String,
    date: String,
    time: String,
    message: String,
}

impl TemplateData {
    pub fn new(template: &AlertTemplate, alert: &RateAlert) -> Self {
        let fetched_at = alert.sample.fetched_at();
        Self {
            from_currency: template.from_currency.clone(),
            to_currency: template.to_currency.clone(),
            rate: format!("{:.4}", alert.sample.value()),
            date: fetched_at.format("%d/%m/%Y").to_string(),
            time: fetched_at.format("%H:%M:%S").to_string(),
            message: alert.message.text().to_owned(),
        }
    }

    fn html_body(&self) -> String {
        format!(
            "<p><strong>{}</strong></p>\
            <p>1 {} = {} {}</p>\
            <p>Checked on {} at {} UTC.</p>",
            self.message, self.from_currency, self.rate, self.to_currency, self.date, self.time
        )
    }

    fn text_body(&self) -> String {
        format!(
            "{}\n1 {} = {} {}\nChecked on {} at {} UTC.",
            self.message, self.from_currency, self.rate, self.to_currency, self.date, self.time
        )
    }
}

/// Request body of SMTP2GO's `email/send` endpoint
#[derive(serde::Serialize)]
struct SendEmailRequest<'a> {
    api_key: &'a str,
    to: [&'a str; 1],
    sender: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_data: Option<&'a TemplateData>,
}

#[derive(serde::Deserialize)]
struct SendEmailResponse {
    data: SendEmailOutcome,
}

#[derive(serde::Deserialize)]
struct SendEmailOutcome {
    #[serde(default)]
    succeeded: u32,
    #[serde(default)]
    error: Option<String>,
}

/// Email client data
pub struct EmailClient {
    http_client: Client,
    base_url: Url,
    sender: EmailAddress,
    api_key: SecretString,
    template: AlertTemplate,
}

impl EmailClient {
    pub fn new(
        base_url: Url,
        sender: EmailAddress,
        api_key: SecretString,
        template: AlertTemplate,
        timeout: time::Duration,
    ) -> anyhow::Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            api_key,
            template,
        })
    }

    /// Send a plain email using SMTP2GO's REST API
    /// <https://developers.smtp2go.com/reference/send-standard-email>
    pub async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), SendError> {
        self.post(SendEmailRequest {
            api_key: self.api_key.expose_secret(),
            to: [recipient.as_ref()],
            sender: self.sender.as_ref(),
            subject,
            html_body: Some(html_content),
            text_body: Some(text_content),
            template_id: None,
            template_data: None,
        })
        .await
    }

    /// Send an email rendered from a template stored on SMTP2GO
    pub async fn send_template(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        template_id: &str,
        template_data: &TemplateData,
    ) -> Result<(), SendError> {
        self.post(SendEmailRequest {
            api_key: self.api_key.expose_secret(),
            to: [recipient.as_ref()],
            sender: self.sender.as_ref(),
            subject,
            html_body: None,
            text_body: None,
            template_id: Some(template_id),
            template_data: Some(template_data),
        })
        .await
    }

    async fn post(&self, request: SendEmailRequest<'_>) -> Result<(), SendError> {
        let url = self
            .base_url
            .join("/v3/email/send")
            .map_err(|e| SendError::Rejected(format!("invalid email API URL: {e}")))?;
        let response: SendEmailResponse = self
            .http_client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(SendError::InvalidResponse)?;

        // A 200 can still carry zero accepted recipients
        if response.data.succeeded > 0 {
            Ok(())
        } else {
            Err(SendError::Rejected(response.data.error.unwrap_or_else(
                || "no recipient was accepted".to_string(),
            )))
        }
    }
}

#[async_trait]
impl Notifier for EmailClient {
    #[tracing::instrument(
        name = "Send rate alert",
        skip(self, recipient, alert),
        fields(subscriber_email = %recipient.email)
    )]
    async fn send(&self, recipient: &Subscriber, alert: &RateAlert) -> Result<(), SendError> {
        let data = TemplateData::new(&self.template, alert);
        match &self.template.template_id {
            Some(template_id) => {
                self.send_template(&recipient.email, &self.template.subject, template_id, &data)
                    .await
            }
            None => {
                self.send_email(
                    &recipient.email,
                    &self.template.subject,
                    &data.html_body(),
                    &data.text_body(),
                )
                .await
            }
        }
    }
}
