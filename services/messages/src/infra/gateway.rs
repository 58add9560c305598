use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use crate::domain::repository::GatewayPort;
use crate::error::GatewayError;

const WHATSAPP_PREFIX: &str = "whatsapp:";

#[derive(Clone)]
struct TwilioCredentials {
    account_sid: String,
    auth_token: String,
}

/// Twilio WhatsApp Messages API client. One form POST per delivery attempt.
///
/// Built without credentials, every `send` fails with
/// [`GatewayError::CredentialsNotConfigured`].
#[derive(Clone)]
pub struct TwilioGateway {
    client: reqwest::Client,
    api_base: String,
    credentials: Option<TwilioCredentials>,
}

#[derive(Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResource {
    message: Option<String>,
    code: Option<i64>,
}

impl TwilioGateway {
    pub fn new(
        api_base: impl Into<String>,
        credentials: Option<(&str, &str)>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build gateway http client")?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            credentials: credentials.map(|(sid, token)| TwilioCredentials {
                account_sid: sid.to_owned(),
                auth_token: token.to_owned(),
            }),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, account_sid
        )
    }
}

impl GatewayPort for TwilioGateway {
    async fn send(&self, recipient: &str, body: &str, sender: &str) -> Result<String, GatewayError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(GatewayError::CredentialsNotConfigured)?;
        if sender.trim().is_empty() {
            return Err(GatewayError::MissingSender);
        }

        let to = whatsapp_address(recipient);
        let from = whatsapp_address(sender);
        let form = [("To", to.as_str()), ("From", from.as_str()), ("Body", body)];

        let response = self
            .client
            .post(self.messages_url(&credentials.account_sid))
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                detail: rejection_detail(&text),
            });
        }

        let resource: MessageResource = serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let sid = resource
            .sid
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("missing message sid".to_owned()))?;

        tracing::debug!(sid = %sid, to = %to, from = %from, "gateway accepted message");
        Ok(sid)
    }
}

fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_owned()
    } else {
        format!("{WHATSAPP_PREFIX}{number}")
    }
}

fn rejection_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorResource>(body) {
        Ok(ErrorResource {
            message: Some(message),
            code: Some(code),
        }) => format!("{message} (code {code})"),
        Ok(ErrorResource {
            message: Some(message),
            code: None,
        }) => message,
        _ => body.trim().chars().take(200).collect(),
    }
}
