//! Stripe API probe.
//!
//! Reads the account balance, which needs only a secret key and has no
//! side effects.

use async_trait::async_trait;
use serde_json::json;

use crate::probes::{error_for_status, Probe, ProbeError};

pub struct StripeProbe {
    client: reqwest::Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeProbe {
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, secret_key: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            secret_key,
        }
    }
}

#[async_trait]
impl Probe for StripeProbe {
    fn service(&self) -> &str {
        "stripe"
    }

    fn missing_configuration(&self) -> Vec<String> {
        match self.secret_key {
            Some(_) => Vec::new(),
            None => vec!["STRIPE_SECRET_KEY".to_string()],
        }
    }

    async fn check(&self) -> Result<Option<serde_json::Value>, ProbeError> {
        let key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| ProbeError::Protocol("stripe key not configured".into()))?;

        let url = format!("{}/v1/balance", self.api_base.trim_end_matches('/'));
        let response = self.client.get(url).bearer_auth(key).send().await?;
        let balance: serde_json::Value = error_for_status(response).await?.json().await?;

        if balance.get("object").and_then(|v| v.as_str()) != Some("balance") {
            return Err(ProbeError::Protocol("balance response missing object=balance".into()));
        }

        let currencies = balance
            .get("available")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0);

        Ok(Some(json!({
            "livemode": balance.get("livemode").and_then(|v| v.as_bool()).unwrap_or(false),
            "availableCurrencies": currencies,
        })))
    }
}
