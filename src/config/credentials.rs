//! Dependency credentials from the environment.
//!
//! Secrets are read from environment variables only and are never logged.
//! Empty values are treated as unset.

/// PayPal API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaypalMode {
    #[default]
    Sandbox,
    Live,
}

/// Connection details for every probed dependency.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    pub paypal_mode: PaypalMode,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
}

pub const DEFAULT_SMTP_PORT: u16 = 587;

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let paypal_mode = match get("PAYPAL_MODE").as_deref() {
            Some("live") | Some("production") => PaypalMode::Live,
            _ => PaypalMode::Sandbox,
        };

        let smtp_port = match get("SMTP_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring invalid SMTP_PORT, using default");
                DEFAULT_SMTP_PORT
            }),
            None => DEFAULT_SMTP_PORT,
        };

        Self {
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            paypal_client_id: get("PAYPAL_CLIENT_ID"),
            paypal_client_secret: get("PAYPAL_CLIENT_SECRET"),
            paypal_mode,
            smtp_host: get("SMTP_HOST"),
            smtp_port,
        }
    }
}

/// Strip the password from a connection URL before it is logged.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparsable url>".to_string(),
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("database_url", &self.database_url.as_deref().map(redact_url))
            .field("redis_url", &self.redis_url.as_deref().map(redact_url))
            .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "***"))
            .field("paypal_client_id", &self.paypal_client_id)
            .field("paypal_client_secret", &self.paypal_client_secret.as_ref().map(|_| "***"))
            .field("paypal_mode", &self.paypal_mode)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}
