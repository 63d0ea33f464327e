//! Relational database probe.
//!
//! Connects lazily on first use and keeps the pool. Each check pings the
//! pool and runs a trivial round-trip query.

use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use crate::config::credentials::redact_url;
use crate::probes::{Probe, ProbeError};

pub struct DatabaseProbe {
    url: Option<String>,
    connection: OnceCell<DatabaseConnection>,
}

impl DatabaseProbe {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self, url: &str) -> Result<&DatabaseConnection, ProbeError> {
        self.connection
            .get_or_try_init(|| async {
                let mut opt = ConnectOptions::new(url.to_string());
                opt.max_connections(2)
                    .min_connections(0)
                    .connect_timeout(Duration::from_secs(5))
                    .acquire_timeout(Duration::from_secs(5))
                    .sqlx_logging(false);

                let db = Database::connect(opt).await?;
                tracing::info!(url = %redact_url(url), "Database probe connected");
                Ok::<_, ProbeError>(db)
            })
            .await
    }
}

#[async_trait]
impl Probe for DatabaseProbe {
    fn service(&self) -> &str {
        "database"
    }

    fn missing_configuration(&self) -> Vec<String> {
        match self.url {
            Some(_) => Vec::new(),
            None => vec!["DATABASE_URL".to_string()],
        }
    }

    async fn check(&self) -> Result<Option<serde_json::Value>, ProbeError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| ProbeError::Protocol("database URL not configured".into()))?;

        let db = self.connection(url).await?;
        db.ping().await?;

        let backend = db.get_database_backend();
        let started = Instant::now();
        let row = db
            .query_one(Statement::from_string(backend, "SELECT 1 AS probe"))
            .await?
            .ok_or_else(|| ProbeError::Protocol("SELECT 1 returned no rows".into()))?;
        let value: i32 = row.try_get("", "probe")?;
        if value != 1 {
            return Err(ProbeError::Protocol(format!("SELECT 1 returned {}", value)));
        }

        Ok(Some(json!({
            "backend": format!("{:?}", backend).to_lowercase(),
            "queryMs": started.elapsed().as_millis() as u64,
        })))
    }
}
