//! Key-value cache probe (Redis).
//!
//! Writes a short-lived key, reads it back and deletes it. The connection is
//! cached between checks and discarded once the transport fails, so a
//! restarted server is reached again on the next check.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::credentials::redact_url;
use crate::probes::{Probe, ProbeError};

/// Seconds before an orphaned probe key expires on its own.
const PROBE_KEY_TTL_SECS: u64 = 10;

pub struct RedisProbe {
    url: Option<String>,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisProbe {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            connection: Mutex::new(None),
        }
    }

    /// Cached connection, or a fresh one. The flag is true when reused.
    async fn connection(&self, url: &str) -> Result<(MultiplexedConnection, bool), ProbeError> {
        let mut cached = self.connection.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok((conn.clone(), true));
        }

        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!(url = %redact_url(url), "Redis probe connected");
        *cached = Some(conn.clone());
        Ok((conn, false))
    }

    async fn discard_connection(&self) {
        self.connection.lock().await.take();
    }
}

fn lost_transport<T>(outcome: &Result<T, ProbeError>) -> bool {
    matches!(outcome, Err(ProbeError::Redis(e)) if is_transport_failure(e))
}

fn is_transport_failure(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped()
}

async fn round_trip(mut conn: MultiplexedConnection) -> Result<(), ProbeError> {
    let key = format!("health:probe:{}", Uuid::new_v4());
    let value = Uuid::new_v4().to_string();

    conn.set_ex::<_, _, ()>(&key, &value, PROBE_KEY_TTL_SECS).await?;
    let read_back: Option<String> = conn.get(&key).await?;
    conn.del::<_, ()>(&key).await?;

    if read_back.as_deref() != Some(value.as_str()) {
        return Err(ProbeError::Protocol(format!(
            "read-back mismatch for {}: got {:?}",
            key, read_back
        )));
    }
    Ok(())
}

#[async_trait]
impl Probe for RedisProbe {
    fn service(&self) -> &str {
        "redis"
    }

    fn missing_configuration(&self) -> Vec<String> {
        match self.url {
            Some(_) => Vec::new(),
            None => vec!["REDIS_URL".to_string()],
        }
    }

    async fn check(&self) -> Result<Option<serde_json::Value>, ProbeError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| ProbeError::Protocol("redis URL not configured".into()))?;
        let (conn, reused) = self.connection(url).await?;

        let mut outcome = round_trip(conn).await;
        if lost_transport(&outcome) {
            self.discard_connection().await;
            // A stale cached socket says nothing about the server itself.
            if reused {
                tracing::info!("Redis connection lost, reconnecting");
                let (conn, _) = self.connection(url).await?;
                outcome = round_trip(conn).await;
                if lost_transport(&outcome) {
                    self.discard_connection().await;
                }
            }
        }
        outcome?;

        Ok(Some(json!({ "roundTrip": "set-get-del" })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
    use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_unconfigured() {
        let probe = RedisProbe::new(None);
        assert_eq!(probe.missing_configuration(), vec!["REDIS_URL".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let probe = RedisProbe::new(Some("definitely not a url".to_string()));
        assert!(probe.missing_configuration().is_empty());
        let err = probe.check().await.unwrap_err();
        assert!(matches!(err, ProbeError::Redis(_)));
    }

    /// Minimal RESP server keeping values in memory. The first connection is
    /// closed after one full round trip; later connections stay open.
    async fn flaky_server() -> (u16, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();

        tokio::spawn(async move {
            let store = Arc::new(StdMutex::new(HashMap::<String, String>::new()));
            loop {
                let Ok((socket, _)) = listener.accept().await else { return };
                let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
                tokio::spawn(serve(socket, store.clone(), first));
            }
        });

        (port, accepted)
    }

    async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Vec<String>> {
        let mut header = String::new();
        if reader.read_line(&mut header).await.ok()? == 0 {
            return None;
        }
        let count: usize = header.trim_end().strip_prefix('*')?.parse().ok()?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let mut len = String::new();
            reader.read_line(&mut len).await.ok()?;
            let len: usize = len.trim_end().strip_prefix('$')?.parse().ok()?;
            let mut buf = vec![0; len + 2];
            reader.read_exact(&mut buf).await.ok()?;
            buf.truncate(len);
            args.push(String::from_utf8(buf).ok()?);
        }
        Some(args)
    }

    async fn serve(socket: TcpStream, store: Arc<StdMutex<HashMap<String, String>>>, close_after_del: bool) {
        let (read_half, mut write_half) = socket.into_split();
        let mut reader = BufReader::new(read_half);
        while let Some(args) = read_command(&mut reader).await {
            let name = args[0].to_ascii_uppercase();
            let reply = match name.as_str() {
                "SETEX" => {
                    store.lock().unwrap().insert(args[1].clone(), args[3].clone());
                    "+OK\r\n".to_string()
                }
                "GET" => match store.lock().unwrap().get(&args[1]) {
                    Some(v) => format!("${}\r\n{}\r\n", v.len(), v),
                    None => "$-1\r\n".to_string(),
                },
                "DEL" => {
                    store.lock().unwrap().remove(&args[1]);
                    ":1\r\n".to_string()
                }
                _ => "+OK\r\n".to_string(),
            };
            if write_half.write_all(reply.as_bytes()).await.is_err() {
                return;
            }
            if close_after_del && name == "DEL" {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_reconnects_after_server_drops_connection() {
        let (port, accepted) = flaky_server().await;
        let probe = RedisProbe::new(Some(format!("redis://127.0.0.1:{}", port)));

        probe.check().await.unwrap();
        assert_eq!(accepted.load(Ordering::SeqCst), 1);

        // Let the client observe the closed socket.
        tokio::time::sleep(Duration::from_millis(100)).await;

        for _ in 0..3 {
            let detail = probe.check().await.unwrap().unwrap();
            assert_eq!(detail["roundTrip"], "set-get-del");
        }
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let probe = RedisProbe::new(Some("redis://127.0.0.1:1".to_string()));
        let err = probe.check().await.unwrap_err();
        assert!(matches!(err, ProbeError::Redis(_)));
    }
}
