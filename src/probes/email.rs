//! SMTP relay probe.
//!
//! Opens a TCP connection, expects the 220 greeting, exchanges EHLO and
//! quits. No mail is sent and no authentication is attempted.

use async_trait::async_trait;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::probes::{Probe, ProbeError};

/// Longest reply line accepted, CRLF included. RFC 5321 allows 512.
const MAX_REPLY_LINE: usize = 1024;
/// Most lines accepted in one multi-line reply.
const MAX_REPLY_LINES: usize = 64;

pub struct SmtpProbe {
    host: Option<String>,
    port: u16,
    helo_name: String,
}

/// One complete (possibly multi-line) SMTP reply.
#[derive(Debug, PartialEq, Eq)]
struct Reply {
    code: u16,
    lines: Vec<String>,
}

impl SmtpProbe {
    pub fn new(host: Option<String>, port: u16, helo_name: impl Into<String>) -> Self {
        Self {
            host,
            port,
            helo_name: helo_name.into(),
        }
    }
}

async fn read_reply<R>(reader: &mut BufReader<R>) -> Result<Reply, ProbeError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        if lines.len() == MAX_REPLY_LINES {
            return Err(ProbeError::Protocol(format!(
                "reply exceeds {} lines",
                MAX_REPLY_LINES
            )));
        }
        let mut line = String::new();
        let read = (&mut *reader)
            .take(MAX_REPLY_LINE as u64)
            .read_line(&mut line)
            .await?;
        if read == 0 {
            return Err(ProbeError::Protocol("connection closed mid-reply".into()));
        }
        if !line.ends_with('\n') {
            if read == MAX_REPLY_LINE {
                return Err(ProbeError::Protocol(format!(
                    "reply line exceeds {} bytes",
                    MAX_REPLY_LINE
                )));
            }
            return Err(ProbeError::Protocol("connection closed mid-reply".into()));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.len() < 3 || !line.is_char_boundary(3) {
            return Err(ProbeError::Protocol(format!("malformed reply line: {:?}", line)));
        }
        let code: u16 = line[..3]
            .parse()
            .map_err(|_| ProbeError::Protocol(format!("malformed reply code: {:?}", line)))?;
        let (separator, text) = match line.get(3..4) {
            Some(sep) => (sep, line.get(4..).unwrap_or("")),
            None => (" ", ""),
        };
        lines.push(text.to_string());
        if separator != "-" {
            return Ok(Reply { code, lines });
        }
    }
}

fn expect(reply: Reply, code: u16, stage: &str) -> Result<Reply, ProbeError> {
    if reply.code == code {
        Ok(reply)
    } else {
        Err(ProbeError::Protocol(format!(
            "{} rejected with {} {}",
            stage,
            reply.code,
            reply.lines.join(" ")
        )))
    }
}

#[async_trait]
impl Probe for SmtpProbe {
    fn service(&self) -> &str {
        "email"
    }

    fn missing_configuration(&self) -> Vec<String> {
        match self.host {
            Some(_) => Vec::new(),
            None => vec!["SMTP_HOST".to_string()],
        }
    }

    async fn check(&self) -> Result<Option<serde_json::Value>, ProbeError> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| ProbeError::Protocol("smtp host not configured".into()))?;

        let stream = TcpStream::connect((host, self.port)).await?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let greeting = expect(read_reply(&mut reader).await?, 220, "greeting")?;

        write_half
            .write_all(format!("EHLO {}\r\n", self.helo_name).as_bytes())
            .await?;
        let ehlo = expect(read_reply(&mut reader).await?, 250, "EHLO")?;

        write_half.write_all(b"QUIT\r\n").await?;
        if let Err(e) = read_reply(&mut reader).await {
            tracing::debug!(error = %e, "SMTP relay closed without QUIT reply");
        }

        Ok(Some(json!({
            "greeting": greeting.lines.first().cloned().unwrap_or_default(),
            "extensions": ehlo.lines.iter().skip(1).collect::<Vec<_>>(),
        })))
    }
}
