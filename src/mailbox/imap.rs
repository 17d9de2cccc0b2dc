//! IMAP mailbox over TLS.
//!
//! Speaks just enough IMAP4rev1 for the export: LOGIN, SELECT,
//! SEARCH UNSEEN, FETCH BODY.PEEK[], STORE +FLAGS (\Seen), LOGOUT.
//! Messages are fetched with PEEK so they stay unread until the pipeline
//! acknowledges them.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use rustls_pki_types::ServerName;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, MailboxError};
use crate::mailbox::{MailboxSource, MessageId};

// ── Configuration ───────────────────────────────────────────────────

/// Folder the gateway's notifications are filed into.
pub const DEFAULT_FOLDER: &str = "PayFast/Orders";

/// IMAP connection settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Folder to read, unquoted.
    pub folder: String,
    pub read_timeout: Duration,
}

impl ImapConfig {
    /// Build config from environment variables.
    /// Returns `Ok(None)` if `PAYFAST_IMAP_HOST` is not set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Ok(host) = std::env::var("PAYFAST_IMAP_HOST") else {
            return Ok(None);
        };

        let port = match std::env::var("PAYFAST_IMAP_PORT") {
            Ok(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "PAYFAST_IMAP_PORT".into(),
                message: format!("{e}"),
            })?,
            Err(_) => 993,
        };

        let username = std::env::var("PAYFAST_IMAP_USERNAME")
            .map_err(|_| ConfigError::MissingEnvVar("PAYFAST_IMAP_USERNAME".into()))?;
        let password = std::env::var("PAYFAST_IMAP_PASSWORD")
            .map_err(|_| ConfigError::MissingEnvVar("PAYFAST_IMAP_PASSWORD".into()))?;

        let folder =
            std::env::var("PAYFAST_IMAP_FOLDER").unwrap_or_else(|_| DEFAULT_FOLDER.to_string());

        Ok(Some(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            folder,
            read_timeout: Duration::from_secs(30),
        }))
    }
}

// ── Wire helpers ────────────────────────────────────────────────────

/// Quote a string for use as an IMAP quoted string.
pub fn quote_imap_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Byte count of a trailing `{n}` literal marker, if the line ends in one.
pub fn literal_len(line: &str) -> Option<usize> {
    let line = line.trim_end_matches(['\r', '\n']);
    let inner = line.strip_suffix('}')?;
    let open = inner.rfind('{')?;
    inner[open + 1..].parse().ok()
}

/// Sequence numbers from `* SEARCH` lines.
pub fn parse_search(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.strip_prefix("* SEARCH"))
        .flat_map(|rest| rest.split_whitespace().map(str::to_string))
        .collect()
}

/// A completed command: untagged lines, literal payloads, tagged status.
#[derive(Debug, Default)]
struct Reply {
    untagged: Vec<String>,
    literals: Vec<Vec<u8>>,
    status: String,
}

impl Reply {
    fn is_ok(&self) -> bool {
        self.status
            .split_whitespace()
            .nth(1)
            .is_some_and(|s| s.eq_ignore_ascii_case("OK"))
    }
}

type TlsStream = StreamOwned<ClientConnection, TcpStream>;

struct Session {
    tls: TlsStream,
    next_tag: u32,
}

impl Session {
    fn connect(config: &ImapConfig) -> Result<Self, MailboxError> {
        let connect_failed = |reason: String| MailboxError::ConnectFailed {
            host: config.host.clone(),
            reason,
        };

        let tcp = TcpStream::connect((config.host.as_str(), config.port))
            .map_err(|e| connect_failed(e.to_string()))?;
        tcp.set_read_timeout(Some(config.read_timeout))?;

        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = Arc::new(
            ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let server_name = ServerName::try_from(config.host.clone())
            .map_err(|e| connect_failed(e.to_string()))?;
        let conn = ClientConnection::new(tls_config, server_name)
            .map_err(|e| connect_failed(e.to_string()))?;

        let mut session = Self {
            tls: StreamOwned::new(conn, tcp),
            next_tag: 1,
        };

        let greeting = session.read_line()?;
        if !greeting.starts_with("* OK") && !greeting.starts_with("* PREAUTH") {
            return Err(connect_failed(format!("unexpected greeting: {}", greeting.trim_end())));
        }
        Ok(session)
    }

    fn read_line(&mut self) -> Result<String, MailboxError> {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            match self.tls.read(&mut byte) {
                Ok(0) => return Err(MailboxError::Protocol("connection closed".into())),
                Ok(_) => {
                    buf.push(byte[0]);
                    if buf.ends_with(b"\r\n") {
                        return Ok(String::from_utf8_lossy(&buf).into_owned());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn command(&mut self, cmd: &str) -> Result<Reply, MailboxError> {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;

        self.tls.write_all(format!("{tag} {cmd}\r\n").as_bytes())?;
        self.tls.flush()?;

        let tagged = format!("{tag} ");
        let mut reply = Reply::default();
        loop {
            let line = self.read_line()?;
            if line.starts_with(&tagged) {
                reply.status = line.trim_end().to_string();
                return Ok(reply);
            }
            if let Some(len) = literal_len(&line) {
                let mut payload = vec![0u8; len];
                self.tls.read_exact(&mut payload)?;
                reply.literals.push(payload);
            }
            reply.untagged.push(line);
        }
    }
}

// ── Mailbox ─────────────────────────────────────────────────────────

/// Unread order notifications in one IMAP folder.
pub struct ImapMailbox {
    config: ImapConfig,
    session: Session,
}

impl ImapMailbox {
    /// Connect, log in and select the configured folder.
    ///
    /// Any failure here is fatal for the run.
    pub fn connect(config: ImapConfig) -> Result<Self, MailboxError> {
        let mut session = Session::connect(&config)?;

        let login = session.command(&format!(
            "LOGIN {} {}",
            quote_imap_string(&config.username),
            quote_imap_string(config.password.expose_secret())
        ))?;
        if !login.is_ok() {
            return Err(MailboxError::AuthFailed {
                host: config.host.clone(),
                username: config.username.clone(),
            });
        }

        let select = session.command(&format!("SELECT {}", quote_imap_string(&config.folder)))?;
        if !select.is_ok() {
            return Err(MailboxError::FolderUnavailable {
                folder: config.folder.clone(),
                reason: select.status,
            });
        }

        info!(host = %config.host, folder = %config.folder, "Mailbox folder selected");
        Ok(Self { config, session })
    }

    /// Log out. Errors are only logged; the run's output is unaffected.
    pub fn logout(mut self) {
        if let Err(e) = self.session.command("LOGOUT") {
            debug!(host = %self.config.host, error = %e, "IMAP logout failed");
        }
    }
}

impl MailboxSource for ImapMailbox {
    fn name(&self) -> &str {
        "imap"
    }

    fn unread(&mut self) -> Result<Vec<MessageId>, MailboxError> {
        let reply = self.session.command("SEARCH UNSEEN")?;
        if !reply.is_ok() {
            return Err(MailboxError::SearchFailed(reply.status));
        }
        Ok(parse_search(&reply.untagged)
            .into_iter()
            .map(MessageId::new)
            .collect())
    }

    fn fetch(&mut self, id: &MessageId) -> Result<Vec<u8>, MailboxError> {
        let fetch_failed = |reason: String| MailboxError::FetchFailed {
            id: id.to_string(),
            reason,
        };

        // Transport errors come back as-is: the session is unusable after them.
        let reply = self.session.command(&format!("FETCH {id} BODY.PEEK[]"))?;
        if !reply.is_ok() {
            return Err(fetch_failed(reply.status));
        }
        reply
            .literals
            .into_iter()
            .next()
            .ok_or_else(|| fetch_failed("no message body in response".into()))
    }

    fn acknowledge(&mut self, id: &MessageId) -> Result<(), MailboxError> {
        let reply = self.session.command(&format!("STORE {id} +FLAGS (\\Seen)"))?;
        if !reply.is_ok() {
            warn!(id = %id, status = %reply.status, "Server refused \\Seen flag");
            return Err(MailboxError::AcknowledgeFailed {
                id: id.to_string(),
                reason: reply.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Quoting ─────────────────────────────────────────────────────

    #[test]
    fn quote_plain_folder() {
        assert_eq!(quote_imap_string("PayFast/Orders"), "\"PayFast/Orders\"");
    }

    #[test]
    fn quote_escapes_quotes_and_backslashes() {
        assert_eq!(quote_imap_string(r#"pa"ss\word"#), r#""pa\"ss\\word""#);
    }

    // ── Literals ────────────────────────────────────────────────────

    #[test]
    fn literal_len_from_fetch_line() {
        assert_eq!(literal_len("* 3 FETCH (BODY[] {1234}\r\n"), Some(1234));
    }

    #[test]
    fn literal_len_absent() {
        assert_eq!(literal_len("* 3 FETCH (FLAGS (\\Seen))\r\n"), None);
        assert_eq!(literal_len("A4 OK FETCH completed\r\n"), None);
        assert_eq!(literal_len("* 3 FETCH (BODY[] {abc}\r\n"), None);
    }

    // ── Search ──────────────────────────────────────────────────────

    #[test]
    fn search_collects_sequence_numbers() {
        let lines = vec!["* SEARCH 2 5 9\r\n".to_string()];
        assert_eq!(parse_search(&lines), vec!["2", "5", "9"]);
    }

    #[test]
    fn search_with_no_results() {
        let lines = vec!["* SEARCH\r\n".to_string()];
        assert!(parse_search(&lines).is_empty());
    }

    #[test]
    fn search_ignores_other_untagged_lines() {
        let lines = vec![
            "* 12 EXISTS\r\n".to_string(),
            "* SEARCH 4\r\n".to_string(),
        ];
        assert_eq!(parse_search(&lines), vec!["4"]);
    }

    // ── Replies ─────────────────────────────────────────────────────

    #[test]
    fn reply_status_ok_detection() {
        let ok = Reply {
            status: "A2 OK [READ-WRITE] SELECT completed".into(),
            ..Reply::default()
        };
        let no = Reply {
            status: "A2 NO Mailbox does not exist".into(),
            ..Reply::default()
        };
        assert!(ok.is_ok());
        assert!(!no.is_ok());
    }

    // ── Config ──────────────────────────────────────────────────────

    #[test]
    fn config_from_env_returns_none_when_no_host() {
        // SAFETY: no other test reads PAYFAST_IMAP_HOST.
        unsafe { std::env::remove_var("PAYFAST_IMAP_HOST") };
        assert!(ImapConfig::from_env().unwrap().is_none());
    }
}
