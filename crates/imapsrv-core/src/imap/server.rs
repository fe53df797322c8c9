//! IMAP Server
//!
//! Thin TCP front end: accepts connections, reads command lines and writes
//! back the responses produced by each connection's session.

use super::parser::ImapParser;
use super::response::{Response, UNTAGGED};
use super::session::ImapSession;

use anyhow::Result;
use imapsrv_common::config::ImapConfig;
use imapsrv_storage::Mailstore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// IMAP Server
pub struct ImapServer {
    config: ImapConfig,
    mailstore: Arc<dyn Mailstore>,
}

impl ImapServer {
    /// Create a new IMAP server
    pub fn new(config: ImapConfig, mailstore: Arc<dyn Mailstore>) -> Self {
        Self { config, mailstore }
    }

    /// Start the IMAP server
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        info!("IMAP server listening on {}", self.config.bind);
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let limiter = Arc::new(Semaphore::new(self.config.max_connections));

        loop {
            match listener.accept().await {
                Ok((mut stream, addr)) => {
                    let permit = match limiter.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            warn!("Connection limit reached, refusing {}", addr);
                            let _ = stream
                                .write_all(Response::bye("Too many connections").as_bytes())
                                .await;
                            continue;
                        }
                    };

                    let mailstore = self.mailstore.clone();
                    let timeout = idle_timeout(&self.config);

                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, addr, mailstore, timeout).await {
                            error!("Connection error from {}: {}", addr, e);
                        }
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }

    /// Handle a single IMAP connection
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        mailstore: Arc<dyn Mailstore>,
        timeout: Duration,
    ) -> Result<()> {
        let (reader, writer) = stream.into_split();
        let session = ImapSession::new(mailstore);
        info!(session = %session.id, "New IMAP connection from {}", addr);

        Self::run_session(BufReader::new(reader), writer, session, timeout).await
    }

    /// Drive one session over a line-oriented stream until it closes
    pub async fn run_session<R, W>(
        mut reader: R,
        mut writer: W,
        mut session: ImapSession,
        timeout: Duration,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        writer.write_all(Response::greeting().as_bytes()).await?;
        writer.flush().await?;

        let mut line = String::new();

        loop {
            line.clear();

            match tokio::time::timeout(timeout, reader.read_line(&mut line)).await {
                Ok(Ok(0)) => {
                    info!(session = %session.id, "Connection closed by client");
                    break;
                }
                Ok(Ok(_)) => {
                    debug!(session = %session.id, "Received: {}", line.trim_end());

                    let response = match ImapParser::parse(&line) {
                        Some(cmd) => {
                            debug!(session = %session.id, command = cmd.command.name(), "Executing");
                            cmd.execute(&mut session).await
                        }
                        None => Response::bad(UNTAGGED, "Invalid command"),
                    };

                    debug!(
                        session = %session.id,
                        tag = response.tag(),
                        status = %response.status(),
                        "Sending response"
                    );
                    writer.write_all(response.to_wire().as_bytes()).await?;
                    writer.flush().await?;

                    if response.closes() {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    error!(session = %session.id, "Read error: {}", e);
                    break;
                }
                Err(_) => {
                    warn!(
                        session = %session.id,
                        last_activity = %session.last_activity,
                        "Connection timeout"
                    );
                    writer
                        .write_all(Response::bye("Connection timeout").as_bytes())
                        .await?;
                    writer.flush().await?;
                    break;
                }
            }
        }

        let duration = chrono::Utc::now() - session.started_at;
        info!(
            session = %session.id,
            duration_secs = duration.num_seconds(),
            "IMAP connection closed"
        );
        Ok(())
    }
}

fn idle_timeout(config: &ImapConfig) -> Duration {
    Duration::from_secs((config.timeout_minutes.max(1) as u64).saturating_mul(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imap::testing::RecordingMailstore;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;

    async fn converse(input: &str) -> String {
        let session = ImapSession::new(Arc::new(RecordingMailstore::sample()));
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        client_write.write_all(input.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();

        ImapServer::run_session(
            BufReader::new(server_read),
            server_write,
            session,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        output
    }

    #[tokio::test]
    async fn test_session_transcript() {
        let output = converse(
            "a1 LOGIN test secret\r\n\
             a2 LIST \"\" %\r\n\
             a3 LOGOUT\r\n\
             a4 NOOP\r\n",
        )
        .await;

        assert_eq!(
            output,
            "* OK IMAP4rev1 Service Ready\r\n\
             a1 OK LOGIN completed\r\n\
             * LIST (\\HasNoChildren) \"/\" INBOX\r\n\
             * LIST (\\HasChildren) \"/\" Work\r\n\
             * LIST (\\HasChildren) \"/\" Archive\r\n\
             a2 OK LIST completed\r\n\
             * BYE IMAP4rev1 Server logging out\r\n\
             a3 OK LOGOUT completed\r\n"
        );
    }

    #[tokio::test]
    async fn test_invalid_line() {
        let output = converse("garbage\r\n").await;
        assert_eq!(
            output,
            "* OK IMAP4rev1 Service Ready\r\n* BAD Invalid command\r\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout() {
        let session = ImapSession::new(Arc::new(RecordingMailstore::sample()));
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, _client_write) = tokio::io::split(client);

        ImapServer::run_session(
            BufReader::new(server_read),
            server_write,
            session,
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        assert!(output.ends_with("* BYE Connection timeout\r\n"));
    }

    #[test]
    fn test_idle_timeout_from_config() {
        let config = ImapConfig {
            timeout_minutes: 2,
            ..Default::default()
        };
        assert_eq!(idle_timeout(&config), Duration::from_secs(120));

        let config = ImapConfig {
            timeout_minutes: 0,
            ..Default::default()
        };
        assert_eq!(idle_timeout(&config), Duration::from_secs(60));

        let config = ImapConfig {
            timeout_minutes: i64::MAX,
            ..Default::default()
        };
        assert_eq!(idle_timeout(&config), Duration::from_secs(u64::MAX));
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let config = ImapConfig {
            bind: "127.0.0.1:0".to_string(),
            max_connections: 1,
            ..Default::default()
        };
        let server = ImapServer::new(config, Arc::new(RecordingMailstore::sample()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move { server.serve(listener).await });

        let first = TcpStream::connect(addr).await.unwrap();
        let mut first = BufReader::new(first);
        let mut greeting = String::new();
        first.read_line(&mut greeting).await.unwrap();
        assert_eq!(greeting, "* OK IMAP4rev1 Service Ready\r\n");

        let mut second = TcpStream::connect(addr).await.unwrap();
        let mut refused = String::new();
        second.read_to_string(&mut refused).await.unwrap();
        assert_eq!(refused, "* BYE Too many connections\r\n");

        drop(first);
        handle.abort();
    }
}
