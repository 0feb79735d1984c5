//! FTP/SFTP session port. A session is opened once and reused across many
//! `put` calls so retry policy and session lifetime stay explicit, rather
//! than reconnecting per file.

use async_trait::async_trait;
use camino::Utf8Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FtpError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("put failed for {remote}: {reason}")]
    PutFailed { remote: String, reason: String },
    #[error("disconnected mid-session")]
    Disconnected,
}

pub type FtpResult<T> = Result<T, FtpError>;

#[async_trait]
pub trait FtpSession: Send + Sync {
    async fn put(&mut self, local: &Utf8Path, remote: &str) -> FtpResult<()>;
    async fn close(&mut self) -> FtpResult<()>;
}

#[async_trait]
pub trait FtpClient: Send + Sync {
    async fn open(&self) -> FtpResult<Box<dyn FtpSession>>;
}
