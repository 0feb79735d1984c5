use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

pub type SmtpResult<T> = Result<T, SmtpError>;

pub struct Email {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait SmtpPort: Send + Sync {
    async fn send(&self, email: Email) -> SmtpResult<()>;
}
