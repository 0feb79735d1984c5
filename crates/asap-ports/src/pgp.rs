use async_trait::async_trait;
use camino::Utf8Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgpError {
    #[error("encrypt failed for {0}")]
    EncryptFailed(String),
}

pub type PgpResult<T> = Result<T, PgpError>;

/// PGP encrypt is a single-attempt port: retry policy lives in the
/// orchestrator, which routes failures to `retrans/` after unpacking the
/// zip rather than retrying the encrypt itself.
#[async_trait]
pub trait PgpPort: Send + Sync {
    async fn encrypt(&self, input: &Utf8Path, output: &Utf8Path, recipient: &str) -> PgpResult<()>;
}
