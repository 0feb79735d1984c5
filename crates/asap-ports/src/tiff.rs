use async_trait::async_trait;
use camino::Utf8Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TiffError {
    #[error("append failed for {0}")]
    AppendFailed(String),
    #[error("render-from-text failed: {0}")]
    RenderFailed(String),
}

pub type TiffResult<T> = Result<T, TiffError>;

/// TIFF append/render port. Callers retry append with exponential backoff
/// (up to 5 tries); this trait only performs a single attempt.
#[async_trait]
pub trait TiffPort: Send + Sync {
    async fn append_page(&self, base: &Utf8Path, page: &Utf8Path) -> TiffResult<()>;
    async fn render_text_page(&self, text: &str, output: &Utf8Path) -> TiffResult<()>;
}
