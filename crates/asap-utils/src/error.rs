use camino::Utf8PathBuf;

/// Pipeline-wide error taxonomy.
///
/// Variants map to the error categories a carrier integration needs to
/// distinguish: configuration mistakes are operator errors, data-shape
/// failures mean a document can't be trusted, transient I/O failures are
/// worth retrying, logical conflicts mean the data model is inconsistent,
/// and external-protocol failures originate outside the process.
#[derive(Debug, thiserror::Error)]
pub enum AsapError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed document {doc_id}: {reason}")]
    DataShape { doc_id: String, reason: String },

    #[error("transient I/O failure on {path}: {source}")]
    TransientIo {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logical conflict: {0}")]
    LogicalConflict(String),

    #[error("external protocol failure ({protocol}): {reason}")]
    ExternalProtocol { protocol: String, reason: String },

    #[error("record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AsapResult<T> = Result<T, AsapError>;
