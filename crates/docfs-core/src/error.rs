/// Errors returned by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Database, collection or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store answered but refused the request.
    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Connection to the store failed.
    #[error("Connection to store '{store}' failed")]
    ConnectionFailed {
        store: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out")]
    Timeout { operation: String },

    /// The store's response could not be decoded.
    #[error("Malformed store response: {0}")]
    Decode(String),

    /// Other store-specific error.
    #[error("Store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Returns true if this error is transient and the operation may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionFailed { .. } | StoreError::Timeout { .. }
        )
    }
}

/// Errors surfaced by filesystem operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FsError {
    /// No such database, collection or document.
    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// Wrong depth for the operation, malformed payload, or bad input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A database or collection name failed the naming rules.
    #[error("{0}")]
    Validation(String),

    /// The store call failed for any reason other than absence.
    #[error("I/O error: {0}")]
    Io(String),

    /// The operation has no meaning for a document store.
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// No mount found for the given path.
    #[error("No mount found for path '{0}'. Check the mounts in your docfs.yaml.")]
    NoMount(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FsError {
    /// POSIX-style error code for the host filesystem layer.
    pub fn code(&self) -> &'static str {
        match self {
            FsError::NotFound(_) | FsError::NoMount(_) => "ENOENT",
            FsError::InvalidArgument(_) | FsError::Validation(_) | FsError::Config(_) => "EINVAL",
            FsError::Io(_) => "EIO",
            FsError::Unsupported(_) => "ENOSYS",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

impl From<StoreError> for FsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => FsError::NotFound(what),
            other => FsError::Io(other.to_string()),
        }
    }
}

impl From<docfs_config::ConfigError> for FsError {
    fn from(err: docfs_config::ConfigError) -> Self {
        FsError::Config(err.to_string())
    }
}
