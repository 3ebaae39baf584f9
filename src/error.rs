use enough::StopReason;

/// Errors from surface creation, filling, encoding, and read-back.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HdrError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("encoder initialization failed: {0}")]
    SubsystemInit(String),

    #[error("allocation failed: {0}")]
    AllocationFailure(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("lock protocol violation: {0}")]
    LockProtocolViolation(&'static str),

    #[error("fill worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("encode failed: {0}")]
    EncodeFailure(String),

    #[error("commit failed: {0}")]
    CommitFailure(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl HdrError {
    /// Numeric code reported by the command-line front end as its exit status.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::SubsystemInit(_) => 3,
            Self::AllocationFailure(_) => 4,
            Self::LimitExceeded(_) => 5,
            Self::LockProtocolViolation(_) => 6,
            Self::WorkerPanicked { .. } => 7,
            Self::EncodeFailure(_) => 8,
            Self::CommitFailure(_) => 9,
            Self::Io(_) => 10,
            Self::UnrecognizedFormat | Self::InvalidHeader(_) | Self::UnexpectedEof => 11,
            Self::Cancelled(_) => 12,
        }
    }
}

impl From<StopReason> for HdrError {
    fn from(r: StopReason) -> Self {
        HdrError::Cancelled(r)
    }
}
