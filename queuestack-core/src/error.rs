//! Queue service error codes and the error type returned by every operation

use thiserror::Error;

/// Result alias used across the queue crates
pub type Result<T> = std::result::Result<T, QueueError>;

/// Queue service error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Common
    AuthenticationFailed,
    InvalidResourceName,
    InvalidMetadata,
    OutOfRangeInput,
    RequestBodyTooLarge,
    InvalidXmlDocument,
    ServerBusy,

    // Queue specific
    QueueNotFound,
    QueueAlreadyExists,
    MessageNotFound,
    PopReceiptMismatch,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::InvalidResourceName => "InvalidResourceName",
            Self::InvalidMetadata => "InvalidMetadata",
            Self::OutOfRangeInput => "OutOfRangeInput",
            Self::RequestBodyTooLarge => "RequestBodyTooLarge",
            Self::InvalidXmlDocument => "InvalidXmlDocument",
            Self::ServerBusy => "ServerBusy",
            Self::QueueNotFound => "QueueNotFound",
            Self::QueueAlreadyExists => "QueueAlreadyExists",
            Self::MessageNotFound => "MessageNotFound",
            Self::PopReceiptMismatch => "PopReceiptMismatch",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::AuthenticationFailed => 403,
            Self::QueueNotFound | Self::MessageNotFound => 404,
            Self::QueueAlreadyExists => 409,
            Self::RequestBodyTooLarge => 413,
            Self::InvalidResourceName
            | Self::InvalidMetadata
            | Self::OutOfRangeInput
            | Self::InvalidXmlDocument
            | Self::PopReceiptMismatch => 400,
            Self::ServerBusy => 503,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a queue service call
///
/// Every operation of the queue client reports failures through this type,
/// whether the service rejected the request or the call never reached it.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue does not exist: {0}")]
    QueueNotFound(String),

    #[error("Queue already exists with different metadata: {0}")]
    QueueAlreadyExists(String),

    #[error("Message does not exist: {queue}/{message_id}")]
    MessageNotFound { queue: String, message_id: String },

    /// The pop-receipt presented is not the one issued by the most recent
    /// dequeue, or the lease it proved has already run out.
    #[error("Lease expired or pop receipt mismatch for message {queue}/{message_id}")]
    LeaseExpiredOrMismatch { queue: String, message_id: String },

    #[error("Invalid resource name: {0}")]
    InvalidResourceName(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Value out of range for {parameter}: {message}")]
    OutOfRangeInput { parameter: String, message: String },

    #[error("Request body too large: {size} bytes exceeds {limit}")]
    RequestBodyTooLarge { size: usize, limit: usize },

    #[error("Invalid XML document: {0}")]
    InvalidXmlDocument(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl QueueError {
    pub fn out_of_range(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OutOfRangeInput {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::QueueNotFound(_) => ErrorCode::QueueNotFound,
            Self::QueueAlreadyExists(_) => ErrorCode::QueueAlreadyExists,
            Self::MessageNotFound { .. } => ErrorCode::MessageNotFound,
            Self::LeaseExpiredOrMismatch { .. } => ErrorCode::PopReceiptMismatch,
            Self::InvalidResourceName(_) => ErrorCode::InvalidResourceName,
            Self::InvalidMetadata(_) => ErrorCode::InvalidMetadata,
            Self::OutOfRangeInput { .. } => ErrorCode::OutOfRangeInput,
            Self::RequestBodyTooLarge { .. } => ErrorCode::RequestBodyTooLarge,
            Self::InvalidXmlDocument(_) => ErrorCode::InvalidXmlDocument,
            Self::AuthenticationFailed(_) => ErrorCode::AuthenticationFailed,
            Self::Transport(_) => ErrorCode::ServerBusy,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code().http_status()
    }

    /// True when the caller's lease on a message is no longer valid
    pub fn is_lease_error(&self) -> bool {
        matches!(self, Self::LeaseExpiredOrMismatch { .. })
    }

    /// True for failures that may succeed when the same call is issued again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
