//! Error types shared by the native library and the completion bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error type for completion-bridge operations
///
/// Lifecycle variants ([`is_fatal`](Self::is_fatal)) poison further use of the
/// runtime they were raised for. Every other variant describes the failure of
/// exactly one call and is delivered through that call's pending future.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The native execution engine could not be started
    #[error("runtime initialization failed: {0}")]
    RuntimeInitError(String),

    /// A call was issued before the runtime was initialized
    #[error("runtime is not initialized")]
    RuntimeNotInitialized,

    /// The runtime has been shut down and cannot serve calls
    #[error("runtime has been shut down")]
    RuntimeShutdownError,

    /// A lifecycle call that the current state does not permit
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidLifecycleTransition { from: String, to: String },

    /// The native entry point synchronously declined the call
    #[error("native call rejected")]
    NativeCallRejected,

    /// The native side reported completion without a result or error payload
    #[error("unexpected null result from native code")]
    UnexpectedNullResult,

    /// Malformed, duplicate or otherwise invalid callback invocation
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A payload could not be decoded as UTF-8 text
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The caller's input cannot be marshaled across the boundary
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The native side completed the call with an error payload
    #[error("native error: {0}")]
    NativeError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Internal error (caught panic, broken completion channel)
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Returns an error code suitable for FFI
    pub fn error_code(&self) -> u32 {
        match self {
            BridgeError::RuntimeInitError(_) => 1,
            BridgeError::RuntimeNotInitialized => 2,
            BridgeError::RuntimeShutdownError => 3,
            BridgeError::InvalidLifecycleTransition { .. } => 4,
            BridgeError::NativeCallRejected => 5,
            BridgeError::UnexpectedNullResult => 6,
            BridgeError::ProtocolViolation(_) => 7,
            BridgeError::DecodeError(_) => 8,
            BridgeError::InvalidInput(_) => 9,
            BridgeError::NativeError(_) => 10,
            BridgeError::ConfigError(_) => 11,
            BridgeError::Internal(_) => 12,
        }
    }

    /// Create an error from an error code and message (for FFI deserialization)
    pub fn from_code(code: u32, message: String) -> Self {
        match code {
            1 => BridgeError::RuntimeInitError(message),
            2 => BridgeError::RuntimeNotInitialized,
            3 => BridgeError::RuntimeShutdownError,
            4 => BridgeError::InvalidLifecycleTransition {
                from: String::new(),
                to: message,
            },
            5 => BridgeError::NativeCallRejected,
            6 => BridgeError::UnexpectedNullResult,
            7 => BridgeError::ProtocolViolation(message),
            8 => BridgeError::DecodeError(message),
            9 => BridgeError::InvalidInput(message),
            10 => BridgeError::NativeError(message),
            11 => BridgeError::ConfigError(message),
            _ => BridgeError::Internal(message),
        }
    }

    /// Text for the error buffer of a completion: `<code>:<detail>`
    pub fn to_wire(&self) -> String {
        format!("{}:{}", self.error_code(), self.detail())
    }

    /// Rebuild an error from completion error text
    ///
    /// Text without a known numeric code prefix is taken verbatim as a
    /// [`NativeError`](BridgeError::NativeError).
    pub fn from_wire(text: &str) -> Self {
        if let Some((code, detail)) = text.split_once(':') {
            if let Ok(code @ 1..=12) = code.parse::<u32>() {
                return Self::from_code(code, detail.to_string());
            }
        }
        BridgeError::NativeError(text.to_string())
    }

    fn detail(&self) -> String {
        match self {
            BridgeError::RuntimeInitError(message)
            | BridgeError::ProtocolViolation(message)
            | BridgeError::DecodeError(message)
            | BridgeError::InvalidInput(message)
            | BridgeError::NativeError(message)
            | BridgeError::ConfigError(message)
            | BridgeError::Internal(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Lifecycle failures that abort further bridge use
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::RuntimeInitError(_)
                | BridgeError::RuntimeShutdownError
                | BridgeError::InvalidLifecycleTransition { .. }
        )
    }

    /// Failures after which issuing the same call again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::NativeCallRejected)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::ConfigError(err.to_string())
    }
}

impl From<std::str::Utf8Error> for BridgeError {
    fn from(err: std::str::Utf8Error) -> Self {
        BridgeError::DecodeError(err.to_string())
    }
}

#[cfg(test)]
#[path = "error/error_tests.rs"]
mod error_tests;
