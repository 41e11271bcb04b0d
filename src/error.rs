//! Error taxonomy for the session core.
//!
//! [`AliceError`] covers the server-wide kinds from the error handling
//! design: malformed frames, schema violations, unknown commands, state
//! machine violations, debugger backend failures, and unrecoverable faults.
//! [`DebuggerError`] is the smaller, backend-facing error type returned by
//! the [`crate::debugger::Debugger`] capability interface; the session
//! engine folds it into `AliceError::DebuggerBackend` at the boundary.

use std::io;

/// Errors surfaced by the protocol/session core.
#[derive(Debug, thiserror::Error)]
pub enum AliceError {
    /// Malformed transport frame: bad `Content-Length`, non-UTF8 JSON body,
    /// truncated line.
    #[error("protocol framing error: {0}")]
    ProtocolFraming(String),

    /// A required field was missing or had the wrong shape.
    #[error("protocol schema error: {0}")]
    ProtocolSchema(String),

    /// The command named in a request is not in the adapter's table.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A request was valid but not legal in the current session state.
    #[error("state violation: {0}")]
    StateViolation(String),

    /// The debugger backend rejected or failed an operation.
    #[error("debugger backend error: {0}")]
    DebuggerBackend(String),

    /// An unrecoverable internal fault; the process must exit after
    /// logging it.
    #[error("fatal error: {0}")]
    Fatal(String),

    /// Transport I/O failure, folded into framing errors at the call site
    /// unless the context calls for `Fatal`.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// JSON (de)serialization failure in the DAP adapter.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AliceError {
    /// Whether this error should be reported as a per-request reply
    /// (anything but `Fatal`) or should terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AliceError::Fatal(_))
    }

    /// Render the human-readable message carried by any variant, without
    /// the `AliceError::Kind` wrapper, for embedding in a protocol reply.
    pub fn message(&self) -> String {
        match self {
            AliceError::ProtocolFraming(m)
            | AliceError::ProtocolSchema(m)
            | AliceError::UnknownCommand(m)
            | AliceError::StateViolation(m)
            | AliceError::DebuggerBackend(m)
            | AliceError::Fatal(m) => m.clone(),
            AliceError::Io(e) => e.to_string(),
            AliceError::Json(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AliceError>;

/// Errors returned by the [`crate::debugger::Debugger`] capability
/// interface.
#[derive(Debug, thiserror::Error)]
pub enum DebuggerError {
    /// `launch`: the executable path does not exist.
    #[error("target not found: {0}")]
    NotFound(String),

    /// `launch`/`attach`: the OS denied the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// `attach`: no process with the given pid.
    #[error("no such process: {0}")]
    NoSuchProcess(String),

    /// `continue_thread`/`terminate`/`detach`: called without an active
    /// process.
    #[error("debugger is not active")]
    NotActive,

    /// `frame`: no frame available for the requested thread.
    #[error("no frame available")]
    NoFrame,

    /// Any other backend-reported failure.
    #[error("backend error: {0}")]
    BackendError(String),
}

impl From<DebuggerError> for AliceError {
    fn from(e: DebuggerError) -> Self {
        AliceError::DebuggerBackend(e.to_string())
    }
}
