//! The protocol adapter contract shared by the MI and DAP implementations.

use std::sync::Arc;

use crate::error::Result;
use crate::session::SessionEngine;

/// A component that speaks one client protocol and normalizes it to the
/// debugger abstraction through a [`SessionEngine`]. Owns its transport
/// exclusively; the session engine owns the debugger and the adapter.
pub trait Adapter {
    /// Adapter name as reported by `--list-adapters` and used in logs
    /// (`dap`, `mi2`, `mi3`, `mi4`).
    fn name(&self) -> &'static str;

    /// Drive the request loop to completion (until the session reaches
    /// `Closed`, or the transport is exhausted).
    fn run(self: Arc<Self>, engine: Arc<SessionEngine>) -> Result<()>;
}
