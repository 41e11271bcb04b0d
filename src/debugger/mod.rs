//! The debugger abstraction: a small capability interface consumed by the
//! session engine. The actual native debugging library (process control,
//! breakpoints, register access) is an external collaborator and is not
//! implemented here; [`mock::MockDebugger`] is an in-memory stand-in used
//! by tests and the engine's own unit tests.

pub mod mock;
pub mod process;

use crate::error::DebuggerError;
use crate::session::types::{Event, Frame};

/// Operations any debugger backend must support. Implementations use
/// interior mutability (the session engine shares one `Arc<dyn Debugger>`
/// between the request thread and the event thread); per §5 of the
/// design, lifecycle operations and `wait()` never run concurrently in
/// practice, but the trait cannot express that statically, so the lock
/// discipline lives inside each implementation.
pub trait Debugger: Send + Sync {
    /// Spawn `exec` with `args` in `cwd` (defaulting to the current
    /// directory when `None`).
    fn launch(&self, exec: &str, args: &[String], cwd: Option<&str>) -> Result<(), DebuggerError>;

    /// Attach to an already-running process.
    fn attach(&self, pid: i32) -> Result<(), DebuggerError>;

    /// Resume the given thread (or the default thread, when the backend
    /// has no per-thread granularity).
    fn continue_thread(&self, tid: u32) -> Result<(), DebuggerError>;

    /// Kill the debuggee.
    fn terminate(&self) -> Result<(), DebuggerError>;

    /// Detach without killing the debuggee.
    fn detach(&self) -> Result<(), DebuggerError>;

    /// Block until the next normalized event is available.
    fn wait(&self) -> Result<Event, DebuggerError>;

    /// Known thread ids, in a stable order.
    fn threads(&self) -> Vec<u32>;

    /// Frame 0 of the given thread.
    fn frame(&self, tid: u32) -> Result<Frame, DebuggerError>;
}
