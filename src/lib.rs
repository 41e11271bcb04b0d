//! `aliceserver`: a debugger front-end server. Speaks the Debug Adapter
//! Protocol and GDB/MI on stdio, translating both into a single
//! protocol-independent set of operations executed by a pluggable
//! [`debugger::Debugger`] backend.

pub mod adapter;
pub mod config;
pub mod dap;
pub mod debugger;
pub mod error;
pub mod mi;
pub mod session;
pub mod transport;
pub mod util;

pub use adapter::Adapter;
pub use error::{AliceError, Result};
