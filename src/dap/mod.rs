//! The Debug Adapter Protocol adapter: JSON request/response/event shapes,
//! the fixed server capability table, and the [`DapAdapter`] itself.

pub mod adapter;
pub mod capabilities;
pub mod types;

pub use adapter::DapAdapter;
