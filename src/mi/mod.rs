//! GDB/MI adapter: value tree, line parser, and the [`MIAdapter`] itself.

pub mod adapter;
pub mod parser;
pub mod value;

pub use adapter::MIAdapter;
pub use value::MIValue;
