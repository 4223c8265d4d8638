//! Building blocks of the `qdrop` command: service wiring and terminal rendering.

pub mod context;
pub mod report;

pub use context::CliContext;
