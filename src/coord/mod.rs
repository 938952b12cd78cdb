//! Commit arbitration core
//!
//! Layered bottom-up: the committers table, the decision kernel over it, the
//! dispatcher that serializes kernel access, and the client facade.

pub mod client;
pub mod dispatcher;
pub mod kernel;
pub mod table;
pub mod types;

pub use client::*;
pub use dispatcher::*;
pub use types::*;
