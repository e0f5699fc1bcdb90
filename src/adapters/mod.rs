//! Adapters implementing the domain ports.

pub mod invoker;
pub mod registry;
pub mod sqlite;
