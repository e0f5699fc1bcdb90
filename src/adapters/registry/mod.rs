//! Agent contract registry adapters.

pub mod yaml;

pub use yaml::{builtin_contracts, YamlContractRegistry};
