//! Agent invoker adapters.

pub mod mock;
pub mod process;

pub use mock::{MockInvoker, MockResponse};
pub use process::{terminate_pid, ProcessInvoker};
