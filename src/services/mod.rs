//! Integrations that can feed the `sync` command.

pub mod instapaper;
pub mod registry;

pub use registry::{ActionArgs, ActionFuture, ActionTable, Registry, Service};
