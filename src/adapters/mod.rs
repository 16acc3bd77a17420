// Adapters layer: concrete implementations for external systems.

pub mod instapaper;
pub mod notion;
pub mod oauth1;
pub mod storage;
