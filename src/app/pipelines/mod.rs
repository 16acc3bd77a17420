pub mod dedupe_pipeline;
pub mod export_pipeline;
pub mod sort;
pub mod sync_pipeline;

pub use dedupe_pipeline::{DedupeOptions, DedupePipeline};
pub use export_pipeline::{ExportOptions, ExportPipeline};
pub use sort::{sort_collection, SortOptions, SortSummary};
pub use sync_pipeline::{destination_name, resolve_destination, Destination, SyncPipeline};
