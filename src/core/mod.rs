pub mod columns;
pub mod dedupe;
pub mod etl;
pub mod flatten;
pub mod output;
pub mod source;

pub use crate::domain::model::{QueryPage, Record, RunMetadata, Table};
pub use crate::domain::ports::{Pipeline, Storage, Workspace};
pub use crate::utils::error::Result;
