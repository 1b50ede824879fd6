//! # tessera-runtime
//!
//! The application boundary. [`TesseraRuntime`] is constructed once at
//! startup, owns the container store, spatial index, verification mark
//! manager and judge pool, and is passed by reference to whoever needs it.
//! There is no global instance.

pub mod ask;
pub mod export;
pub mod listing;
pub mod retriever;
pub mod runtime;

pub use ask::{AskOptions, AskOutcome};
pub use export::{ExportFormat, ExportSummary};
pub use listing::{Page, PageRequest, TileFilter};
pub use retriever::SpatialRetriever;
pub use runtime::TesseraRuntime;
