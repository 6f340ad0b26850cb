pub mod config;
pub mod errors;
pub mod json;
pub mod jumps;
pub mod locks;
pub mod models;
pub mod portals;
pub mod report;
pub mod source_index;
pub mod store;
pub mod symbols;
pub mod tables;

pub use config::ProjectPaths;
pub use errors::SyncError;
pub use jumps::sync_jumps;
pub use portals::sync_portals;
pub use report::{JumpSummary, PortalSummary, SkipReason};
