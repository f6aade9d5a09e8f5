//! Versioning: the persisted build counter, the base version of record, and
//! stamping a new version into the project's manifests.

mod counter;
mod ledger;
mod stamp;

pub use counter::{COUNTER_FILE, CounterStore, FileCounter, MemoryCounter};
pub use ledger::{VersionLedger, VersionRecord, read_base_version};
pub use stamp::{StampReport, VersionStamper, replace_line_value};
