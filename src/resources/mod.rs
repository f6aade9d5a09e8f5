//! Resource acquisition.
//!
//! Downloads each resolved feature's resource bundle, verifies it against
//! the published checksum manifest, and extracts the entries selected by the
//! bundle's include/exclude patterns into the staging directory.

mod acquire;
mod checksum;
mod extract;
mod fetch;
mod filter;

pub use acquire::{AcquiredResources, ResourceAcquirer, prepare_staging};
pub use checksum::{Checksum, ChecksumManifest};
pub use extract::extract_filtered;
pub use fetch::{Fetcher, HttpFetcher, StaticFetcher};
pub use filter::EntryFilter;
