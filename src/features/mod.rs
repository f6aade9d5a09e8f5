//! Feature resolution.
//!
//! Turns the requested feature tokens and capability toggles into the
//! concrete, platform-filtered set of features a build enables. Resolution is
//! pure: it reads the catalog and the platform and touches nothing else.

mod catalog;
mod request;
mod resolve;

pub use catalog::{FeatureCatalog, FeatureDef, ResourceBundleDescriptor};
pub use request::{FeatureRequest, WILDCARD};
pub use resolve::{BuildMode, FeatureWarning, Resolution, ResolvedFeatureSet, resolve};
