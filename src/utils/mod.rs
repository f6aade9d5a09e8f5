//! Small helpers shared by the acquisition and packaging stages.

pub mod fs;
