//! Loading and profiling of tabular data.
//!
//! [`logic`] holds the loader (`io`), the per-column statistics
//! (`profiling`) and the profile assembly (`analysis`).

pub mod logic;

pub use logic::{Dataset, Profile, load, profile};
