//! Core anchoring algorithms

pub mod geo_transform;
pub mod cluster_merge;

pub use geo_transform::{place, Placement};
pub use cluster_merge::merge_by_common_elements;
