//! Compute layer for region analysis.
//!
//! Everything here works on in-memory [`RegionCollection`](crate::RegionCollection)s:
//! - Spatial primitives and the bounding-box index
//! - Neighbour and parent/child passes
//! - Bounded compactness scores
//! - GeoJSON, WKT and tabular interchange

pub mod adjacency;
pub mod geojson;
pub mod hierarchy;
pub mod report;
pub mod scores;
pub mod spatial;
pub mod validation;
pub mod wkt;
