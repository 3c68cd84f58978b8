//! Batch spatial relationships and bounded compactness scores for polygonal regions.
//!
//! ```rust
//! use compactness::{Analysis, AnalysisConfig, Region, RegionCollection};
//! use geo::polygon;
//!
//! let mut precincts: RegionCollection = vec![
//!     Region::from_polygon(polygon![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 5.0, y: 10.0), (x: 0.0, y: 10.0)]),
//!     Region::from_polygon(polygon![(x: 5.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 5.0, y: 10.0)]),
//! ]
//! .into_iter()
//! .collect();
//! let mut districts: RegionCollection = vec![Region::from_polygon(
//!     polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
//! )]
//! .into_iter()
//! .collect();
//!
//! let analysis = Analysis::new(AnalysisConfig::default())?;
//! let summary = analysis.run(&mut precincts, &mut districts)?;
//! assert_eq!(summary.neighbour_pairs, 1);
//! assert!(precincts.regions[0].neighbours.contains(&1));
//! # Ok::<(), compactness::CompactnessError>(())
//! ```

pub mod analysis;
pub mod compute;
pub mod config;
pub mod error;
pub mod region;

pub use analysis::{Analysis, AnalysisSummary};
pub use config::AnalysisConfig;
pub use error::{CollectionRole, CompactnessError, Result};
pub use region::{
    EXTCHILD, EXTCHILD_FALSE, EXTCHILD_TRUE, MISSING_SCORE, Region, RegionCollection,
    WeightedLink,
};

pub use compute::adjacency::find_neighbours;
pub use compute::geojson::{read_geojson, read_geojson_file, to_geojson};
pub use compute::hierarchy::{find_parents, link_children};
pub use compute::report::{scores_to_csv, scores_to_json};
pub use compute::scores::{ScorePipeline, ScoreRegistry, compute_scores};
pub use compute::spatial::SpatialIndex;
pub use compute::wkt::{read_wkt, read_wkt_file, to_wkt};

pub use geo::{MultiPolygon, Polygon, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Analysis, AnalysisConfig, CompactnessError, Result};

    pub use crate::{Region, RegionCollection, WeightedLink};

    pub use crate::compute::scores::{AREA_UNCERTAINTY, CONVEX_HULL, REOCK};

    pub use crate::{read_geojson, read_wkt, scores_to_csv, scores_to_json};

    pub use geo::{MultiPolygon, Polygon, Rect};
}
