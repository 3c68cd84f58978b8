//! Neighbour detection under a distance tolerance.
//!
//! Each region's bounding box is grown by the tolerance and bulk-loaded into a
//! [`SpatialIndex`]. Querying the index with every grown box yields a cheap
//! candidate superset; only those candidates pay for an exact polygon
//! distance. Two regions become neighbours when that distance is at most the
//! tolerance, and the link is always recorded in both directions.

use crate::compute::spatial::{SpatialIndex, envelope, expand_rect, geometry_distance};
use crate::error::{CompactnessError, Result};
use crate::region::RegionCollection;
use log::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Record every neighbour pair in `collection` whose geometries lie within
/// `tolerance` of each other. Returns the number of unordered pairs found.
///
/// Existing neighbour links are kept; the pass only adds. Candidates are
/// tested on the rayon pool when the `parallel` feature is enabled, as in
/// [`find_parents`](crate::compute::hierarchy::find_parents).
pub fn find_neighbours(collection: &mut RegionCollection, tolerance: f64) -> Result<usize> {
    find_neighbours_with(collection, tolerance, true)
}

/// As [`find_neighbours`], choosing whether to use the rayon pool. Both paths
/// give identical results.
pub fn find_neighbours_with(
    collection: &mut RegionCollection,
    tolerance: f64,
    parallel: bool,
) -> Result<usize> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(CompactnessError::InvalidInput(format!(
            "Neighbour tolerance must be finite and non-negative, got: {}",
            tolerance
        )));
    }

    let mut index = SpatialIndex::new();
    for (i, region) in collection.iter().enumerate() {
        if let Some(rect) = envelope(&region.geometry) {
            index.insert_deferred(expand_rect(&rect, tolerance), i);
        }
    }
    index.build();

    let pairs = neighbour_pairs(collection, &index, tolerance, parallel);
    debug!(
        "Neighbour pass: {} regions indexed, {} pairs within {}",
        index.len(),
        pairs.len(),
        tolerance
    );

    for &(a, b) in &pairs {
        collection.regions[a].neighbours.insert(b);
        collection.regions[b].neighbours.insert(a);
    }

    Ok(pairs.len())
}

/// Unordered `(low, high)` pairs within tolerance, sorted.
fn neighbour_pairs(
    collection: &RegionCollection,
    index: &SpatialIndex<usize>,
    tolerance: f64,
    parallel: bool,
) -> Vec<(usize, usize)> {
    let entries: Vec<_> = index.entries().collect();

    let scan = |entry: &&crate::compute::spatial::IndexedEnvelope<usize>| {
        let a = entry.value;
        index
            .query(&entry.rect())
            .into_iter()
            // Each pair shows up from both ends; test it once, and never
            // against itself.
            .filter(|&b| b > a)
            .filter(|&b| {
                geometry_distance(&collection.regions[a].geometry, &collection.regions[b].geometry)
                    <= tolerance
            })
            .map(|b| (a, b))
            .collect::<Vec<_>>()
    };

    #[cfg(feature = "parallel")]
    let mut pairs: Vec<(usize, usize)> = if parallel {
        entries.par_iter().flat_map_iter(scan).collect()
    } else {
        entries.iter().flat_map(scan).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let mut pairs: Vec<(usize, usize)> = {
        let _ = parallel;
        entries.iter().flat_map(scan).collect()
    };

    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use geo::polygon;

    fn square(x: f64, y: f64) -> Region {
        Region::from_polygon(polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
        ])
    }

    /// Row of unit squares: 0 and 1 share an edge, 2 sits 0.5 away from 1,
    /// 3 is far away.
    fn row() -> RegionCollection {
        vec![
            square(0.0, 0.0),
            square(1.0, 0.0),
            square(2.5, 0.0),
            square(10.0, 0.0),
        ]
        .into_iter()
        .collect()
    }

    fn neighbours(collection: &RegionCollection, i: usize) -> Vec<usize> {
        collection.regions[i].neighbours.iter().copied().collect()
    }

    #[test]
    fn test_zero_tolerance_requires_contact() {
        let mut regions = row();
        let pairs = find_neighbours(&mut regions, 0.0).unwrap();
        assert_eq!(pairs, 1);
        assert_eq!(neighbours(&regions, 0), vec![1]);
        assert_eq!(neighbours(&regions, 1), vec![0]);
        assert!(neighbours(&regions, 2).is_empty());
    }

    #[test]
    fn test_tolerance_bridges_gap() {
        let mut regions = row();
        find_neighbours(&mut regions, 0.5).unwrap();
        assert_eq!(neighbours(&regions, 1), vec![0, 2]);
        assert_eq!(neighbours(&regions, 2), vec![1]);
        assert!(neighbours(&regions, 3).is_empty());
    }

    #[test]
    fn test_never_self_neighbour() {
        let mut regions = row();
        find_neighbours(&mut regions, 100.0).unwrap();
        for (i, region) in regions.iter().enumerate() {
            assert!(!region.neighbours.contains(&i));
            assert_eq!(region.neighbours.len(), 3);
        }
    }

    #[test]
    fn test_corner_touch_counts() {
        let mut regions: RegionCollection =
            vec![square(0.0, 0.0), square(1.0, 1.0)].into_iter().collect();
        find_neighbours(&mut regions, 0.0).unwrap();
        assert_eq!(neighbours(&regions, 0), vec![1]);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut regions = row();
        assert!(find_neighbours(&mut regions, -1.0).is_err());
    }

    #[test]
    fn test_default_entry_point_matches_sequential() {
        let mut default = row();
        let mut sequential = row();
        find_neighbours(&mut default, 0.5).unwrap();
        find_neighbours_with(&mut sequential, 0.5, false).unwrap();
        assert_eq!(default, sequential);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let mut sequential = row();
        let mut parallel = row();
        find_neighbours_with(&mut sequential, 0.5, false).unwrap();
        find_neighbours_with(&mut parallel, 0.5, true).unwrap();
        assert_eq!(sequential, parallel);
    }
}
