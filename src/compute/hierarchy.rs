//! Parent/child links between two region collections.
//!
//! A superunit becomes a parent of a subunit when it covers at least
//! `cutoff` of the subunit's area. Full containment is decided by an exact
//! topological test, never by the area ratio: the boolean intersection snaps
//! coordinates, so at projected magnitudes a contained subunit can come out
//! a few millionths short of 1. Subunits are independent of each other:
//! each one reads the shared superunit index and geometry, and writes only its
//! own `EXTCHILD` attribute and `parents` list. That disjoint write set is
//! what lets the pass run on the rayon pool without locks.

use crate::compute::spatial::{SpatialIndex, intersection_area};
use crate::error::{CollectionRole, CompactnessError, Result};
use crate::region::{
    EXTCHILD, EXTCHILD_FALSE, EXTCHILD_TRUE, Region, RegionCollection, WeightedLink,
};
use geo::{Area, Contains};
use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Outcome of a parent pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyStats {
    /// Parent links recorded across all subunits.
    pub links: usize,
    /// Subunits with at least one partial parent.
    pub external_children: usize,
    /// Subunits with no parent above the cutoff.
    pub orphans: usize,
}

/// Attach weighted parent links from `subunits` into `superunits`.
///
/// `tolerance` is reserved for tolerance-based matching and is not read by
/// the exact-area test. `cutoff` must lie in `(0, 1]`. Subunits are processed
/// on the rayon pool when the `parallel` feature is enabled.
pub fn find_parents(
    subunits: &mut RegionCollection,
    superunits: &RegionCollection,
    tolerance: f64,
    cutoff: f64,
) -> Result<HierarchyStats> {
    find_parents_with(subunits, superunits, tolerance, cutoff, true)
}

/// As [`find_parents`], choosing whether to use the rayon pool. Both paths
/// give identical results.
pub fn find_parents_with(
    subunits: &mut RegionCollection,
    superunits: &RegionCollection,
    tolerance: f64,
    cutoff: f64,
    parallel: bool,
) -> Result<HierarchyStats> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(CompactnessError::InvalidInput(format!(
            "Parent tolerance must be finite and non-negative, got: {}",
            tolerance
        )));
    }
    if !(cutoff > 0.0 && cutoff <= 1.0) {
        return Err(CompactnessError::InvalidInput(format!(
            "Parent cutoff must be in (0, 1], got: {}",
            cutoff
        )));
    }

    let mut index = SpatialIndex::new();
    for (i, superunit) in superunits.iter().enumerate() {
        index.insert_geometry_deferred(&superunit.geometry, i);
    }
    index.build();
    debug!(
        "Parent pass: {} subunits against {} indexed superunits",
        subunits.len(),
        index.len()
    );

    let assign = |subunit: &mut Region| assign_parents(subunit, superunits, &index, cutoff);

    #[cfg(feature = "parallel")]
    if parallel {
        subunits.regions.par_iter_mut().for_each(assign);
    } else {
        subunits.regions.iter_mut().for_each(assign);
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = parallel;
        subunits.regions.iter_mut().for_each(assign);
    }

    let stats = subunits
        .iter()
        .fold(HierarchyStats::default(), |mut stats, subunit| {
            stats.links += subunit.parents.len();
            if subunit.is_external_child() == Some(true) {
                stats.external_children += 1;
            }
            if subunit.parents.is_empty() {
                stats.orphans += 1;
            }
            stats
        });
    debug!(
        "Parent pass: {} links, {} external children, {} orphans",
        stats.links, stats.external_children, stats.orphans
    );

    Ok(stats)
}

fn assign_parents(
    subunit: &mut Region,
    superunits: &RegionCollection,
    index: &SpatialIndex<usize>,
    cutoff: f64,
) {
    subunit
        .properties
        .insert(EXTCHILD.to_string(), EXTCHILD_FALSE.to_string());

    let mut candidates = index.query_geometry(&subunit.geometry);
    // Tree order is arbitrary; scan in collection order so the first full
    // match is well defined.
    candidates.sort_unstable();

    let area = subunit.geometry.unsigned_area();
    if area == 0.0 && !candidates.is_empty() {
        warn!("Subunit with zero area has no meaningful containment ratio");
        return;
    }

    for candidate in candidates {
        let superunit = &superunits.regions[candidate].geometry;
        if superunit.contains(&subunit.geometry) {
            // Full containment is exclusive: stop at the first one.
            subunit.parents.push(WeightedLink::new(candidate, 1.0));
            break;
        }

        let ratio = (intersection_area(&subunit.geometry, superunit) / area).min(1.0);
        if ratio >= cutoff {
            subunit
                .properties
                .insert(EXTCHILD.to_string(), EXTCHILD_TRUE.to_string());
            subunit.parents.push(WeightedLink::new(candidate, ratio));
        }
    }
}

/// Mirror every subunit's parent links into its parents' `children` lists.
///
/// Children are appended in subunit order. Returns the number of links
/// written.
pub fn link_children(
    subunits: &RegionCollection,
    superunits: &mut RegionCollection,
) -> Result<usize> {
    for subunit in subunits.iter() {
        if let Some(link) = subunit
            .parents
            .iter()
            .find(|link| link.index >= superunits.len())
        {
            return Err(CompactnessError::UnknownRegion {
                collection: CollectionRole::Superunits,
                index: link.index,
            });
        }
    }

    let mut written = 0;
    for (child, subunit) in subunits.iter().enumerate() {
        for link in &subunit.parents {
            superunits.regions[link.index]
                .children
                .push(WeightedLink::new(child, link.weight));
            written += 1;
        }
    }

    Ok(written)
}
