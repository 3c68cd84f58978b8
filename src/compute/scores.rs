//! Bounded compactness scores and the pipeline that computes them.
//!
//! A score is a plain function of a subunit and the reference region it is
//! bounded by ("PTB": part-to-border). Functions are looked up by name once
//! per run through a [`ScoreRegistry`]; the built-in set is available as
//! [`BUILTIN_SCORES`] and new names can be registered on a clone of it.
//!
//! ```rust
//! use compactness::compute::scores::{ScorePipeline, CONVEX_HULL};
//! use compactness::{Region, RegionCollection};
//! use geo::polygon;
//!
//! let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
//! let mut subunits: RegionCollection = vec![Region::from_polygon(square.clone())].into_iter().collect();
//! let border: RegionCollection = vec![Region::from_polygon(square)].into_iter().collect();
//!
//! ScorePipeline::default()
//!     .compute(&mut subunits, &border, None, &[CONVEX_HULL.to_string()])?;
//! let score = subunits.regions[0].score(CONVEX_HULL).unwrap();
//! assert!(score > 0.999 && score <= 1.0);
//! # Ok::<(), compactness::CompactnessError>(())
//! ```

use crate::compute::spatial::{area_including_holes, boundary_ring, intersection_area};
use crate::compute::validation::{index_by_key, require_join_attribute};
use crate::error::{CollectionRole, CompactnessError, Result};
use crate::region::{EXTCHILD, EXTCHILD_FALSE, MISSING_SCORE, Region, RegionCollection};
use geo::{Area, BooleanOps, ConvexHull};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const CONVEX_HULL: &str = "CvxHullPTB";
pub const REOCK: &str = "ReockPTB";
pub const AREA_UNCERTAINTY: &str = "AreaUncert";

/// Score name list entry meaning "every registered score".
pub const ALL_SCORES: &str = "all";

/// Value the Reock score returns until the enclosing-circle ratio exists.
pub const REOCK_PLACEHOLDER: f64 = 1.0;

/// Parameters shared by every score function in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreContext {
    /// Half-width of boundary rings, in input units.
    pub border_padding: f64,
    /// Points per full circle when buffering.
    pub buffer_segments: usize,
}

impl Default for ScoreContext {
    fn default() -> Self {
        Self {
            border_padding: 1000.0,
            buffer_segments: 36,
        }
    }
}

/// `(subunit, reference region, context) -> score`.
pub type ScoreFn = fn(&Region, &Region, &ScoreContext) -> f64;

/// Convex-hull compactness bounded by the reference border.
///
/// Area of the subunit, hole rings added in, over the area of its convex
/// hull clipped to the border. Ratios above 1 come from approximation error
/// and are floored to exactly 1. A zero clipped hull area yields
/// [`MISSING_SCORE`].
pub fn score_convex_hull(subunit: &Region, border: &Region, _ctx: &ScoreContext) -> f64 {
    let area = area_including_holes(&subunit.geometry);
    let hull_area = intersection_area(&subunit.geometry.convex_hull(), &border.geometry);

    let ratio = area / hull_area;
    if !ratio.is_finite() {
        warn!(
            "Convex hull score undefined: area {} over clipped hull area {}",
            area, hull_area
        );
        return MISSING_SCORE;
    }
    ratio.min(1.0)
}

/// Reock compactness bounded by the reference border.
///
/// Not implemented: always [`REOCK_PLACEHOLDER`].
pub fn score_reock(_subunit: &Region, _border: &Region, _ctx: &ScoreContext) -> f64 {
    REOCK_PLACEHOLDER
}

/// Uncertainty of the area near a shared border.
///
/// A subunit the hierarchy pass marked `EXTCHILD = "F"` cannot straddle its
/// parent's border and scores 0. Otherwise the boundary rings of the subunit
/// and the border are intersected, which bounds where uncertainty can occur.
/// Reducing that band to the subunit/border symmetric difference is not done
/// yet, so the score is [`MISSING_SCORE`].
pub fn score_border_area_uncertainty(subunit: &Region, border: &Region, ctx: &ScoreContext) -> f64 {
    if subunit.property(EXTCHILD) == Some(EXTCHILD_FALSE) {
        return 0.0;
    }

    let subunit_ring = boundary_ring(&subunit.geometry, ctx.border_padding, ctx.buffer_segments);
    let border_ring = boundary_ring(&border.geometry, ctx.border_padding, ctx.buffer_segments);
    let shared = subunit_ring.intersection(&border_ring);
    debug!(
        "Border ring overlap of {} for uncertainty score",
        shared.unsigned_area()
    );

    // TODO: xor subunit and border, intersect with `shared`, return its area.
    MISSING_SCORE
}

/// Name to score function lookup.
#[derive(Debug, Clone, Default)]
pub struct ScoreRegistry {
    scores: BTreeMap<String, ScoreFn>,
}

impl ScoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(CONVEX_HULL, score_convex_hull);
        registry.register(REOCK, score_reock);
        registry.register(AREA_UNCERTAINTY, score_border_area_uncertainty);
        registry
    }

    /// Add or replace a score.
    pub fn register(&mut self, name: impl Into<String>, score: ScoreFn) {
        self.scores.insert(name.into(), score);
    }

    pub fn get(&self, name: &str) -> Option<ScoreFn> {
        self.scores.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scores.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.scores.keys().cloned().collect()
    }

    /// Expand `requested` into the score functions to run.
    ///
    /// An empty list, or the single entry `"all"`, selects every registered
    /// score. Unknown names are dropped silently.
    pub fn resolve(&self, requested: &[String]) -> Vec<(String, ScoreFn)> {
        let all = requested.is_empty() || (requested.len() == 1 && requested[0] == ALL_SCORES);
        if all {
            return self
                .scores
                .iter()
                .map(|(name, score)| (name.clone(), *score))
                .collect();
        }

        requested
            .iter()
            .filter_map(|name| match self.get(name) {
                Some(score) => Some((name.clone(), score)),
                None => {
                    debug!("Skipping unregistered score '{}'", name);
                    None
                }
            })
            .collect()
    }
}

/// The built-in scores, resolved once.
pub static BUILTIN_SCORES: Lazy<ScoreRegistry> = Lazy::new(ScoreRegistry::builtin);

/// Result of one scoring run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreStats {
    /// Names actually computed.
    pub scores: Vec<String>,
    /// Subunits scored.
    pub regions: usize,
    /// Whether subunits were joined to superunits by attribute.
    pub joined: bool,
}

/// Computes named scores for subunits against their reference regions.
#[derive(Debug, Clone)]
pub struct ScorePipeline {
    registry: ScoreRegistry,
    context: ScoreContext,
    parallel: bool,
}

impl Default for ScorePipeline {
    fn default() -> Self {
        Self::new(BUILTIN_SCORES.clone(), ScoreContext::default())
    }
}

impl ScorePipeline {
    pub fn new(registry: ScoreRegistry, context: ScoreContext) -> Self {
        Self {
            registry,
            context,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn registry(&self) -> &ScoreRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ScoreContext {
        &self.context
    }

    /// Score every subunit.
    ///
    /// With no join key, or exactly one superunit, every subunit is scored
    /// against the first superunit. Otherwise each subunit is scored against
    /// the superunit whose `join_key` attribute matches its own. Join
    /// problems (a missing attribute on either side, a duplicated
    /// superunit key, a subunit value with no superunit) fail the call
    /// before any score is written.
    pub fn compute(
        &self,
        subunits: &mut RegionCollection,
        superunits: &RegionCollection,
        join_key: Option<&str>,
        score_names: &[String],
    ) -> Result<ScoreStats> {
        if superunits.is_empty() {
            return Err(CompactnessError::EmptyCollection(CollectionRole::Superunits));
        }

        let selected = self.registry.resolve(score_names);
        let join_key = join_key.filter(|key| !key.is_empty());

        let references: Vec<usize> = match join_key {
            Some(key) if superunits.len() > 1 => match_references(subunits, superunits, key)?,
            _ => vec![0; subunits.len()],
        };
        let joined = join_key.is_some() && superunits.len() > 1;

        let context = &self.context;
        let score_one = |(subunit, &reference): (&mut Region, &usize)| {
            let border = &superunits.regions[reference];
            for (name, score) in &selected {
                let value = score(subunit, border, context);
                subunit.scores.insert(name.clone(), value);
            }
        };

        #[cfg(feature = "parallel")]
        if self.parallel {
            subunits
                .regions
                .par_iter_mut()
                .zip(references.par_iter())
                .for_each(score_one);
        } else {
            subunits
                .regions
                .iter_mut()
                .zip(references.iter())
                .for_each(score_one);
        }

        #[cfg(not(feature = "parallel"))]
        subunits
            .regions
            .iter_mut()
            .zip(references.iter())
            .for_each(score_one);

        let stats = ScoreStats {
            scores: selected.into_iter().map(|(name, _)| name).collect(),
            regions: subunits.len(),
            joined,
        };
        info!(
            "Scored {} subunits with {:?}{}",
            stats.regions,
            stats.scores,
            if joined { " (joined)" } else { "" }
        );
        Ok(stats)
    }
}

/// Position of each subunit's reference superunit, matched on `key`.
fn match_references(
    subunits: &RegionCollection,
    superunits: &RegionCollection,
    key: &str,
) -> Result<Vec<usize>> {
    require_join_attribute(subunits, key, CollectionRole::Subunits)?;
    let by_key = index_by_key(superunits, key)?;

    subunits
        .iter()
        .enumerate()
        .map(|(index, subunit)| {
            subunit
                .property(key)
                .and_then(|value| by_key.get(value).copied())
                .ok_or(CompactnessError::UnknownRegion {
                    collection: CollectionRole::Subunits,
                    index,
                })
        })
        .collect()
}

/// Score with the built-in registry and default context.
pub fn compute_scores(
    subunits: &mut RegionCollection,
    superunits: &RegionCollection,
    join_key: Option<&str>,
    score_names: &[String],
) -> Result<ScoreStats> {
    ScorePipeline::default().compute(subunits, superunits, join_key, score_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::EXTCHILD_TRUE;
    use geo::{MultiPolygon, Polygon, polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]
    }

    fn l_shape() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ]
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_convex_hull_score() {
        let subunit = Region::from_polygon(l_shape());
        let border = Region::from_polygon(rect(-10.0, -10.0, 10.0, 10.0));
        let score = score_convex_hull(&subunit, &border, &ScoreContext::default());
        assert!((score - 3.0 / 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_convex_hull_score_clipped_by_border() {
        // Clipping the hull to the border can push the raw ratio over 1.
        let subunit = Region::from_polygon(l_shape());
        let border = Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0));
        let score = score_convex_hull(&subunit, &border, &ScoreContext::default());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_convex_hull_score_outside_border_is_missing() {
        let subunit = Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0));
        let border = Region::from_polygon(rect(5.0, 5.0, 6.0, 6.0));
        let score = score_convex_hull(&subunit, &border, &ScoreContext::default());
        assert_eq!(score, MISSING_SCORE);
    }

    #[test]
    fn test_reock_placeholder() {
        let region = Region::from_polygon(l_shape());
        assert_eq!(
            score_reock(&region, &region, &ScoreContext::default()),
            REOCK_PLACEHOLDER
        );
    }

    #[test]
    fn test_uncertainty_zero_for_internal_child() {
        let subunit = Region::new(MultiPolygon::new(vec![l_shape()]))
            .with_property(EXTCHILD, EXTCHILD_FALSE);
        let border = Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0));
        let score = score_border_area_uncertainty(&subunit, &border, &ScoreContext::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_uncertainty_sentinel_for_external_child() {
        let subunit = Region::from_polygon(rect(0.0, 0.0, 10.0, 10.0))
            .with_property(EXTCHILD, EXTCHILD_TRUE);
        let border = Region::from_polygon(rect(5.0, 0.0, 15.0, 10.0));
        let ctx = ScoreContext {
            border_padding: 1.0,
            buffer_segments: 16,
        };
        assert_eq!(
            score_border_area_uncertainty(&subunit, &border, &ctx),
            MISSING_SCORE
        );
    }

    #[test]
    fn test_resolve_expands_all() {
        let registry = ScoreRegistry::builtin();
        assert_eq!(registry.resolve(&[]).len(), 3);
        assert_eq!(registry.resolve(&names(&["all"])).len(), 3);

        let picked = registry.resolve(&names(&[CONVEX_HULL, "Nonexistent"]));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, CONVEX_HULL);
    }

    #[test]
    fn test_register_custom_score() {
        fn area(subunit: &Region, _: &Region, _: &ScoreContext) -> f64 {
            subunit.geometry.unsigned_area()
        }

        let mut registry = BUILTIN_SCORES.clone();
        registry.register("Area", area);
        let pipeline = ScorePipeline::new(registry, ScoreContext::default());

        let mut subunits: RegionCollection =
            vec![Region::from_polygon(l_shape())].into_iter().collect();
        let border: RegionCollection = vec![Region::from_polygon(rect(0.0, 0.0, 2.0, 2.0))]
            .into_iter()
            .collect();
        pipeline
            .compute(&mut subunits, &border, None, &names(&["Area"]))
            .unwrap();
        assert_eq!(subunits.regions[0].score("Area"), Some(3.0));
    }

    #[test]
    fn test_global_reference_when_single_superunit() {
        let mut subunits: RegionCollection = vec![
            Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0)),
            Region::from_polygon(l_shape()),
        ]
        .into_iter()
        .collect();
        // No ID attribute anywhere: the join key is ignored with one superunit.
        let superunits: RegionCollection = vec![Region::from_polygon(rect(-5.0, -5.0, 5.0, 5.0))]
            .into_iter()
            .collect();

        let stats =
            compute_scores(&mut subunits, &superunits, Some("ID"), &names(&[CONVEX_HULL]))
                .unwrap();
        assert!(!stats.joined);
        let square = subunits.regions[0].score(CONVEX_HULL).unwrap();
        let l = subunits.regions[1].score(CONVEX_HULL).unwrap();
        assert!(square > 0.999 && square <= 1.0);
        assert!((l - 3.0 / 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_superunits_rejected() {
        let mut subunits: RegionCollection =
            vec![Region::from_polygon(l_shape())].into_iter().collect();
        let err = compute_scores(&mut subunits, &RegionCollection::default(), None, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            CompactnessError::EmptyCollection(CollectionRole::Superunits)
        ));
    }

    #[test]
    fn test_unmatched_join_value_fails_before_scoring() {
        let mut subunits: RegionCollection = vec![
            Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0)).with_property("ID", "1"),
            Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0)).with_property("ID", "9"),
        ]
        .into_iter()
        .collect();
        let superunits: RegionCollection = vec![
            Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0)).with_property("ID", "1"),
            Region::from_polygon(rect(0.0, 0.0, 1.0, 1.0)).with_property("ID", "2"),
        ]
        .into_iter()
        .collect();

        let err = compute_scores(&mut subunits, &superunits, Some("ID"), &[]).unwrap_err();
        assert!(matches!(err, CompactnessError::UnknownRegion { index: 1, .. }));
        assert!(subunits.iter().all(|r| r.scores.is_empty()));
    }
}
