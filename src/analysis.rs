//! End-to-end analysis over a subunit and a superunit collection.

use crate::compute::adjacency::find_neighbours_with;
use crate::compute::hierarchy::{HierarchyStats, find_parents_with, link_children};
use crate::compute::scores::{BUILTIN_SCORES, ScoreContext, ScorePipeline, ScoreStats};
use crate::compute::validation::{index_by_key, require_join_attribute, validate_regions};
use crate::config::AnalysisConfig;
use crate::error::{CollectionRole, CompactnessError, Result};
use crate::region::RegionCollection;
use log::info;

/// Counts from one [`Analysis::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisSummary {
    pub subunits: usize,
    pub superunits: usize,
    /// Unordered subunit neighbour pairs.
    pub neighbour_pairs: usize,
    pub parent_links: usize,
    pub external_children: usize,
    /// Score names written to every subunit.
    pub scores: Vec<String>,
}

/// Runs the neighbour, parent and scoring passes with one configuration.
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
    pipeline: ScorePipeline,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.check()?;

        let context = ScoreContext {
            border_padding: config.border_padding,
            buffer_segments: config.buffer_segments,
        };
        let pipeline =
            ScorePipeline::new(BUILTIN_SCORES.clone(), context).with_parallel(config.parallel);

        Ok(Self { config, pipeline })
    }

    /// Use a custom score pipeline, e.g. one with extra registered scores.
    pub fn with_pipeline(mut self, pipeline: ScorePipeline) -> Self {
        self.pipeline = pipeline.with_parallel(self.config.parallel);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Neighbour links within `neighbour_tolerance`. Returns the pair count.
    pub fn find_neighbours(&self, regions: &mut RegionCollection) -> Result<usize> {
        find_neighbours_with(
            regions,
            self.config.neighbour_tolerance,
            self.config.parallel,
        )
    }

    pub fn find_parents(
        &self,
        subunits: &mut RegionCollection,
        superunits: &RegionCollection,
    ) -> Result<HierarchyStats> {
        find_parents_with(
            subunits,
            superunits,
            self.config.parent_tolerance,
            self.config.parent_cutoff,
            self.config.parallel,
        )
    }

    pub fn score(
        &self,
        subunits: &mut RegionCollection,
        superunits: &RegionCollection,
    ) -> Result<ScoreStats> {
        self.pipeline.compute(
            subunits,
            superunits,
            self.config.join_key(),
            &self.config.scores,
        )
    }

    /// Neighbours, parents, child links, then scores.
    ///
    /// Geometry and join attributes are checked up front, so a bad input
    /// fails before either collection is touched.
    pub fn run(
        &self,
        subunits: &mut RegionCollection,
        superunits: &mut RegionCollection,
    ) -> Result<AnalysisSummary> {
        if superunits.is_empty() {
            return Err(CompactnessError::EmptyCollection(CollectionRole::Superunits));
        }
        validate_regions(&subunits.regions)?;
        validate_regions(&superunits.regions)?;
        if let Some(key) = self.config.join_key()
            && superunits.len() > 1
        {
            require_join_attribute(subunits, key, CollectionRole::Subunits)?;
            index_by_key(superunits, key)?;
        }

        let neighbour_pairs = self.find_neighbours(subunits)?;
        let hierarchy = self.find_parents(subunits, superunits)?;
        link_children(subunits, superunits)?;
        let scored = self.score(subunits, superunits)?;

        let summary = AnalysisSummary {
            subunits: subunits.len(),
            superunits: superunits.len(),
            neighbour_pairs,
            parent_links: hierarchy.links,
            external_children: hierarchy.external_children,
            scores: scored.scores,
        };
        info!(
            "Analysed {} subunits against {} superunits: {} neighbour pairs, {} parent links, {} external children",
            summary.subunits,
            summary.superunits,
            summary.neighbour_pairs,
            summary.parent_links,
            summary.external_children
        );
        Ok(summary)
    }
}
