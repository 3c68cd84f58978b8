//! Analysis configuration.
//!
//! Every field has a serde default, so a configuration file only needs to name
//! the settings it changes. Values are checked by [`AnalysisConfig::validate`],
//! which the loaders and [`crate::Analysis::new`] call for you.

use crate::error::{CompactnessError, Result};
use serde::de::Error;

/// Settings for one batch analysis run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Maximum distance between two regions for them to count as neighbours.
    #[serde(default)]
    pub neighbour_tolerance: f64,

    /// Distance tolerance for parent matching. Reserved: the exact-area
    /// containment test does not read it yet.
    #[serde(default)]
    pub parent_tolerance: f64,

    /// Minimum share of a subunit's area a superunit must cover to become
    /// one of its parents.
    #[serde(default = "AnalysisConfig::default_parent_cutoff")]
    pub parent_cutoff: f64,

    /// Half-width of the boundary ring used by the border uncertainty score,
    /// in the linear unit of the input coordinates.
    #[serde(default = "AnalysisConfig::default_border_padding")]
    pub border_padding: f64,

    /// Points per full circle for round buffer joins.
    #[serde(default = "AnalysisConfig::default_buffer_segments")]
    pub buffer_segments: usize,

    /// Attribute joining subunits to superunits. `None` scores every
    /// subunit against the first superunit.
    #[serde(default)]
    pub join_key: Option<String>,

    /// Score names to compute. Empty, or just `"all"`, means every
    /// registered score.
    #[serde(default)]
    pub scores: Vec<String>,

    /// Run the neighbour, parent and scoring passes on the rayon worker pool.
    #[serde(default = "AnalysisConfig::default_parallel")]
    pub parallel: bool,
}

impl AnalysisConfig {
    const fn default_parent_cutoff() -> f64 {
        0.5
    }

    const fn default_border_padding() -> f64 {
        1000.0
    }

    const fn default_buffer_segments() -> usize {
        36
    }

    const fn default_parallel() -> bool {
        true
    }

    pub fn with_neighbour_tolerance(mut self, tolerance: f64) -> Self {
        self.neighbour_tolerance = tolerance;
        self
    }

    pub fn with_parent_tolerance(mut self, tolerance: f64) -> Self {
        self.parent_tolerance = tolerance;
        self
    }

    pub fn with_parent_cutoff(mut self, cutoff: f64) -> Self {
        self.parent_cutoff = cutoff;
        self
    }

    pub fn with_border_padding(mut self, padding: f64) -> Self {
        self.border_padding = padding;
        self
    }

    pub fn with_buffer_segments(mut self, segments: usize) -> Self {
        self.buffer_segments = segments;
        self
    }

    pub fn with_join_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.join_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_scores<I, S>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scores = scores.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The join key, treating an empty string like no key at all.
    pub fn join_key(&self) -> Option<&str> {
        self.join_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.neighbour_tolerance.is_finite() || self.neighbour_tolerance < 0.0 {
            return Err(format!(
                "Neighbour tolerance must be finite and non-negative, got: {}",
                self.neighbour_tolerance
            ));
        }

        if !self.parent_tolerance.is_finite() || self.parent_tolerance < 0.0 {
            return Err(format!(
                "Parent tolerance must be finite and non-negative, got: {}",
                self.parent_tolerance
            ));
        }

        if !(self.parent_cutoff > 0.0 && self.parent_cutoff <= 1.0) {
            return Err(format!(
                "Parent cutoff must be in (0, 1], got: {}",
                self.parent_cutoff
            ));
        }

        if !self.border_padding.is_finite() || self.border_padding <= 0.0 {
            return Err(format!(
                "Border padding must be finite and positive, got: {}",
                self.border_padding
            ));
        }

        if self.buffer_segments < 3 {
            return Err(format!(
                "Buffer segments must be at least 3, got: {}",
                self.buffer_segments
            ));
        }

        Ok(())
    }

    /// Validate, wrapping the message in the crate error type.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(CompactnessError::InvalidConfig)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: AnalysisConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            neighbour_tolerance: 0.0,
            parent_tolerance: 0.0,
            parent_cutoff: Self::default_parent_cutoff(),
            border_padding: Self::default_border_padding(),
            buffer_segments: Self::default_buffer_segments(),
            join_key: None,
            scores: Vec::new(),
            parallel: Self::default_parallel(),
        }
    }
}
