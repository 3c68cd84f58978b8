//! Regions and the collections that own them.
//!
//! A [`RegionCollection`] is an arena: relationship links (neighbours,
//! parents, children) refer to other regions by their position in the owning
//! collection, never by reference. Positions are stable for the lifetime of a
//! run because regions are never removed during analysis.

use geo::algorithm::orient::{Direction, Orient};
use geo::{Coord, LineString, MapCoordsInPlace, MultiPolygon, Polygon};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute set on every subunit by the hierarchy pass.
pub const EXTCHILD: &str = "EXTCHILD";

/// `EXTCHILD` value for a subunit with at least one partial parent.
pub const EXTCHILD_TRUE: &str = "T";

/// `EXTCHILD` value for a subunit with no partial parent.
pub const EXTCHILD_FALSE: &str = "F";

/// Score value meaning "not computed".
pub const MISSING_SCORE: f64 = -9999.0;

/// A weighted link to a region in a sibling collection.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WeightedLink {
    pub index: usize,
    /// Containment ratio in `[0, 1]`.
    pub weight: f64,
}

impl WeightedLink {
    pub fn new(index: usize, weight: f64) -> Self {
        Self { index, weight }
    }

    /// True when the linked region fully contains the source region.
    pub fn is_full(&self) -> bool {
        self.weight == 1.0
    }
}

/// One polygonal feature with attributes, scores and relationship links.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub geometry: MultiPolygon<f64>,
    /// String-typed attributes. Numeric and boolean values are stringified by
    /// whoever builds the region.
    pub properties: BTreeMap<String, String>,
    pub scores: BTreeMap<String, f64>,
    /// Positions of neighbouring regions in the same collection.
    pub neighbours: BTreeSet<usize>,
    /// Links into the superunit collection.
    pub parents: Vec<WeightedLink>,
    /// Links into the subunit collection.
    pub children: Vec<WeightedLink>,
}

impl Region {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            properties: BTreeMap::new(),
            scores: BTreeMap::new(),
            neighbours: BTreeSet::new(),
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]))
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn score(&self, name: &str) -> Option<f64> {
        self.scores.get(name).copied()
    }

    /// Whether the hierarchy pass marked this region as straddling a parent's
    /// border. Regions the pass never saw report `None`.
    pub fn is_external_child(&self) -> Option<bool> {
        match self.property(EXTCHILD) {
            Some(EXTCHILD_TRUE) => Some(true),
            Some(EXTCHILD_FALSE) => Some(false),
            _ => None,
        }
    }

    pub fn hole_count(&self) -> usize {
        self.geometry.iter().map(|p| p.interiors().len()).sum()
    }

    pub fn polygon_count(&self) -> usize {
        self.geometry.0.len()
    }

    /// Reverse the vertex order of every ring.
    pub fn reverse(&mut self) {
        let polygons = self
            .geometry
            .iter()
            .map(|polygon| {
                Polygon::new(
                    reversed_ring(polygon.exterior()),
                    polygon.interiors().iter().map(reversed_ring).collect(),
                )
            })
            .collect();
        self.geometry = MultiPolygon::new(polygons);
    }

    /// Orient outer rings counter-clockwise and holes clockwise.
    pub fn correct_winding(&mut self) {
        self.geometry = self.geometry.orient(Direction::Default);
    }

    /// Convert coordinates from degrees to radians.
    pub fn to_radians(&mut self) {
        self.geometry.map_coords_in_place(|c| Coord {
            x: c.x.to_radians(),
            y: c.y.to_radians(),
        });
    }

    /// Convert coordinates from radians to degrees.
    pub fn to_degrees(&mut self) {
        self.geometry.map_coords_in_place(|c| Coord {
            x: c.x.to_degrees(),
            y: c.y.to_degrees(),
        });
    }
}

fn reversed_ring(ring: &LineString<f64>) -> LineString<f64> {
    LineString::from(ring.coords().rev().copied().collect::<Vec<_>>())
}

/// An ordered sequence of regions plus an opaque projection descriptor.
///
/// Position is identity: every relationship and scoring API addresses regions
/// by index into this collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionCollection {
    pub regions: Vec<Region>,
    /// Coordinate reference metadata, passed through untouched.
    pub projection: String,
}

impl RegionCollection {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions,
            projection: String::new(),
        }
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    pub fn push(&mut self, region: Region) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Region> {
        self.regions.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Region> {
        self.regions.iter_mut()
    }

    pub fn reverse(&mut self) {
        self.regions.iter_mut().for_each(Region::reverse);
    }

    pub fn correct_winding(&mut self) {
        self.regions.iter_mut().for_each(Region::correct_winding);
    }

    pub fn to_radians(&mut self) {
        self.regions.iter_mut().for_each(Region::to_radians);
    }

    pub fn to_degrees(&mut self) {
        self.regions.iter_mut().for_each(Region::to_degrees);
    }
}

impl FromIterator<Region> for RegionCollection {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RegionCollection {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
