//! 2D box index over opaque payloads, backed by an R*-tree.
//!
//! Queries answer "which stored boxes intersect this box" and nothing more.
//! The result is a candidate set: every true intersection is returned, and
//! callers that need an exact predicate must filter the candidates with a
//! real geometric test.
//!
//! Entries reach the tree in one of two ways:
//!
//! 1. **Immediate**: [`SpatialIndex::insert`] adds one entry to the live tree.
//!    It is queryable at once, but many single inserts leave the tree less
//!    well balanced than a bulk load.
//!
//! 2. **Deferred**: [`SpatialIndex::insert_deferred`] buffers entries that stay
//!    invisible to queries until [`SpatialIndex::build`] bulk-loads them.
//!
//! ## Example
//!
//! ```rust
//! use compactness::compute::spatial::SpatialIndex;
//! use geo::{Rect, coord};
//!
//! let mut index = SpatialIndex::new();
//! index.insert_deferred(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }), 7);
//! assert!(index.query_point(geo::Point::new(0.5, 0.5)).is_empty());
//!
//! index.build();
//! assert_eq!(index.query_point(geo::Point::new(0.5, 0.5)), vec![7]);
//! ```

use geo::{BoundingRect, Point, Rect, coord};
use rstar::{AABB, RTree, RTreeObject};

/// A stored box and the payload it maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEnvelope<T> {
    pub envelope: AABB<[f64; 2]>,
    pub value: T,
}

impl<T> IndexedEnvelope<T> {
    pub fn new(rect: Rect<f64>, value: T) -> Self {
        Self {
            envelope: rect_to_aabb(&rect),
            value,
        }
    }

    pub fn rect(&self) -> Rect<f64> {
        aabb_to_rect(&self.envelope)
    }
}

impl<T> RTreeObject for IndexedEnvelope<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Box index mapping axis-aligned rectangles to payload values.
///
/// Read-only after [`build`](SpatialIndex::build): shared references can be
/// queried from any number of threads. The deferred buffer is mutated through
/// `&mut self` only, so setup happens on one thread.
pub struct SpatialIndex<T> {
    tree: RTree<IndexedEnvelope<T>>,
    deferred: Vec<IndexedEnvelope<T>>,
}

impl<T: Clone> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            deferred: Vec::new(),
        }
    }

    /// Bulk-load an index from `(box, value)` pairs in one step.
    pub fn bulk_load<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Rect<f64>, T)>,
    {
        let mut index = Self::new();
        for (rect, value) in entries {
            index.insert_deferred(rect, value);
        }
        index.build();
        index
    }

    /// Add one entry to the live tree.
    pub fn insert(&mut self, rect: Rect<f64>, value: T) {
        self.tree.insert(IndexedEnvelope::new(rect, value));
    }

    /// Buffer an entry for the next [`build`](Self::build).
    pub fn insert_deferred(&mut self, rect: Rect<f64>, value: T) {
        self.deferred.push(IndexedEnvelope::new(rect, value));
    }

    /// Buffer an entry keyed by a geometry's bounding box.
    ///
    /// Returns `false`, and stores nothing, for an empty geometry since it
    /// has no box.
    pub fn insert_geometry_deferred<G>(&mut self, geometry: &G, value: T) -> bool
    where
        G: BoundingRect<f64>,
    {
        let rect: Option<Rect<f64>> = geometry.bounding_rect().into();
        match rect {
            Some(rect) => {
                self.insert_deferred(rect, value);
                true
            }
            None => false,
        }
    }

    /// Rebuild the tree in one bulk load from the live entries plus the
    /// deferred buffer, then empty the buffer.
    pub fn build(&mut self) {
        let mut entries: Vec<IndexedEnvelope<T>> = self.tree.iter().cloned().collect();
        entries.append(&mut self.deferred);
        self.deferred = Vec::new();
        self.tree = RTree::bulk_load(entries);
    }

    /// Values whose stored box intersects `rect`, boundaries included.
    pub fn query(&self, rect: &Rect<f64>) -> Vec<T> {
        let envelope = rect_to_aabb(rect);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.value.clone())
            .collect()
    }

    pub fn query_point(&self, point: Point<f64>) -> Vec<T> {
        let rect = Rect::new(point.0, point.0);
        self.query(&rect)
    }

    /// Values whose stored box intersects the bounding box of `geometry`.
    /// An empty geometry matches nothing.
    pub fn query_geometry<G>(&self, geometry: &G) -> Vec<T>
    where
        G: BoundingRect<f64>,
    {
        let rect: Option<Rect<f64>> = geometry.bounding_rect().into();
        match rect {
            Some(rect) => self.query(&rect),
            None => Vec::new(),
        }
    }

    /// Every built entry, in tree order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexedEnvelope<T>> {
        self.tree.iter()
    }

    /// Number of queryable entries.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Number of entries waiting for the next build.
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }
}

impl<T: Clone> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("entries", &self.tree.size())
            .field("pending", &self.deferred.len())
            .finish()
    }
}

fn rect_to_aabb(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

fn aabb_to_rect(envelope: &AABB<[f64; 2]>) -> Rect<f64> {
    let lower = envelope.lower();
    let upper = envelope.upper();
    Rect::new(
        coord! { x: lower[0], y: lower[1] },
        coord! { x: upper[0], y: upper[1] },
    )
}
