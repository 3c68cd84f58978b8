//! Planar measurements over region geometry, built on the geo crate.
//!
//! All lengths and areas are in the linear unit of the input coordinates,
//! which are assumed to be projected. Ring areas are taken as absolute
//! values, so the results do not depend on winding direction.

use geo::algorithm::buffer::{Buffer, BufferStyle, LineJoin};
use geo::{
    Area, BooleanOps, BoundingRect, ConvexHull, Distance, Euclidean, Intersects, LineString,
    MultiPolygon, Point, Polygon, Rect, coord,
};

/// Vertices used to approximate a circle.
pub const CIRCLE_POINT_COUNT: usize = 1000;

/// Absolute area enclosed by a single ring.
pub fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Length of a single ring.
pub fn ring_perimeter(ring: &LineString<f64>) -> f64 {
    ring.lines()
        .map(|line| Euclidean.distance(line.start_point(), line.end_point()))
        .sum()
}

pub fn area_of_holes(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .iter()
        .flat_map(|polygon| polygon.interiors())
        .map(ring_area)
        .sum()
}

/// Outer-ring areas plus hole-ring areas.
///
/// A donut-shaped district is not penalised for its hole when this is the
/// numerator of a compactness ratio.
pub fn area_including_holes(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .iter()
        .map(|polygon| ring_area(polygon.exterior()))
        .sum::<f64>()
        + area_of_holes(geometry)
}

/// Outer-ring area minus hole area.
pub fn area_excluding_holes(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.unsigned_area()
}

pub fn perimeter_of_holes(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .iter()
        .flat_map(|polygon| polygon.interiors())
        .map(ring_perimeter)
        .sum()
}

/// Perimeter of the outer rings only.
pub fn perimeter_excluding_holes(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .iter()
        .map(|polygon| ring_perimeter(polygon.exterior()))
        .sum()
}

/// Perimeter of outer rings and hole rings together.
pub fn perimeter_including_holes(geometry: &MultiPolygon<f64>) -> f64 {
    perimeter_excluding_holes(geometry) + perimeter_of_holes(geometry)
}

/// Sum of the convex hull areas of each polygon's outer ring.
pub fn hull_area_of_outer_rings(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .iter()
        .map(|polygon| polygon.exterior().convex_hull().unsigned_area())
        .sum()
}

/// Sum of the convex hull areas of every hole ring.
pub fn hull_area_of_holes(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .iter()
        .flat_map(|polygon| polygon.interiors())
        .map(|ring| ring.convex_hull().unsigned_area())
        .sum()
}

/// The pair of hull vertices furthest apart, with their distance.
///
/// O(h²) over the h hull vertices, which are few compared to the polygon's.
fn hull_extremes(hull: &Polygon<f64>) -> Option<(Point<f64>, Point<f64>, f64)> {
    let vertices: Vec<Point<f64>> = hull.exterior().points().collect();
    let mut best: Option<(Point<f64>, Point<f64>, f64)> = None;

    for (i, a) in vertices.iter().enumerate() {
        for b in &vertices[i + 1..] {
            let dist = Euclidean.distance(*a, *b);
            if best.is_none_or(|(_, _, max)| dist > max) {
                best = Some((*a, *b, dist));
            }
        }
    }

    best
}

/// Maximum distance between two vertices of the geometry's convex hull.
/// Zero for an empty geometry.
pub fn diameter(geometry: &MultiPolygon<f64>) -> f64 {
    hull_extremes(&geometry.convex_hull())
        .map(|(_, _, dist)| dist)
        .unwrap_or(0.0)
}

/// Hull diameter of a single polygon's outer ring.
pub fn diameter_of_outer(polygon: &Polygon<f64>) -> f64 {
    hull_extremes(&polygon.exterior().convex_hull())
        .map(|(_, _, dist)| dist)
        .unwrap_or(0.0)
}

/// The two vertices realising [`diameter`].
pub fn most_distant_points(geometry: &MultiPolygon<f64>) -> Option<(Point<f64>, Point<f64>)> {
    hull_extremes(&geometry.convex_hull()).map(|(a, b, _)| (a, b))
}

/// A polygonal circle through the two most distant hull vertices, centred on
/// their midpoint.
pub fn bounding_circle_most_distant(
    geometry: &MultiPolygon<f64>,
    point_count: usize,
) -> Option<Polygon<f64>> {
    let (a, b) = most_distant_points(geometry)?;
    let centre = coord! { x: (a.x() + b.x()) / 2.0, y: (a.y() + b.y()) / 2.0 };
    let radius = Euclidean.distance(a, b) / 2.0;
    let step = -2.0 * std::f64::consts::PI / point_count.max(3) as f64;

    let ring: Vec<_> = (0..point_count.max(3))
        .map(|i| {
            let angle = step * i as f64;
            coord! {
                x: centre.x + radius * angle.cos(),
                y: centre.y + radius * angle.sin()
            }
        })
        .collect();

    Some(Polygon::new(LineString::from(ring), vec![]))
}

/// Area of the boolean intersection of two areal geometries.
pub fn intersection_area<A, B>(a: &A, b: &B) -> f64
where
    A: BooleanOps<Scalar = f64>,
    B: BooleanOps<Scalar = f64>,
{
    a.intersection(b).unsigned_area()
}

/// Grow (positive distance) or shrink (negative distance) a geometry with
/// round joins. `segments` is the number of points per full circle.
pub fn buffer(geometry: &MultiPolygon<f64>, distance: f64, segments: usize) -> MultiPolygon<f64> {
    let angle = 2.0 * std::f64::consts::PI / segments.max(3) as f64;
    let style = BufferStyle::new(distance).line_join(LineJoin::Round(angle));
    geometry.buffer_with_style(style)
}

/// Band of half-width `padding` straddling the geometry's boundary: the grown
/// geometry minus the shrunk one.
pub fn boundary_ring(geometry: &MultiPolygon<f64>, padding: f64, segments: usize) -> MultiPolygon<f64> {
    let grown = buffer(geometry, padding, segments);
    let shrunk = buffer(geometry, -padding, segments);
    grown.difference(&shrunk)
}

/// Minimum planar distance between two geometries; zero when they touch or
/// overlap.
pub fn geometry_distance(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    let mut min = f64::INFINITY;
    for pa in a.iter() {
        for pb in b.iter() {
            if pa.intersects(pb) {
                return 0.0;
            }
            min = min.min(Euclidean.distance(pa, pb));
        }
    }
    min
}

/// Bounding box of a geometry, `None` when it is empty.
pub fn envelope(geometry: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    geometry.bounding_rect()
}

/// Grow a box by `distance` on every side.
pub fn expand_rect(rect: &Rect<f64>, distance: f64) -> Rect<f64> {
    Rect::new(
        coord! { x: rect.min().x - distance, y: rect.min().y - distance },
        coord! { x: rect.max().x + distance, y: rect.max().y + distance },
    )
}
