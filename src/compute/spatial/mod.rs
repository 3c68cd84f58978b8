pub mod algorithms;
pub use algorithms::{
    area_excluding_holes, area_including_holes, area_of_holes, boundary_ring,
    bounding_circle_most_distant, buffer, diameter, diameter_of_outer, envelope, expand_rect,
    geometry_distance, hull_area_of_holes, hull_area_of_outer_rings, intersection_area,
    most_distant_points, perimeter_excluding_holes, perimeter_including_holes, perimeter_of_holes,
};

pub mod rtree;
pub use rtree::{IndexedEnvelope, SpatialIndex};
