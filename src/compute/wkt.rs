//! WKT conversion for region geometry.

use crate::compute::validation::validate_geometry;
use crate::error::{CompactnessError, Result};
use crate::region::{Region, RegionCollection};
use ::wkt::{ToWkt, TryFromWkt};
use geo::{Geometry, MultiPolygon};
use std::path::Path;

/// Parses a `POLYGON` or `MULTIPOLYGON` into a one-region collection.
pub fn read_wkt(wkt: &str) -> Result<RegionCollection> {
    let geometry = Geometry::<f64>::try_from_wkt_str(wkt.trim())
        .map_err(|e| CompactnessError::InvalidInput(format!("Failed to parse WKT: {}", e)))?;

    let multipolygon = match geometry {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(multipolygon) => multipolygon,
        _ => {
            return Err(CompactnessError::InvalidInput(
                "WKT geometry is not a Polygon or MultiPolygon".to_string(),
            ));
        }
    };

    validate_geometry(&multipolygon)?;
    Ok(RegionCollection::new(vec![Region::new(multipolygon)]))
}

/// Reads a whole file as one WKT geometry.
pub fn read_wkt_file<P: AsRef<Path>>(path: P) -> Result<RegionCollection> {
    let text = std::fs::read_to_string(path)?;
    read_wkt(&text)
}

/// `MULTIPOLYGON` text for a geometry.
pub fn to_wkt(geometry: &MultiPolygon<f64>) -> String {
    geometry.wkt_string()
}
