//! Validation of region collections before batch operations.
//!
//! Every check here fails the whole operation: callers run them before any
//! region is mutated, so a failure leaves no partial results behind.

use crate::error::{CollectionRole, CompactnessError, Result};
use crate::region::{Region, RegionCollection};
use geo::{CoordsIter, MultiPolygon};
use rustc_hash::FxHashMap;

/// Ensures every region carries the `key` attribute.
///
/// # Examples
///
/// ```
/// use compactness::compute::validation::require_join_attribute;
/// use compactness::error::CollectionRole;
/// use compactness::{Region, RegionCollection};
/// use geo::MultiPolygon;
///
/// let regions: RegionCollection = vec![
///     Region::new(MultiPolygon::new(vec![])).with_property("ID", "1"),
///     Region::new(MultiPolygon::new(vec![])),
/// ]
/// .into_iter()
/// .collect();
///
/// assert!(require_join_attribute(&regions, "ID", CollectionRole::Subunits).is_err());
/// ```
pub fn require_join_attribute(
    collection: &RegionCollection,
    key: &str,
    role: CollectionRole,
) -> Result<()> {
    match collection
        .iter()
        .position(|region| region.property(key).is_none())
    {
        Some(index) => Err(CompactnessError::MissingJoinAttribute {
            collection: role,
            index,
            key: key.to_string(),
        }),
        None => Ok(()),
    }
}

/// Maps each superunit's `key` value to its position.
///
/// Fails if any superunit lacks the key or two superunits share a value.
pub fn index_by_key<'a>(
    superunits: &'a RegionCollection,
    key: &str,
) -> Result<FxHashMap<&'a str, usize>> {
    let mut by_key = FxHashMap::default();
    by_key.reserve(superunits.len());

    for (index, region) in superunits.iter().enumerate() {
        let value = region
            .property(key)
            .ok_or_else(|| CompactnessError::MissingJoinAttribute {
                collection: CollectionRole::Superunits,
                index,
                key: key.to_string(),
            })?;

        if by_key.insert(value, index).is_some() {
            return Err(CompactnessError::DuplicateJoinKey {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }

    Ok(by_key)
}

/// Rejects geometry with non-finite coordinates or rings too short to close.
pub fn validate_geometry(geometry: &MultiPolygon<f64>) -> Result<()> {
    if let Some(coord) = geometry
        .coords_iter()
        .find(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(CompactnessError::InvalidInput(format!(
            "Coordinates must be finite, got: ({}, {})",
            coord.x, coord.y
        )));
    }

    for polygon in geometry.iter() {
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
        for ring in rings {
            // Closed rings repeat their first vertex.
            if ring.0.len() < 4 {
                return Err(CompactnessError::InvalidInput(format!(
                    "Ring must have at least 3 distinct vertices, got {} coordinates",
                    ring.0.len()
                )));
            }
        }
    }

    Ok(())
}

/// Validates the geometry of every region, reporting the first failure.
pub fn validate_regions(regions: &[Region]) -> Result<()> {
    for (index, region) in regions.iter().enumerate() {
        validate_geometry(&region.geometry).map_err(|e| {
            CompactnessError::InvalidInput(format!("Region {} invalid: {}", index, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon, polygon};

    fn unit(id: &str) -> Region {
        Region::from_polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ])
        .with_property("ID", id)
    }

    #[test]
    fn test_index_by_key() {
        let superunits: RegionCollection = vec![unit("a"), unit("b")].into_iter().collect();
        let by_key = index_by_key(&superunits, "ID").unwrap();
        assert_eq!(by_key.get("a"), Some(&0));
        assert_eq!(by_key.get("b"), Some(&1));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let superunits: RegionCollection = vec![unit("a"), unit("a")].into_iter().collect();
        let err = index_by_key(&superunits, "ID").unwrap_err();
        assert!(matches!(
            err,
            CompactnessError::DuplicateJoinKey { ref value, .. } if value == "a"
        ));
    }

    #[test]
    fn test_missing_key_reports_index() {
        let superunits: RegionCollection = vec![unit("a"), unit("b")].into_iter().collect();
        let err = index_by_key(&superunits, "GEOID").unwrap_err();
        assert!(matches!(
            err,
            CompactnessError::MissingJoinAttribute { index: 0, .. }
        ));

        let subunits: RegionCollection =
            vec![unit("a"), Region::new(MultiPolygon::new(vec![]))]
                .into_iter()
                .collect();
        let err = require_join_attribute(&subunits, "ID", CollectionRole::Subunits).unwrap_err();
        assert!(matches!(
            err,
            CompactnessError::MissingJoinAttribute {
                collection: CollectionRole::Subunits,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_geometry() {
        assert!(validate_geometry(&unit("a").geometry).is_ok());

        let nan = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        assert!(validate_geometry(&MultiPolygon::new(vec![nan])).is_err());

        let degenerate = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]), vec![]);
        assert!(validate_geometry(&MultiPolygon::new(vec![degenerate])).is_err());
    }

    #[test]
    fn test_validate_regions_names_region() {
        let bad = Region::new(MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            vec![],
        )]));
        let err = validate_regions(&[unit("a"), bad]).unwrap_err();
        assert!(err.to_string().contains("Region 1"));
    }
}
