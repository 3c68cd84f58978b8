//! GeoJSON conversion for region collections.

use crate::compute::validation::validate_geometry;
use crate::error::{CompactnessError, Result};
use crate::region::{Region, RegionCollection};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, PolygonType, Value};
use std::path::Path;

/// Parses a `FeatureCollection`, `Feature`, `Polygon` or `MultiPolygon`
/// document into a region collection.
///
/// Feature properties become string attributes: JSON strings are taken
/// verbatim, any other value as its JSON text. A top-level `crs` member is
/// kept as the collection's projection descriptor.
pub fn read_geojson(geojson: &str) -> Result<RegionCollection> {
    let document: GeoJson = geojson
        .parse()
        .map_err(|e| CompactnessError::InvalidInput(format!("Failed to parse GeoJSON: {}", e)))?;

    match document {
        GeoJson::FeatureCollection(collection) => {
            let projection = collection
                .foreign_members
                .as_ref()
                .and_then(|members| members.get("crs"))
                .map(|crs| crs.to_string())
                .unwrap_or_default();

            let regions = collection
                .features
                .iter()
                .enumerate()
                .map(|(index, feature)| {
                    region_from_feature(feature).map_err(|e| {
                        CompactnessError::InvalidInput(format!("Feature {}: {}", index, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(RegionCollection::new(regions).with_projection(projection))
        }
        GeoJson::Feature(feature) => Ok(RegionCollection::new(vec![region_from_feature(&feature)?])),
        GeoJson::Geometry(geometry) => Ok(RegionCollection::new(vec![Region::new(
            multipolygon_from_geometry(&geometry)?,
        )])),
    }
}

/// Reads and parses a GeoJSON file with [`read_geojson`].
pub fn read_geojson_file<P: AsRef<Path>>(path: P) -> Result<RegionCollection> {
    let text = std::fs::read_to_string(path)?;
    read_geojson(&text)
}

fn region_from_feature(feature: &Feature) -> Result<Region> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| CompactnessError::InvalidInput("Feature has no geometry".to_string()))?;

    let mut region = Region::new(multipolygon_from_geometry(geometry)?);
    if let Some(properties) = &feature.properties {
        for (key, value) in properties {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            region.properties.insert(key.clone(), text);
        }
    }
    Ok(region)
}

fn multipolygon_from_geometry(geometry: &Geometry) -> Result<MultiPolygon<f64>> {
    let multipolygon = match &geometry.value {
        Value::Polygon(rings) => MultiPolygon::new(vec![polygon_from_rings(rings)?]),
        Value::MultiPolygon(polygons) => MultiPolygon::new(
            polygons
                .iter()
                .map(polygon_from_rings)
                .collect::<Result<Vec<_>>>()?,
        ),
        other => {
            return Err(CompactnessError::InvalidInput(format!(
                "Expected Polygon or MultiPolygon geometry, got {}",
                geometry_kind(other)
            )));
        }
    };

    validate_geometry(&multipolygon)?;
    Ok(multipolygon)
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// The first ring is the outer ring; the rest are holes.
fn polygon_from_rings(rings: &PolygonType) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| ring_from_positions(ring));

    let exterior = rings.next().ok_or_else(|| {
        CompactnessError::InvalidInput("Polygon must have at least one ring".to_string())
    })??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|position| {
            if position.len() < 2 {
                return Err(CompactnessError::InvalidInput(
                    "Coordinate must have at least 2 values".to_string(),
                ));
            }
            Ok(Coord {
                x: position[0],
                y: position[1],
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::from)
}

fn rings_from_polygon(polygon: &Polygon<f64>) -> PolygonType {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect())
        .collect()
}

/// Serialises a collection as a `FeatureCollection`.
///
/// Each feature carries the region's attributes as strings and its scores
/// as numbers; a score shadows an attribute of the same name.
pub fn to_geojson(collection: &RegionCollection) -> Result<String> {
    let features = collection
        .iter()
        .map(|region| {
            let rings = region.geometry.iter().map(rings_from_polygon).collect();
            let mut properties = JsonObject::new();
            for (key, value) in &region.properties {
                properties.insert(key.clone(), serde_json::Value::String(value.clone()));
            }
            for (name, score) in &region.scores {
                properties.insert(name.clone(), serde_json::json!(score));
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::MultiPolygon(rings))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let document = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });

    serde_json::to_string(&document).map_err(|e| {
        CompactnessError::Serialization(format!("Failed to serialize regions: {}", e))
    })
}
