//! Web Mercator → WGS84 conversion for reporting a pyramid's footprint.
//!
//! Tiles are cut purely in Mercator meters; lon/lat is only needed for the
//! manifest written next to them.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::Serialize;

use super::MercatorExtent;

const EPSG_WEB_MERCATOR: u16 = 3857;
const EPSG_WGS84: u16 = 4326;

/// Bounding box in longitude/latitude degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LonLatExtent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

fn proj_for(epsg: u16) -> Result<Proj, String> {
    let def = crs_definitions::from_code(epsg).ok_or_else(|| format!("EPSG:{epsg} definition missing"))?;
    Proj::from_proj_string(def.proj4).map_err(|e| format!("Invalid projection EPSG:{epsg}: {e:?}"))
}

/// Convert Mercator meters to `(lon, lat)` degrees.
///
/// # Errors
/// Returns an error if proj4rs rejects the point.
pub fn mercator_to_lon_lat(x: f64, y: f64) -> Result<(f64, f64), String> {
    let mercator = proj_for(EPSG_WEB_MERCATOR)?;
    let wgs84 = proj_for(EPSG_WGS84)?;

    let mut point = (x, y, 0.0);
    transform(&mercator, &wgs84, &mut point).map_err(|e| format!("Mercator ({x}, {y}) to lon/lat failed: {e:?}"))?;

    // proj4rs yields radians for geographic targets
    Ok((point.0.to_degrees(), point.1.to_degrees()))
}

/// Convert a Mercator extent to lon/lat via its south-west and north-east corners.
///
/// # Errors
/// Returns an error if either corner fails to project.
pub fn extent_to_lon_lat(extent: &MercatorExtent) -> Result<LonLatExtent, String> {
    let (west, south) = mercator_to_lon_lat(extent.min_x, extent.min_y)?;
    let (east, north) = mercator_to_lon_lat(extent.max_x, extent.max_y)?;
    Ok(LonLatExtent { west, south, east, north })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MAX_MERC;

    #[test]
    fn test_origin_is_null_island() {
        let (lon, lat) = mercator_to_lon_lat(0.0, 0.0).unwrap();
        assert!(lon.abs() < 1e-9 && lat.abs() < 1e-9, "({lon}, {lat})");
    }

    #[test]
    fn test_world_extent_to_lon_lat() {
        let ll = extent_to_lon_lat(&MercatorExtent::world()).unwrap();
        assert!((ll.west + 180.0).abs() < 1e-6, "west: {}", ll.west);
        assert!((ll.east - 180.0).abs() < 1e-6, "east: {}", ll.east);
        // Web Mercator's latitude limit
        assert!((ll.north - 85.051_128_78).abs() < 1e-4, "north: {}", ll.north);
        assert!((ll.south + 85.051_128_78).abs() < 1e-4, "south: {}", ll.south);
    }

    #[test]
    fn test_quarter_world_longitude() {
        let (lon, _) = mercator_to_lon_lat(MAX_MERC / 2.0, 0.0).unwrap();
        assert!((lon - 90.0).abs() < 1e-6, "lon: {lon}");
        let (lon, _) = mercator_to_lon_lat(-MAX_MERC / 4.0, 0.0).unwrap();
        assert!((lon + 45.0).abs() < 1e-6, "lon: {lon}");
    }
}
