//! XYZ tile coordinates and the Web Mercator tiling formulas.
//!
//! Tiles are addressed by zoom level, column `x` and row `y` with the origin
//! in the upper left: row 0 is the northernmost row and rows increase
//! southward. Each zoom level `z` splits the world into `2^z × 2^z` tiles.

use crate::types::{GeoBBox, constants::{MAX_ZOOM_LEVEL, WEB_MERCATOR_MAX_LAT}};
use anyhow::{Result, ensure};
use std::{
	f64::consts::PI,
	fmt::{self, Debug},
};

/// Western longitude edge of tile column `x` at zoom `level`, in degrees.
pub fn tile_to_lon(x: u32, level: u8) -> f64 {
	let count = 2.0f64.powi(level as i32);
	(x as f64) / count * 360.0 - 180.0
}

/// Northern latitude edge of tile row `y` at zoom `level`, in degrees.
///
/// This is the inverse Web Mercator latitude formula.
pub fn tile_to_lat(y: u32, level: u8) -> f64 {
	let count = 2.0f64.powi(level as i32);
	(PI - 2.0 * PI * (y as f64) / count).sinh().atan().to_degrees()
}

/// Tile column containing `lon` at zoom `level`, clamped to `[0, 2^level - 1]`.
pub fn lon_to_tile_x(lon: f64, level: u8) -> u32 {
	let count = 2.0f64.powi(level as i32);
	let x = ((lon + 180.0) / 360.0 * count).floor();
	x.clamp(0.0, count - 1.0) as u32
}

/// Tile row containing `lat` at zoom `level`, clamped to `[0, 2^level - 1]`.
///
/// Latitude is clamped to the Web Mercator band before the formula is
/// applied, so poleward inputs land in the first or last row.
pub fn lat_to_tile_y(lat: f64, level: u8) -> u32 {
	let count = 2.0f64.powi(level as i32);
	let lat = lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
	let rad = lat.to_radians();
	let y = ((1.0 - (rad.tan() + 1.0 / rad.cos()).ln() / PI) / 2.0 * count).floor();
	y.clamp(0.0, count - 1.0) as u32
}

/// A single tile address: zoom level, column and row.
#[derive(Eq, PartialEq, Clone, Copy, Hash)]
pub struct TileCoord {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(
			level <= MAX_ZOOM_LEVEL,
			"level ({level}) must be <= {MAX_ZOOM_LEVEL}"
		);
		let max = 1u32 << level;
		ensure!(x < max, "x ({x}) must be < {max} at level {level}");
		ensure!(y < max, "y ({y}) must be < {max} at level {level}");
		Ok(TileCoord { level, x, y })
	}

	/// Geographic bounding box of this tile:
	/// `{west, south, east, north}` edges in degrees.
	pub fn as_geo_bbox(&self) -> GeoBBox {
		GeoBBox {
			min_lon: tile_to_lon(self.x, self.level),
			min_lat: tile_to_lat(self.y + 1, self.level),
			max_lon: tile_to_lon(self.x + 1, self.level),
			max_lat: tile_to_lat(self.y, self.level),
		}
	}

	/// The tile containing the given geographic point.
	pub fn from_geo(level: u8, lon: f64, lat: f64) -> Result<TileCoord> {
		ensure!(
			level <= MAX_ZOOM_LEVEL,
			"level ({level}) must be <= {MAX_ZOOM_LEVEL}"
		);
		Ok(TileCoord {
			level,
			x: lon_to_tile_x(lon, level),
			y: lat_to_tile_y(lat, level),
		})
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}, [{}, {}])", self.level, self.x, self.y)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn zoom_zero_tile_spans_the_world() {
		assert_eq!(tile_to_lon(0, 0), -180.0);
		assert_eq!(tile_to_lon(1, 0), 180.0);
		assert!((tile_to_lat(0, 0) - WEB_MERCATOR_MAX_LAT).abs() < 1e-10);
		assert!((tile_to_lat(1, 0) + WEB_MERCATOR_MAX_LAT).abs() < 1e-10);
	}

	#[test]
	fn origin_falls_south_east_at_zoom_one() {
		assert_eq!(lon_to_tile_x(0.0, 1), 1);
		assert_eq!(lat_to_tile_y(0.0, 1), 1);
	}

	#[rstest]
	#[case(0)]
	#[case(1)]
	#[case(5)]
	#[case(12)]
	fn lon_tile_roundtrip_on_boundaries(#[case] level: u8) {
		let count = 1u32 << level;
		for x in [0, count / 2, count - 1] {
			assert_eq!(lon_to_tile_x(tile_to_lon(x, level), level), x, "x={x} level={level}");
		}
	}

	#[test]
	fn lat_tile_roundtrip_inside_rows() {
		// Sample the row midpoint rather than the edge to avoid landing in
		// the neighbouring row on floating-point noise.
		for level in [1u8, 4, 9] {
			let count = 1u32 << level;
			for y in [0, count / 2, count - 1] {
				let mid = (tile_to_lat(y, level) + tile_to_lat(y + 1, level)) / 2.0;
				assert_eq!(lat_to_tile_y(mid, level), y, "y={y} level={level}");
			}
		}
	}

	#[test]
	fn poleward_latitudes_clamp_to_outer_rows() {
		assert_eq!(lat_to_tile_y(90.0, 3), 0);
		assert_eq!(lat_to_tile_y(-90.0, 3), 7);
	}

	#[test]
	fn out_of_range_longitudes_clamp_to_outer_columns() {
		assert_eq!(lon_to_tile_x(-200.0, 3), 0);
		assert_eq!(lon_to_tile_x(200.0, 3), 7);
	}

	#[test]
	fn coord_validation() {
		assert!(TileCoord::new(2, 3, 3).is_ok());
		assert!(TileCoord::new(2, 4, 0).is_err());
		assert!(TileCoord::new(2, 0, 4).is_err());
		assert!(TileCoord::new(21, 0, 0).is_err());
	}

	#[test]
	fn tile_geo_bbox_edges() {
		let coord = TileCoord::new(1, 1, 1).unwrap();
		let bbox = coord.as_geo_bbox();
		assert_eq!(bbox.min_lon, 0.0);
		assert_eq!(bbox.max_lon, 180.0);
		assert!((bbox.max_lat - 0.0).abs() < 1e-10);
		assert!((bbox.min_lat + WEB_MERCATOR_MAX_LAT).abs() < 1e-10);
	}

	#[test]
	fn from_geo_matches_free_functions() {
		let coord = TileCoord::from_geo(5, 13.4, 52.5).unwrap();
		assert_eq!(coord.x, lon_to_tile_x(13.4, 5));
		assert_eq!(coord.y, lat_to_tile_y(52.5, 5));
	}
}
