//! Zoom level selection: how deep a pyramid an overlay deserves.

use anyhow::{Result, ensure};
use geopkg_core::{GeoBBox, TileGrid, constants::{MAX_ZOOM_LEVEL, TILE_SIZE}};
use std::collections::BTreeSet;

/// The zoom level at which one source pixel maps to approximately one tile
/// pixel: `floor(log2(360 × image_width / (bbox_width_deg × TILE_SIZE)))`.
///
/// # Errors
/// Fails for a zero-width image or a zero-span bounding box; expand point
/// boxes with [`GeoBBox::square_expand`] first.
///
/// # Examples
/// ```
/// use geopkg_core::GeoBBox;
/// use geopkg_tiles::natural_scale;
///
/// let bbox = GeoBBox::new(13.0, 52.0, 14.0, 53.0).unwrap();
/// assert_eq!(natural_scale(&bbox, 1024).unwrap(), 10.0);
/// ```
pub fn natural_scale(bbox: &GeoBBox, image_width: u32) -> Result<f64> {
	ensure!(image_width > 0, "image width must be > 0");
	let lon_range = bbox.lon_range();
	ensure!(
		lon_range > 0.0,
		"bounding box {bbox:?} has no longitude span; expand it before computing a scale"
	);
	Ok((360.0 * image_width as f64 / (lon_range * TILE_SIZE as f64)).log2().floor())
}

/// Builds the ladder of zoom levels to materialize for an overlay.
///
/// Starting from the rounded natural scale (clamped to `[0, 20]`), the level
/// is halved downward in steps of two until the covered tile footprint
/// collapses to a single tile or level 0 is reached; every visited level is
/// part of the set. The result is deduplicated and sorted ascending so tile
/// enumeration is deterministic.
pub fn zoom_level_set(bbox: &GeoBBox, natural_scale: f64) -> Result<Vec<u8>> {
	let mut level = natural_scale.round().clamp(0.0, MAX_ZOOM_LEVEL as f64) as u8;
	let mut levels = BTreeSet::new();
	loop {
		let grid = TileGrid::from_geo(level, bbox)?;
		levels.insert(level);
		if grid.is_single_tile() || level == 0 {
			break;
		}
		level = level.saturating_sub(2);
	}
	Ok(levels.into_iter().collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(1.0, 1024, 10.0)] // floor(log2(1440))
	#[case(360.0, 256, 0.0)] // one world-wide tile
	#[case(360.0, 512, 1.0)]
	#[case(0.5, 100, 8.0)] // floor(log2(281.25))
	fn natural_scale_cases(#[case] lon_span: f64, #[case] width: u32, #[case] expected: f64) {
		let bbox = GeoBBox::new(0.0, 0.0, lon_span, 1.0).unwrap();
		assert_eq!(natural_scale(&bbox, width).unwrap(), expected);
	}

	#[test]
	fn natural_scale_rejects_degenerate_input() {
		let bbox = GeoBBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
		assert!(natural_scale(&bbox, 0).is_err());
		let point = GeoBBox::new(45.0, 45.0, 45.0, 45.0).unwrap();
		assert!(natural_scale(&point, 100).is_err());
	}

	#[test]
	fn ladder_descends_by_two_to_a_single_tile() {
		// A ~0.35 degree box: a handful of tiles at z10, one tile well
		// before z0, so the ladder stops early.
		let bbox = GeoBBox::new(13.0, 52.3, 13.35, 52.65).unwrap();
		let levels = zoom_level_set(&bbox, 10.0).unwrap();
		assert!(levels.contains(&10));
		for pair in levels.windows(2) {
			assert_eq!(pair[1] - pair[0], 2, "ladder steps by two");
		}
		let coarsest = levels[0];
		assert!(TileGrid::from_geo(coarsest, &bbox).unwrap().is_single_tile());
	}

	#[test]
	fn ladder_always_terminates_in_footprint_one_or_level_zero() {
		let bbox = GeoBBox::new(-170.0, -80.0, 170.0, 80.0).unwrap();
		let levels = zoom_level_set(&bbox, 6.0).unwrap();
		let coarsest = levels[0];
		let single = TileGrid::from_geo(coarsest, &bbox).unwrap().is_single_tile();
		assert!(single || coarsest == 0);
		// A world-spanning box never fits one tile above level 0.
		assert_eq!(coarsest, 0);
		assert_eq!(levels, vec![0, 2, 4, 6]);
	}

	#[test]
	fn odd_start_level_steps_through_one_to_zero() {
		let bbox = GeoBBox::new(-170.0, -80.0, 170.0, 80.0).unwrap();
		let levels = zoom_level_set(&bbox, 5.0).unwrap();
		assert_eq!(levels, vec![0, 1, 3, 5]);
	}

	#[test]
	fn natural_scale_above_the_supported_range_is_clamped() {
		let bbox = GeoBBox::new(13.0, 52.0, 13.0001, 52.0001).unwrap();
		let levels = zoom_level_set(&bbox, 28.7).unwrap();
		assert_eq!(*levels.last().unwrap(), MAX_ZOOM_LEVEL);
	}
}
