//! The pyramid driver: from one geo-referenced raster to a stored set of
//! tiles across a ladder of zoom levels.

use crate::{
	raster::{SourceRaster, crop_to_mercator, rotated_envelope},
	rasterize::rasterize_tile,
	store::TileStore,
	zoom::{natural_scale, zoom_level_set},
};
use anyhow::{Context, Result, ensure};
use geopkg_core::{GeoBBox, ProjectionTransform, TileGrid};
use log::{debug, trace};

/// What a pyramid build produced: the materialized zoom levels (ascending)
/// and the total number of tiles handed to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PyramidSummary {
	pub zoom_levels: Vec<u8>,
	pub tile_count: u64,
}

/// Builds a tile pyramid from a source raster and its geographic footprint.
///
/// The pipeline per [`TilePyramid::write`] call:
/// 1. apply the configured rotation as a corner-polygon envelope,
/// 2. square-expand point footprints (and apply the optional buffer),
/// 3. crop image rows outside the Web Mercator latitude band,
/// 4. derive the zoom ladder from the image's natural scale,
/// 5. rasterize and store every covering tile, coarsest level first.
///
/// Tiles are produced strictly one at a time; each store call is awaited
/// before the next tile is rasterized, so a store failure aborts the build
/// at a deterministic tile boundary.
///
/// # Examples
/// ```no_run
/// use geopkg_core::{GeoBBox, SphericalMercator};
/// use geopkg_tiles::{MemoryTileStore, TilePyramid};
/// use image::RgbaImage;
///
/// # async fn example() -> anyhow::Result<()> {
/// let overlay = RgbaImage::new(512, 512);
/// let bbox = GeoBBox::new(13.1, 52.3, 13.6, 52.7)?;
/// let mut store = MemoryTileStore::new();
///
/// let summary = TilePyramid::new("overlay")?
///     .write(&overlay, &bbox, &SphericalMercator, &mut store)
///     .await?;
/// assert_eq!(summary.tile_count as usize, store.len());
/// # Ok(())
/// # }
/// ```
pub struct TilePyramid {
	table: String,
	rotation_degrees: f64,
	buffer_percentage: f64,
}

impl TilePyramid {
	pub fn new(table: &str) -> Result<TilePyramid> {
		ensure!(!table.is_empty(), "table name must not be empty");
		Ok(TilePyramid {
			table: table.to_string(),
			rotation_degrees: 0.0,
			buffer_percentage: 0.0,
		})
	}

	/// Rotates the overlay's footprint counter-clockwise before tiling.
	pub fn with_rotation(mut self, degrees: f64) -> TilePyramid {
		self.rotation_degrees = degrees;
		self
	}

	/// Adds a uniform buffer around the (squared) footprint; `percentage`
	/// is the share of the final range taken by the buffer on each side.
	pub fn with_buffer(mut self, percentage: f64) -> Result<TilePyramid> {
		ensure!(
			(0.0..0.5).contains(&percentage),
			"buffer percentage ({percentage}) must be in [0, 0.5)"
		);
		self.buffer_percentage = percentage;
		Ok(self)
	}

	/// Builds the pyramid and hands every tile to `store`.
	pub async fn write<R: SourceRaster, S: TileStore>(
		&self,
		raster: &R,
		bbox: &GeoBBox,
		projection: &impl ProjectionTransform,
		store: &mut S,
	) -> Result<PyramidSummary> {
		ensure!(
			raster.width() > 0 && raster.height() > 0,
			"source raster must have at least one pixel"
		);
		ensure!(
			!bbox.is_crossing_antimeridian(),
			"footprint {bbox:?} crosses the antimeridian; split it with GeoBBox::split_antimeridian and write each half"
		);

		let mut bbox = *bbox;
		if self.rotation_degrees != 0.0 {
			bbox = rotated_envelope(&bbox, self.rotation_degrees);
		}
		if bbox.is_point() || self.buffer_percentage > 0.0 {
			// A point footprint gets an ULP-sized span even without a
			// configured buffer, so the scale math below stays finite.
			let percentage = if bbox.is_point() && self.buffer_percentage == 0.0 {
				f64::EPSILON
			} else {
				self.buffer_percentage
			};
			bbox = bbox.square_expand(percentage);
		}

		let (view, bbox) = crop_to_mercator(raster, &bbox)?;
		let scale = natural_scale(&bbox, view.width())?;
		let zoom_levels = zoom_level_set(&bbox, scale)?;
		debug!(
			"building pyramid '{}': natural scale {scale}, zoom levels {zoom_levels:?}, footprint {bbox:?}",
			self.table
		);

		let mut tile_count = 0u64;
		for &level in &zoom_levels {
			let grid = TileGrid::from_geo(level, &bbox)?;
			debug!("zoom {level}: rasterizing {} tiles ({grid:?})", grid.count());
			for coord in grid.coords() {
				let tile = rasterize_tile(&view, &bbox, coord, projection)?;
				store
					.add_tile(&tile, &self.table, coord)
					.await
					.with_context(|| format!("storing tile {coord:?} in '{}'", self.table))?;
				trace!("stored {coord:?}");
				tile_count += 1;
			}
		}
		Ok(PyramidSummary { zoom_levels, tile_count })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryTileStore;
	use geopkg_core::{SphericalMercator, TileVisit, constants::MAX_ZOOM_LEVEL, iterate_tiles};
	use image::{Rgba, RgbaImage};
	use pretty_assertions::assert_eq;

	fn overlay(width: u32, height: u32) -> RgbaImage {
		RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 128, 255]))
	}

	#[tokio::test]
	async fn writes_every_tile_of_the_ladder() -> Result<()> {
		let raster = overlay(64, 64);
		let bbox = GeoBBox::new(13.0, 52.3, 13.35, 52.65)?;
		let mut store = MemoryTileStore::new();

		let summary = TilePyramid::new("overlay")?
			.write(&raster, &bbox, &SphericalMercator, &mut store)
			.await?;

		assert_eq!(summary.tile_count as usize, store.len());
		let mut expected = 0;
		for &level in &summary.zoom_levels {
			expected += TileGrid::from_geo(level, &bbox)?.count();
		}
		assert_eq!(summary.tile_count, expected);
		// The ladder is ascending and bottoms out in a single tile.
		let coarsest = summary.zoom_levels[0];
		assert!(TileGrid::from_geo(coarsest, &bbox)?.is_single_tile());
		Ok(())
	}

	#[tokio::test]
	async fn driver_walks_the_same_tiles_as_the_visitor() -> Result<()> {
		let raster = overlay(64, 64);
		let bbox = GeoBBox::new(13.0, 52.3, 13.35, 52.65)?;
		let mut store = MemoryTileStore::new();

		let summary = TilePyramid::new("overlay")?
			.write(&raster, &bbox, &SphericalMercator, &mut store)
			.await?;

		let mut visited = Vec::new();
		iterate_tiles(&bbox, &summary.zoom_levels, |coord| {
			visited.push(coord);
			TileVisit::Continue
		})?;
		assert_eq!(summary.tile_count as usize, visited.len());
		for coord in visited {
			assert!(store.get("overlay", coord).is_some(), "missing {coord:?}");
		}
		Ok(())
	}

	#[tokio::test]
	async fn store_failure_aborts_at_a_tile_boundary() -> Result<()> {
		// Natural scale 2, so the ladder is [0, 2] with 17 tiles in total.
		let raster = overlay(1024, 512);
		let bbox = GeoBBox::new(-170.0, -80.0, 170.0, 80.0)?;
		let mut store = MemoryTileStore::failing_after(3);

		let result = TilePyramid::new("overlay")?
			.write(&raster, &bbox, &SphericalMercator, &mut store)
			.await;

		assert!(result.is_err());
		assert_eq!(store.len(), 3, "no tiles after the failing one were stored");
		Ok(())
	}

	#[tokio::test]
	async fn point_footprint_produces_a_single_deep_tile() -> Result<()> {
		let raster = overlay(16, 16);
		// 45.0 exactly would sit on a tile column edge at every level; the
		// ULP-expanded box would then straddle two columns all the way down.
		let bbox = GeoBBox::new(45.1, 45.1, 45.1, 45.1)?;
		let mut store = MemoryTileStore::new();

		let summary = TilePyramid::new("pin")?
			.write(&raster, &bbox, &SphericalMercator, &mut store)
			.await?;

		assert_eq!(summary.zoom_levels, vec![MAX_ZOOM_LEVEL]);
		assert_eq!(summary.tile_count, 1);
		Ok(())
	}

	#[tokio::test]
	async fn zero_pixel_raster_is_rejected_before_tiling() -> Result<()> {
		let raster = RgbaImage::new(0, 0);
		let bbox = GeoBBox::new(13.0, 52.0, 14.0, 53.0)?;
		let mut store = MemoryTileStore::new();

		let result = TilePyramid::new("overlay")?
			.write(&raster, &bbox, &SphericalMercator, &mut store)
			.await;
		assert!(result.is_err());
		assert!(store.is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn wrapping_footprint_is_rejected() -> Result<()> {
		let raster = overlay(16, 16);
		let bbox = GeoBBox::new_wrapping(170.0, -10.0, -170.0, 10.0)?;
		let mut store = MemoryTileStore::new();

		let result = TilePyramid::new("overlay")?
			.write(&raster, &bbox, &SphericalMercator, &mut store)
			.await;
		assert!(result.is_err());
		Ok(())
	}

	#[tokio::test]
	async fn rotation_tiles_the_rotated_envelope() -> Result<()> {
		let raster = overlay(64, 16);
		let bbox = GeoBBox::new(10.0, 50.0, 14.0, 51.0)?;

		let mut store = MemoryTileStore::new();
		let summary = TilePyramid::new("overlay")?
			.with_rotation(90.0)
			.write(&raster, &bbox, &SphericalMercator, &mut store)
			.await?;

		// The driver must tile the envelope of the rotated corner polygon,
		// not the original box.
		let envelope = rotated_envelope(&bbox, 90.0);
		let expected_levels = zoom_level_set(&envelope, natural_scale(&envelope, 64)?)?;
		assert_eq!(summary.zoom_levels, expected_levels);

		for &level in &summary.zoom_levels {
			for coord in TileGrid::from_geo(level, &envelope)?.coords() {
				assert!(store.get("overlay", coord).is_some(), "missing {coord:?}");
			}
		}
		Ok(())
	}

	#[tokio::test]
	async fn buffer_grows_the_tile_footprint() -> Result<()> {
		let raster = overlay(32, 32);
		let bbox = GeoBBox::new(13.0, 52.0, 13.2, 52.2)?;

		let mut plain_store = MemoryTileStore::new();
		let plain = TilePyramid::new("overlay")?
			.write(&raster, &bbox, &SphericalMercator, &mut plain_store)
			.await?;

		let mut buffered_store = MemoryTileStore::new();
		let buffered = TilePyramid::new("overlay")?
			.with_buffer(0.25)?
			.write(&raster, &bbox, &SphericalMercator, &mut buffered_store)
			.await?;

		assert!(buffered.tile_count >= plain.tile_count);
		Ok(())
	}

	#[test]
	fn buffer_percentage_is_validated() {
		assert!(TilePyramid::new("t").unwrap().with_buffer(0.5).is_err());
		assert!(TilePyramid::new("t").unwrap().with_buffer(-0.1).is_err());
		assert!(TilePyramid::new("t").unwrap().with_buffer(0.0).is_ok());
	}
}
