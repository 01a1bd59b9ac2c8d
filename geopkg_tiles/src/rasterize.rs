//! Per-tile resampling: every destination pixel is inverse-projected back
//! into source image space and sampled nearest-neighbor.

use crate::raster::SourceRaster;
use anyhow::Result;
use geopkg_core::{GeoBBox, ProjectionTransform, TileCoord, constants::TILE_SIZE};
use image::RgbaImage;

/// Renders one `TILE_SIZE × TILE_SIZE` tile from a geo-referenced raster.
///
/// For each destination pixel the tile-local Web Mercator position is
/// inverse-projected to degrees and mapped into source pixel space using the
/// image's own per-pixel degree resolution. In-bounds source pixels are
/// sampled nearest-neighbor; everything else stays transparent, so a tile
/// only partially covered by the image fades out correctly.
///
/// The output depends only on the inputs; rendering the same tile twice
/// produces byte-identical buffers.
///
/// This is the dominant cost center of pyramid construction: an
/// `O(TILE_SIZE²)` loop with two trigonometric round-trips per pixel.
pub fn rasterize_tile<R: SourceRaster>(
	raster: &R,
	image_bbox: &GeoBBox,
	coord: TileCoord,
	projection: &impl ProjectionTransform,
) -> Result<RgbaImage> {
	let mercator = coord.as_geo_bbox().to_mercator(projection)?;
	let pixel_width = mercator.x_range() / TILE_SIZE as f64;
	let pixel_height = mercator.y_range() / TILE_SIZE as f64;

	// A zeroed buffer is fully transparent.
	let mut tile = RgbaImage::new(TILE_SIZE, TILE_SIZE);

	let src_width = raster.width() as f64;
	let src_height = raster.height() as f64;
	let lon_per_pixel = image_bbox.lon_range() / src_width;
	let lat_per_pixel = image_bbox.lat_range() / src_height;
	if lon_per_pixel <= 0.0 || lat_per_pixel <= 0.0 {
		// A zero-span footprint covers no destination pixel.
		return Ok(tile);
	}

	for py in 0..TILE_SIZE {
		let y = mercator.max_y - py as f64 * pixel_height;
		for px in 0..TILE_SIZE {
			let x = mercator.min_x + px as f64 * pixel_width;
			let (lon, lat) = projection.to_geographic(x, y)?;

			let src_x = ((lon - image_bbox.min_lon) / lon_per_pixel).floor();
			let src_y = (src_height - (lat - image_bbox.min_lat) / lat_per_pixel).floor();
			if src_x >= 0.0 && src_x < src_width && src_y >= 0.0 && src_y < src_height {
				tile.put_pixel(px, py, raster.pixel(src_x as u32, src_y as u32));
			}
		}
	}
	Ok(tile)
}
