//! The source raster abstraction and its geographic pre-processing: rotation
//! envelopes and the Web Mercator latitude crop.

use anyhow::{Result, ensure};
use geopkg_core::{
	GeoBBox,
	constants::{WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MIN_LAT},
};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

/// A read-only image the engine samples from: origin upper left, 0-indexed.
///
/// The engine never mutates the raster; the Mercator latitude crop is a
/// zero-copy [`CroppedRaster`] view.
pub trait SourceRaster {
	fn width(&self) -> u32;
	fn height(&self) -> u32;

	/// The RGBA color at an in-bounds pixel coordinate.
	fn pixel(&self, x: u32, y: u32) -> Rgba<u8>;
}

impl SourceRaster for DynamicImage {
	fn width(&self) -> u32 {
		GenericImageView::width(self)
	}

	fn height(&self) -> u32 {
		GenericImageView::height(self)
	}

	fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
		self.get_pixel(x, y)
	}
}

impl SourceRaster for RgbaImage {
	fn width(&self) -> u32 {
		RgbaImage::width(self)
	}

	fn height(&self) -> u32 {
		RgbaImage::height(self)
	}

	fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
		*self.get_pixel(x, y)
	}
}

/// A horizontal band of another raster: the rows `[row_offset,
/// row_offset + height)`. Used by [`crop_to_mercator`] to drop the image
/// rows that fall outside the Web Mercator latitude band.
pub struct CroppedRaster<'a, R: SourceRaster> {
	inner: &'a R,
	row_offset: u32,
	height: u32,
}

impl<'a, R: SourceRaster> CroppedRaster<'a, R> {
	pub fn full(inner: &'a R) -> CroppedRaster<'a, R> {
		CroppedRaster {
			inner,
			row_offset: 0,
			height: inner.height(),
		}
	}
}

impl<R: SourceRaster> SourceRaster for CroppedRaster<'_, R> {
	fn width(&self) -> u32 {
		self.inner.width()
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
		self.inner.pixel(x, y + self.row_offset)
	}
}

/// Crops a raster to the Web Mercator latitude band.
///
/// When the image's bounding box reaches above or below the valid Mercator
/// latitude range, the corresponding top/bottom fraction of image rows is
/// dropped in proportion to the out-of-range share of the latitude span, and
/// the bounding box latitudes are clamped to match. An image fully inside
/// the band passes through untouched.
///
/// # Errors
/// Fails for a zero-pixel raster or an image that lies entirely outside the
/// Mercator latitude band.
pub fn crop_to_mercator<'a, R: SourceRaster>(
	raster: &'a R,
	bbox: &GeoBBox,
) -> Result<(CroppedRaster<'a, R>, GeoBBox)> {
	ensure!(
		raster.width() > 0 && raster.height() > 0,
		"source raster must have at least one pixel"
	);

	if bbox.max_lat <= WEB_MERCATOR_MAX_LAT && bbox.min_lat >= WEB_MERCATOR_MIN_LAT {
		return Ok((CroppedRaster::full(raster), *bbox));
	}
	ensure!(
		bbox.min_lat < WEB_MERCATOR_MAX_LAT && bbox.max_lat > WEB_MERCATOR_MIN_LAT,
		"raster footprint {bbox:?} lies entirely outside the Web Mercator latitude band"
	);

	let height = raster.height();
	let lat_span = bbox.lat_range();
	let rows = |out_of_range: f64| ((out_of_range / lat_span) * height as f64).round() as u32;

	let mut rows_top = rows((bbox.max_lat - WEB_MERCATOR_MAX_LAT).max(0.0));
	rows_top = rows_top.min(height - 1);
	let mut rows_bottom = rows((WEB_MERCATOR_MIN_LAT - bbox.min_lat).max(0.0));
	rows_bottom = rows_bottom.min(height - 1 - rows_top);

	let cropped = CroppedRaster {
		inner: raster,
		row_offset: rows_top,
		height: height - rows_top - rows_bottom,
	};
	let clamped = GeoBBox {
		min_lon: bbox.min_lon,
		min_lat: bbox.min_lat.max(WEB_MERCATOR_MIN_LAT),
		max_lon: bbox.max_lon,
		max_lat: bbox.max_lat.min(WEB_MERCATOR_MAX_LAT),
	};
	Ok((cropped, clamped))
}

/// Bounding box of a rotated overlay.
///
/// The four corners are rotated as a polygon about the box's centroid and
/// the envelope of the rotated polygon is returned. Rotating the min/max
/// edges independently would under- or over-estimate the true extent.
pub fn rotated_envelope(bbox: &GeoBBox, degrees: f64) -> GeoBBox {
	let (cx, cy) = bbox.centroid();
	let (sin, cos) = degrees.to_radians().sin_cos();

	let corners = [
		(bbox.min_lon, bbox.min_lat),
		(bbox.max_lon, bbox.min_lat),
		(bbox.max_lon, bbox.max_lat),
		(bbox.min_lon, bbox.max_lat),
	];

	let mut envelope = GeoBBox {
		min_lon: f64::INFINITY,
		min_lat: f64::INFINITY,
		max_lon: f64::NEG_INFINITY,
		max_lat: f64::NEG_INFINITY,
	};
	for (lon, lat) in corners {
		let dx = lon - cx;
		let dy = lat - cy;
		let rx = cx + dx * cos - dy * sin;
		let ry = cy + dx * sin + dy * cos;
		envelope.min_lon = envelope.min_lon.min(rx);
		envelope.min_lat = envelope.min_lat.min(ry);
		envelope.max_lon = envelope.max_lon.max(rx);
		envelope.max_lat = envelope.max_lat.max(ry);
	}
	envelope
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgba;

	fn gradient(width: u32, height: u32) -> RgbaImage {
		RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
	}

	#[test]
	fn in_band_image_passes_through() {
		let img = gradient(8, 8);
		let bbox = GeoBBox::new(-10.0, -10.0, 10.0, 10.0).unwrap();
		let (view, out) = crop_to_mercator(&img, &bbox).unwrap();
		assert_eq!(view.height(), 8);
		assert_eq!(out, bbox);
		assert_eq!(view.pixel(3, 5), *img.get_pixel(3, 5));
	}

	#[test]
	fn polar_rows_are_cropped_proportionally() {
		// 90..-90 spans 180 degrees; ~4.95 degrees lie outside on each side,
		// which is 2.75% of the span, so 100 rows lose 3 at each end.
		let img = gradient(4, 100);
		let bbox = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
		let (view, out) = crop_to_mercator(&img, &bbox).unwrap();
		assert_eq!(view.height(), 94);
		assert_eq!(view.pixel(0, 0), *img.get_pixel(0, 3));
		assert_eq!(out.min_lat, WEB_MERCATOR_MIN_LAT);
		assert_eq!(out.max_lat, WEB_MERCATOR_MAX_LAT);
	}

	#[test]
	fn fully_polar_image_is_rejected() {
		let img = gradient(4, 4);
		let bbox = GeoBBox::new(-10.0, 86.0, 10.0, 89.0).unwrap();
		assert!(crop_to_mercator(&img, &bbox).is_err());
	}

	#[test]
	fn zero_pixel_raster_is_rejected() {
		let img = RgbaImage::new(0, 0);
		let bbox = GeoBBox::new(-10.0, -10.0, 10.0, 10.0).unwrap();
		assert!(crop_to_mercator(&img, &bbox).is_err());
	}

	#[test]
	fn crop_keeps_at_least_one_row() {
		// A one-row image mostly past the northern limit would round its
		// only row away; the crop must keep it.
		let img = gradient(4, 1);
		let bbox = GeoBBox::new(-10.0, 80.0, 10.0, 95.0).unwrap();
		let (view, _) = crop_to_mercator(&img, &bbox).unwrap();
		assert_eq!(view.height(), 1);
	}

	#[test]
	fn rotation_by_zero_is_identity() {
		let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		let rotated = rotated_envelope(&bbox, 0.0);
		assert_eq!(rotated, bbox);
	}

	#[test]
	fn rotation_by_ninety_swaps_spans() {
		let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		let rotated = rotated_envelope(&bbox, 90.0);
		assert!((rotated.lon_range() - 10.0).abs() < 1e-9);
		assert!((rotated.lat_range() - 20.0).abs() < 1e-9);
		assert_eq!(rotated.centroid(), bbox.centroid());
	}

	#[test]
	fn rotation_by_45_grows_the_envelope() {
		let bbox = GeoBBox::new(-1.0, -1.0, 1.0, 1.0).unwrap();
		let rotated = rotated_envelope(&bbox, 45.0);
		let expected = 2.0 * 2.0f64.sqrt();
		assert!((rotated.lon_range() - expected).abs() < 1e-9);
		assert!((rotated.lat_range() - expected).abs() < 1e-9);
		assert!(rotated.contains(&bbox));
	}
}
