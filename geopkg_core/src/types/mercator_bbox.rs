use anyhow::{Result, ensure};
use std::fmt::Debug;

/// A bounding box in Web Mercator meters (EPSG:3857).
///
/// Produced by projecting a [`GeoBBox`](crate::GeoBBox); consumed by the tile
/// rasterizer, which steps through it in per-pixel meter increments.
#[derive(Clone, Copy, PartialEq)]
pub struct MercatorBBox {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl MercatorBBox {
	pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<MercatorBBox> {
		ensure!(
			min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite(),
			"mercator bounding box edges must be finite"
		);
		ensure!(min_x <= max_x, "min_x ({min_x}) must be <= max_x ({max_x})");
		ensure!(min_y <= max_y, "min_y ({min_y}) must be <= max_y ({max_y})");
		Ok(MercatorBBox {
			min_x,
			min_y,
			max_x,
			max_y,
		})
	}

	pub fn x_range(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn y_range(&self) -> f64 {
		self.max_y - self.min_y
	}
}

impl Debug for MercatorBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"MercatorBBox({}, {}, {}, {})",
			self.min_x, self.min_y, self.max_x, self.max_y
		)
	}
}
