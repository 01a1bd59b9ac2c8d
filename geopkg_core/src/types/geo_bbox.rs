use crate::{
	projection::ProjectionTransform,
	types::{
		MercatorBBox,
		constants::{WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LON, WEB_MERCATOR_MIN_LAT},
	},
};
use anyhow::{Result, ensure};
use std::fmt::Debug;

/// A geographic bounding box in degrees, defined by its minimum and maximum
/// longitude (x) and latitude (y) edges.
///
/// `GeoBBox` is a plain value type: every operation returns a new box instead
/// of mutating in place. Two longitude conventions exist:
///
/// - **Non-wrapping** (the ordinary case): `min_lon <= max_lon`.
/// - **Antimeridian-crossing**: `min_lon > max_lon`, meaning the box wraps
///   through ±180°. Produced by [`GeoBBox::bound_coordinates`] and accepted
///   by [`GeoBBox::new_wrapping`]; normalize with
///   [`GeoBBox::expand_coordinates`] or [`GeoBBox::split_antimeridian`]
///   before any arithmetic that assumes a contiguous range.
///
/// A **point** box (`min_lon == max_lon` and `min_lat == max_lat`) is valid,
/// degenerate input; [`GeoBBox::square_expand`] turns it into a usable area.
///
/// # Examples
/// ```
/// use geopkg_core::GeoBBox;
///
/// let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
/// assert_eq!(bbox.lon_range(), 20.0);
/// assert_eq!(bbox.centroid(), (0.0, 0.0));
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub min_lon: f64,
	pub min_lat: f64,
	pub max_lon: f64,
	pub max_lat: f64,
}

impl GeoBBox {
	/// Creates a non-wrapping bounding box.
	///
	/// # Errors
	/// Returns an error if any edge is non-finite, if `min_lat > max_lat`, or
	/// if `min_lon > max_lon`. A wrapping longitude range must go through
	/// [`GeoBBox::new_wrapping`] instead; it is never inferred.
	pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<GeoBBox> {
		ensure!(
			min_lon <= max_lon,
			"min_lon ({min_lon}) must be <= max_lon ({max_lon}); use new_wrapping for antimeridian-crossing boxes"
		);
		GeoBBox {
			min_lon,
			min_lat,
			max_lon,
			max_lat,
		}
		.checked()
	}

	/// Creates a bounding box that may cross the antimeridian
	/// (`min_lon > max_lon` is permitted and means "wraps through ±180°").
	///
	/// # Errors
	/// Returns an error if any edge is non-finite or if `min_lat > max_lat`.
	pub fn new_wrapping(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<GeoBBox> {
		GeoBBox {
			min_lon,
			min_lat,
			max_lon,
			max_lat,
		}
		.checked()
	}

	fn checked(self) -> Result<GeoBBox> {
		ensure!(
			self.min_lon.is_finite() && self.min_lat.is_finite() && self.max_lon.is_finite() && self.max_lat.is_finite(),
			"bounding box edges must be finite"
		);
		ensure!(
			self.min_lat <= self.max_lat,
			"min_lat ({}) must be <= max_lat ({})",
			self.min_lat,
			self.max_lat
		);
		Ok(self)
	}

	pub fn lon_range(&self) -> f64 {
		self.max_lon - self.min_lon
	}

	pub fn lat_range(&self) -> f64 {
		self.max_lat - self.min_lat
	}

	/// Midpoint of the box as `(lon, lat)`. Wrapping boxes must be expanded
	/// first, otherwise the longitude midpoint lands on the wrong side of the
	/// antimeridian.
	pub fn centroid(&self) -> (f64, f64) {
		(
			(self.min_lon + self.max_lon) / 2.0,
			(self.min_lat + self.max_lat) / 2.0,
		)
	}

	/// True if the box collapses to a single point on both axes.
	pub fn is_point(&self) -> bool {
		self.min_lon == self.max_lon && self.min_lat == self.max_lat
	}

	/// True if the box uses the antimeridian-crossing representation.
	pub fn is_crossing_antimeridian(&self) -> bool {
		self.min_lon > self.max_lon
	}

	pub fn as_array(&self) -> [f64; 4] {
		[self.min_lon, self.min_lat, self.max_lon, self.max_lat]
	}

	pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
		(self.min_lon, self.min_lat, self.max_lon, self.max_lat)
	}

	/// Returns the intersection of two non-wrapping boxes, or `None` if they
	/// do not overlap.
	///
	/// With `allow_empty` the shared edge or point counts as an overlap
	/// (`min == max` is accepted); without it the intersection must have
	/// positive area on both axes.
	pub fn overlap(&self, other: &GeoBBox, allow_empty: bool) -> Option<GeoBBox> {
		let min_lon = self.min_lon.max(other.min_lon);
		let max_lon = self.max_lon.min(other.max_lon);
		let min_lat = self.min_lat.max(other.min_lat);
		let max_lat = self.max_lat.min(other.max_lat);

		let valid = if allow_empty {
			min_lon <= max_lon && min_lat <= max_lat
		} else {
			min_lon < max_lon && min_lat < max_lat
		};
		valid.then_some(GeoBBox {
			min_lon,
			min_lat,
			max_lon,
			max_lat,
		})
	}

	/// Returns the minimal box containing both inputs, or `None` if the raw
	/// min/max combination collapses on either axis. Antimeridian-crossing
	/// boxes must be normalized before calling this.
	pub fn union(&self, other: &GeoBBox) -> Option<GeoBBox> {
		let min_lon = self.min_lon.min(other.min_lon);
		let max_lon = self.max_lon.max(other.max_lon);
		let min_lat = self.min_lat.min(other.min_lat);
		let max_lat = self.max_lat.max(other.max_lat);

		(min_lon < max_lon && min_lat < max_lat).then_some(GeoBBox {
			min_lon,
			min_lat,
			max_lon,
			max_lat,
		})
	}

	/// Inclusive containment on all four edges.
	pub fn contains(&self, other: &GeoBBox) -> bool {
		self.min_lon <= other.min_lon
			&& self.max_lon >= other.max_lon
			&& self.min_lat <= other.min_lat
			&& self.max_lat >= other.max_lat
	}

	/// If the box sticks out of the valid longitude range on exactly one
	/// side, returns the same physical extent shifted by a full world width
	/// (`±2 × max_projection_lon`) so that it lies in range. Returns `None`
	/// if no shift is needed.
	///
	/// # Examples
	/// ```
	/// use geopkg_core::GeoBBox;
	///
	/// let bbox = GeoBBox::new(170.0, -10.0, 190.0, 10.0).unwrap();
	/// let comp = bbox.complementary(180.0).unwrap();
	/// assert_eq!(comp.as_array(), [-190.0, -10.0, -170.0, 10.0]);
	/// ```
	pub fn complementary(&self, max_projection_lon: f64) -> Option<GeoBBox> {
		let world = 2.0 * max_projection_lon;
		let adjust = if self.max_lon > max_projection_lon && self.min_lon >= -max_projection_lon {
			-world
		} else if self.min_lon < -max_projection_lon && self.max_lon <= max_projection_lon {
			world
		} else {
			return None;
		};
		Some(GeoBBox {
			min_lon: self.min_lon + adjust,
			min_lat: self.min_lat,
			max_lon: self.max_lon + adjust,
			max_lat: self.max_lat,
		})
	}

	/// Wraps both longitude edges into `[-max_projection_lon, +max_projection_lon)`
	/// by modulo arithmetic. The result may legitimately have
	/// `min_lon > max_lon`, which is the canonical antimeridian-crossing
	/// representation.
	pub fn bound_coordinates(&self, max_projection_lon: f64) -> GeoBBox {
		let world = 2.0 * max_projection_lon;
		let wrap = |lon: f64| (lon + max_projection_lon).rem_euclid(world) - max_projection_lon;
		GeoBBox {
			min_lon: wrap(self.min_lon),
			min_lat: self.min_lat,
			max_lon: wrap(self.max_lon),
			max_lat: self.max_lat,
		}
	}

	/// Inverse of [`GeoBBox::bound_coordinates`]: if the box crosses the
	/// antimeridian, adds enough full world widths to `max_lon` that the
	/// longitude range becomes contiguous and non-wrapping.
	///
	/// # Examples
	/// ```
	/// use geopkg_core::GeoBBox;
	///
	/// let bbox = GeoBBox::new_wrapping(170.0, -10.0, -170.0, 10.0).unwrap();
	/// let expanded = bbox.expand_coordinates(180.0);
	/// assert_eq!(expanded.max_lon, 190.0);
	/// ```
	pub fn expand_coordinates(&self, max_projection_lon: f64) -> GeoBBox {
		if !self.is_crossing_antimeridian() {
			return *self;
		}
		let world = 2.0 * max_projection_lon;
		let wraps = 1.0 + ((self.min_lon - self.max_lon) / world).trunc();
		GeoBBox {
			min_lon: self.min_lon,
			min_lat: self.min_lat,
			max_lon: self.max_lon + wraps * world,
			max_lat: self.max_lat,
		}
	}

	/// Splits an antimeridian-crossing box into its western and eastern
	/// non-wrapping halves. A non-wrapping box is returned unchanged with no
	/// second half.
	pub fn split_antimeridian(&self) -> (GeoBBox, Option<GeoBBox>) {
		if !self.is_crossing_antimeridian() {
			return (*self, None);
		}
		let west = GeoBBox {
			min_lon: self.min_lon,
			min_lat: self.min_lat,
			max_lon: WEB_MERCATOR_MAX_LON,
			max_lat: self.max_lat,
		};
		let east = GeoBBox {
			min_lon: -WEB_MERCATOR_MAX_LON,
			min_lat: self.min_lat,
			max_lon: self.max_lon,
			max_lat: self.max_lat,
		};
		(west, Some(east))
	}

	/// Expands the box into a square with a uniform buffer on all sides.
	///
	/// The shorter axis is extended symmetrically around the center until both
	/// spans are equal, then every side grows by half of
	/// `range / (1 - 2 × buffer_percentage) - range`. A point box first has
	/// its max edges nudged up by one ULP, so a nonzero span exists before
	/// the percentage is applied.
	///
	/// # Examples
	/// ```
	/// use geopkg_core::GeoBBox;
	///
	/// let point = GeoBBox::new(45.0, 45.0, 45.0, 45.0).unwrap();
	/// let square = point.square_expand(0.1);
	/// assert!(square.lon_range() > 0.0);
	/// assert_eq!(square.lon_range(), square.lat_range());
	/// ```
	pub fn square_expand(&self, buffer_percentage: f64) -> GeoBBox {
		let mut bbox = *self;
		if bbox.is_point() && buffer_percentage > 0.0 {
			bbox.max_lon = bbox.max_lon.next_up();
			bbox.max_lat = bbox.max_lat.next_up();
		}

		let lon_range = bbox.lon_range();
		let lat_range = bbox.lat_range();
		let range = lon_range.max(lat_range);
		if lon_range < lat_range {
			let grow = (lat_range - lon_range) / 2.0;
			bbox.min_lon -= grow;
			bbox.max_lon += grow;
		} else if lat_range < lon_range {
			let grow = (lon_range - lat_range) / 2.0;
			bbox.min_lat -= grow;
			bbox.max_lat += grow;
		}

		let buffer = (range / (1.0 - 2.0 * buffer_percentage) - range) / 2.0;
		GeoBBox {
			min_lon: bbox.min_lon - buffer,
			min_lat: bbox.min_lat - buffer,
			max_lon: bbox.max_lon + buffer,
			max_lat: bbox.max_lat + buffer,
		}
	}

	/// Clamps the box to the valid Web Mercator domain. The latitude bounds
	/// are the exact (asymmetric) reference constants.
	pub fn clamped_to_mercator(&self) -> GeoBBox {
		GeoBBox {
			min_lon: self.min_lon.clamp(-WEB_MERCATOR_MAX_LON, WEB_MERCATOR_MAX_LON),
			min_lat: self.min_lat.clamp(WEB_MERCATOR_MIN_LAT, WEB_MERCATOR_MAX_LAT),
			max_lon: self.max_lon.clamp(-WEB_MERCATOR_MAX_LON, WEB_MERCATOR_MAX_LON),
			max_lat: self.max_lat.clamp(WEB_MERCATOR_MIN_LAT, WEB_MERCATOR_MAX_LAT),
		}
	}

	/// Projects the box to Web Mercator meters, clamping latitude to the
	/// valid Mercator range first and projecting each corner independently.
	pub fn to_mercator(&self, transform: &impl ProjectionTransform) -> Result<MercatorBBox> {
		let clamped = self.clamped_to_mercator();
		let (min_x, min_y) = transform.to_mercator(clamped.min_lon, clamped.min_lat)?;
		let (max_x, max_y) = transform.to_mercator(clamped.max_lon, clamped.max_lat)?;
		MercatorBBox::new(min_x, min_y, max_x, max_y)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"GeoBBox({}, {}, {}, {})",
			self.min_lon, self.min_lat, self.max_lon, self.max_lat
		)
	}
}

impl TryFrom<[f64; 4]> for GeoBBox {
	type Error = anyhow::Error;

	/// Converts `[west, south, east, north]` into a non-wrapping `GeoBBox`.
	fn try_from(input: [f64; 4]) -> Result<Self> {
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}
