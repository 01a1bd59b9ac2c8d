//! The projection collaborator: point conversion between WGS84 degrees
//! (EPSG:4326) and Web Mercator meters (EPSG:3857).
//!
//! The transform is a narrow, pluggable seam. The engine only ever needs the
//! two directions below; [`SphericalMercator`] is the standard spherical
//! implementation (`a = b = 6378137`, no datum grids) and is what every
//! production caller uses.

use crate::types::constants::{EARTH_RADIUS, WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LON, WEB_MERCATOR_MIN_LAT};
use anyhow::Result;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Converts points between geographic degrees and Web Mercator meters.
pub trait ProjectionTransform {
	/// `(lon, lat)` degrees to `(x, y)` meters.
	fn to_mercator(&self, lon: f64, lat: f64) -> Result<(f64, f64)>;

	/// `(x, y)` meters to `(lon, lat)` degrees.
	fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64)>;
}

/// The standard spherical Web Mercator transform.
///
/// Inputs are clamped to the valid Mercator domain before projecting, so the
/// transform is total over finite coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct SphericalMercator;

impl ProjectionTransform for SphericalMercator {
	fn to_mercator(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
		let lon = lon.clamp(-WEB_MERCATOR_MAX_LON, WEB_MERCATOR_MAX_LON);
		let lat = lat.clamp(WEB_MERCATOR_MIN_LAT, WEB_MERCATOR_MAX_LAT);
		let x = EARTH_RADIUS * lon.to_radians();
		let y = EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
		Ok((x, y))
	}

	fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64)> {
		let lon = (x / EARTH_RADIUS).to_degrees();
		let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
		Ok((lon, lat))
	}
}
