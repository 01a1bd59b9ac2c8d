//! Shared constants for the Web Mercator tiling scheme.
//!
//! Every literal the tiling math depends on lives here, so that all call
//! sites agree bit-for-bit. The two Mercator latitude bounds are asymmetric
//! by one ULP; existing GeoPackage consumers depend on the exact values, so
//! they must never be "corrected".

/// Width and height of one output tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Southern latitude limit of the Web Mercator projection, in degrees.
pub const WEB_MERCATOR_MIN_LAT: f64 = -85.05112877980659;

/// Northern latitude limit of the Web Mercator projection, in degrees.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.0511287798066;

/// Longitude limit of the Web Mercator projection, in degrees.
pub const WEB_MERCATOR_MAX_LON: f64 = 180.0;

/// Half the extent of the Web Mercator plane, in meters.
pub const WEB_MERCATOR_HALF_WORLD: f64 = 20_037_508.342789244;

/// Spherical Mercator earth radius (WGS84 semi-major axis), in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Highest zoom level the pyramid engine will materialize.
pub const MAX_ZOOM_LEVEL: u8 = 20;

/// EPSG code of the WGS84 geographic coordinate reference system.
pub const WGS84_EPSG: u32 = 4326;

/// EPSG code of the Web Mercator projected coordinate reference system.
pub const WEB_MERCATOR_EPSG: u32 = 3857;
