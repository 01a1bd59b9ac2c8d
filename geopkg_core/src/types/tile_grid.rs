//! Tile ranges: which tiles of a zoom level cover a bounding box, and a
//! driver that walks every tile of a set of zoom levels.

use crate::types::{
	GeoBBox, TileCoord,
	constants::MAX_ZOOM_LEVEL,
	tile_coord::{lat_to_tile_y, lon_to_tile_x},
};
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::{
	collections::BTreeSet,
	fmt::{self, Debug},
};

/// The inclusive `[min, max]` range of tile columns and rows covering a
/// bounding box at one zoom level.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
	pub level: u8,
	pub x_min: u32,
	pub x_max: u32,
	pub y_min: u32,
	pub y_max: u32,
}

impl TileGrid {
	/// Computes the covering tile range for a non-wrapping bounding box.
	///
	/// Both corners are pushed through the point-to-tile formulas and
	/// combined with min/max, which keeps the range valid even when the
	/// west/east ordering is ambiguous after reprojection. Wrapping boxes
	/// must be split with [`GeoBBox::split_antimeridian`] first.
	pub fn from_geo(level: u8, bbox: &GeoBBox) -> Result<TileGrid> {
		ensure!(
			level <= MAX_ZOOM_LEVEL,
			"level ({level}) must be <= {MAX_ZOOM_LEVEL}"
		);
		ensure!(
			!bbox.is_crossing_antimeridian(),
			"cannot compute a tile range for an antimeridian-crossing box; split it first"
		);

		let x1 = lon_to_tile_x(bbox.min_lon, level);
		let x2 = lon_to_tile_x(bbox.max_lon, level);
		let y1 = lat_to_tile_y(bbox.min_lat, level);
		let y2 = lat_to_tile_y(bbox.max_lat, level);

		Ok(TileGrid {
			level,
			x_min: x1.min(x2),
			x_max: x1.max(x2),
			y_min: y1.min(y2),
			y_max: y1.max(y2),
		})
	}

	pub fn width(&self) -> u32 {
		self.x_max - self.x_min + 1
	}

	pub fn height(&self) -> u32 {
		self.y_max - self.y_min + 1
	}

	pub fn count(&self) -> u64 {
		(self.width() as u64) * (self.height() as u64)
	}

	pub fn is_single_tile(&self) -> bool {
		self.count() == 1
	}

	/// Iterates every tile of the grid, column-major: x outer, y inner.
	pub fn coords(&self) -> impl Iterator<Item = TileCoord> + use<> {
		let level = self.level;
		(self.x_min..=self.x_max)
			.cartesian_product(self.y_min..=self.y_max)
			.map(move |(x, y)| TileCoord { level, x, y })
	}
}

impl Debug for TileGrid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"TileGrid({}: [{},{}] x [{},{}])",
			self.level, self.x_min, self.x_max, self.y_min, self.y_max
		)
	}
}

/// Flow control returned by a tile visitor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileVisit {
	Continue,
	/// Halt iteration globally: no further tiles at this or any remaining
	/// zoom level are visited.
	Stop,
}

/// Visits every tile covering `bbox` across the given zoom levels.
///
/// The zoom levels are deduplicated and sorted ascending first, so the
/// traversal order is deterministic regardless of input order. Within a
/// level, columns are the outer loop and rows the inner loop. A visitor
/// returning [`TileVisit::Stop`] halts the whole traversal immediately; the
/// stop takes effect at tile granularity, never mid-tile.
///
/// This order (ascending levels, columns outer, rows inner) is the contract
/// for every tile walk: drivers that cannot route through a synchronous
/// closure, such as one awaiting an async store per tile, must produce the
/// same sequence.
pub fn iterate_tiles(
	bbox: &GeoBBox,
	zoom_levels: &[u8],
	mut visit: impl FnMut(TileCoord) -> TileVisit,
) -> Result<TileVisit> {
	let levels: BTreeSet<u8> = zoom_levels.iter().copied().collect();
	for level in levels {
		let grid = TileGrid::from_geo(level, bbox)?;
		for coord in grid.coords() {
			if visit(coord) == TileVisit::Stop {
				return Ok(TileVisit::Stop);
			}
		}
	}
	Ok(TileVisit::Continue)
}
