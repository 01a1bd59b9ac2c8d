//! The tile store collaborator: where finished tiles go.

use anyhow::{Result, bail};
use async_trait::async_trait;
use geopkg_core::TileCoord;
use image::RgbaImage;
use std::collections::BTreeMap;

/// Receives finished tiles, keyed by `(table, zoom, row, column)`.
///
/// Implementations must be idempotent per key. Errors are propagated to the
/// pyramid driver unchanged and abort the build; the engine has no retry
/// policy of its own. The driver awaits every `add_tile` call before
/// rasterizing the next tile, so implementations see tiles strictly in
/// traversal order.
#[async_trait]
pub trait TileStore {
	async fn add_tile(&mut self, tile: &RgbaImage, table: &str, coord: TileCoord) -> Result<()>;
}

/// An in-memory tile store, mainly for tests and previews.
///
/// Optionally fails after a fixed number of inserts, which is how the
/// cancellation path of the pyramid driver is exercised.
#[derive(Default)]
pub struct MemoryTileStore {
	tiles: BTreeMap<(String, u8, u32, u32), RgbaImage>,
	fail_after: Option<usize>,
	inserts: usize,
}

impl MemoryTileStore {
	pub fn new() -> MemoryTileStore {
		MemoryTileStore::default()
	}

	/// A store whose `add_tile` fails once `limit` tiles have been accepted.
	pub fn failing_after(limit: usize) -> MemoryTileStore {
		MemoryTileStore {
			fail_after: Some(limit),
			..MemoryTileStore::default()
		}
	}

	pub fn len(&self) -> usize {
		self.tiles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tiles.is_empty()
	}

	pub fn get(&self, table: &str, coord: TileCoord) -> Option<&RgbaImage> {
		self.tiles.get(&(table.to_string(), coord.level, coord.y, coord.x))
	}

	/// Every stored address as `(table, zoom, row, column)`, sorted.
	pub fn keys(&self) -> impl Iterator<Item = &(String, u8, u32, u32)> {
		self.tiles.keys()
	}
}

#[async_trait]
impl TileStore for MemoryTileStore {
	async fn add_tile(&mut self, tile: &RgbaImage, table: &str, coord: TileCoord) -> Result<()> {
		if let Some(limit) = self.fail_after
			&& self.inserts >= limit
		{
			bail!("tile store failure injected after {limit} tiles");
		}
		self.inserts += 1;
		self
			.tiles
			.insert((table.to_string(), coord.level, coord.y, coord.x), tile.clone());
		Ok(())
	}
}
