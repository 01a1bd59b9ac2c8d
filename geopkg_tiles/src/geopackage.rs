//! Persist tiles into a GeoPackage (SQLite) database.
//!
//! `GeoPackageTileStore` writes the minimal set of GeoPackage bookkeeping a
//! tile pyramid needs: `gpkg_contents`, `gpkg_tile_matrix_set`,
//! `gpkg_tile_matrix` and one pyramid table per tile table. Tiles are
//! PNG-encoded and stored with XYZ addressing (`tile_row` 0 at the north),
//! one record per `(zoom_level, tile_column, tile_row)`; re-inserting a key
//! replaces the record, so writes are idempotent.

use crate::store::TileStore;
use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use geopkg_core::{
	TileCoord,
	constants::{TILE_SIZE, WEB_MERCATOR_EPSG, WEB_MERCATOR_HALF_WORLD},
};
use image::{ImageFormat, RgbaImage};
use log::debug;
use r2d2::Pool;
use r2d2_sqlite::{SqliteConnectionManager, rusqlite::params};
use std::{collections::HashSet, fs::remove_file, io::Cursor, path::Path};

/// Tile store backed by a GeoPackage SQLite file.
pub struct GeoPackageTileStore {
	pool: Pool<SqliteConnectionManager>,
	known_tables: HashSet<String>,
}

impl GeoPackageTileStore {
	/// Creates a new GeoPackage at `path`, replacing any existing file, and
	/// initializes the metadata tables.
	pub fn create(path: &Path) -> Result<GeoPackageTileStore> {
		if path.exists() {
			remove_file(path).with_context(|| format!("removing existing file '{}'", path.display()))?;
		}
		let manager = SqliteConnectionManager::file(path);
		let pool = Pool::builder().max_size(10).build(manager)?;

		pool
			.get()?
			.execute_batch(
				"CREATE TABLE gpkg_contents (
					table_name TEXT NOT NULL PRIMARY KEY,
					data_type TEXT NOT NULL,
					identifier TEXT UNIQUE,
					description TEXT DEFAULT '',
					last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
					min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE,
					srs_id INTEGER
				);
				CREATE TABLE gpkg_tile_matrix_set (
					table_name TEXT NOT NULL PRIMARY KEY,
					srs_id INTEGER NOT NULL,
					min_x DOUBLE NOT NULL, min_y DOUBLE NOT NULL,
					max_x DOUBLE NOT NULL, max_y DOUBLE NOT NULL
				);
				CREATE TABLE gpkg_tile_matrix (
					table_name TEXT NOT NULL,
					zoom_level INTEGER NOT NULL,
					matrix_width INTEGER NOT NULL,
					matrix_height INTEGER NOT NULL,
					tile_width INTEGER NOT NULL,
					tile_height INTEGER NOT NULL,
					pixel_x_size DOUBLE NOT NULL,
					pixel_y_size DOUBLE NOT NULL,
					CONSTRAINT pk_gpkg_tile_matrix PRIMARY KEY (table_name, zoom_level)
				);",
			)
			.context("initializing GeoPackage metadata tables")?;

		Ok(GeoPackageTileStore {
			pool,
			known_tables: HashSet::new(),
		})
	}

	/// Number of tiles stored in a pyramid table.
	pub fn tile_count(&self, table: &str) -> Result<u64> {
		ensure_valid_table_name(table)?;
		let conn = self.pool.get()?;
		let count: u64 = conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))?;
		Ok(count)
	}

	/// Zoom levels registered in `gpkg_tile_matrix` for a pyramid table.
	pub fn zoom_levels(&self, table: &str) -> Result<Vec<u8>> {
		let conn = self.pool.get()?;
		let mut statement =
			conn.prepare("SELECT zoom_level FROM gpkg_tile_matrix WHERE table_name = ?1 ORDER BY zoom_level")?;
		let levels = statement
			.query_map(params![table], |row| row.get::<_, u8>(0))?
			.collect::<Result<Vec<u8>, _>>()?;
		Ok(levels)
	}

	fn ensure_table(&mut self, table: &str) -> Result<()> {
		if self.known_tables.contains(table) {
			return Ok(());
		}
		ensure_valid_table_name(table)?;
		debug!("registering pyramid table '{table}'");

		let conn = self.pool.get()?;
		conn.execute_batch(&format!(
			"CREATE TABLE IF NOT EXISTS \"{table}\" (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				zoom_level INTEGER NOT NULL,
				tile_column INTEGER NOT NULL,
				tile_row INTEGER NOT NULL,
				tile_data BLOB NOT NULL,
				UNIQUE (zoom_level, tile_column, tile_row)
			);"
		))?;
		let world = WEB_MERCATOR_HALF_WORLD;
		conn.execute(
			"INSERT OR REPLACE INTO gpkg_contents (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id)
			VALUES (?1, 'tiles', ?1, ?2, ?3, ?4, ?5, ?6)",
			params![table, -world, -world, world, world, WEB_MERCATOR_EPSG],
		)?;
		conn.execute(
			"INSERT OR REPLACE INTO gpkg_tile_matrix_set (table_name, srs_id, min_x, min_y, max_x, max_y)
			VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
			params![table, WEB_MERCATOR_EPSG, -world, -world, world, world],
		)?;

		self.known_tables.insert(table.to_string());
		Ok(())
	}

	fn ensure_matrix(&self, table: &str, level: u8) -> Result<()> {
		let matrix_size = 1u32 << level;
		let pixel_size = 2.0 * WEB_MERCATOR_HALF_WORLD / (matrix_size as f64 * TILE_SIZE as f64);
		self.pool.get()?.execute(
			"INSERT OR IGNORE INTO gpkg_tile_matrix
			(table_name, zoom_level, matrix_width, matrix_height, tile_width, tile_height, pixel_x_size, pixel_y_size)
			VALUES (?1, ?2, ?3, ?3, ?4, ?4, ?5, ?5)",
			params![table, level, matrix_size, TILE_SIZE, pixel_size],
		)?;
		Ok(())
	}
}

#[async_trait]
impl TileStore for GeoPackageTileStore {
	async fn add_tile(&mut self, tile: &RgbaImage, table: &str, coord: TileCoord) -> Result<()> {
		self.ensure_table(table)?;
		self.ensure_matrix(table, coord.level)?;

		let mut blob = Vec::new();
		tile
			.write_to(&mut Cursor::new(&mut blob), ImageFormat::Png)
			.context("encoding tile as PNG")?;

		self
			.pool
			.get()?
			.execute(
				&format!(
					"INSERT OR REPLACE INTO \"{table}\" (zoom_level, tile_column, tile_row, tile_data)
					VALUES (?1, ?2, ?3, ?4)"
				),
				params![coord.level, coord.x, coord.y, blob],
			)
			.with_context(|| format!("inserting tile {coord:?} into '{table}'"))?;
		Ok(())
	}
}

fn ensure_valid_table_name(table: &str) -> Result<()> {
	let valid = table.chars().enumerate().all(|(i, c)| {
		if i == 0 {
			c.is_ascii_alphabetic() || c == '_'
		} else {
			c.is_ascii_alphanumeric() || c == '_'
		}
	});
	ensure!(
		!table.is_empty() && valid,
		"invalid table name '{table}': expected [A-Za-z_][A-Za-z0-9_]*"
	);
	Ok(())
}
