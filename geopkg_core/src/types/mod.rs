//! Contains the core value types: bounding boxes, tile coordinates, tile
//! grids and the shared constants they are defined against.

pub mod constants;
mod geo_bbox;
mod mercator_bbox;
mod tile_coord;
mod tile_grid;

pub use geo_bbox::GeoBBox;
pub use mercator_bbox::MercatorBBox;
pub use tile_coord::{TileCoord, lat_to_tile_y, lon_to_tile_x, tile_to_lat, tile_to_lon};
pub use tile_grid::{TileGrid, TileVisit, iterate_tiles};
