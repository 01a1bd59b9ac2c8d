//! The tile pyramid construction engine: turns a geo-referenced raster and
//! its geographic bounding box into a multi-resolution set of 256×256 Web
//! Mercator tiles, handed to a pluggable tile store.

mod geopackage;
mod pyramid;
mod raster;
mod rasterize;
mod store;
mod zoom;

pub use geopackage::GeoPackageTileStore;
pub use pyramid::{PyramidSummary, TilePyramid};
pub use raster::{CroppedRaster, SourceRaster, crop_to_mercator, rotated_envelope};
pub use rasterize::rasterize_tile;
pub use store::{MemoryTileStore, TileStore};
pub use zoom::{natural_scale, zoom_level_set};
