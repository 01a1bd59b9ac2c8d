//! Value types and pure math for building Web Mercator tile pyramids:
//! geographic bounding boxes, XYZ tile coordinates, tile grids and the
//! projection transform used to move between degrees and meters.

pub mod projection;
pub mod types;

pub use projection::*;
pub use types::*;
