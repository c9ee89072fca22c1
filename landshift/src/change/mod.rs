//! Change classification for one polygon and year.
//!
//! Compares the dominant land class of every cell across two offset time
//! windows and keeps only the cells whose transition is tracked. The
//! resulting [`ChangeRaster`] drives every downstream stage.

mod classifier;
mod raster;

pub use classifier::{ChangeClassifier, ClassifyError};
pub use raster::{ChangeCell, ChangeRaster, GridMismatch};
