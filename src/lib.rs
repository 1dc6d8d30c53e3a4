/// Optical configurator for machine-vision setups
///
/// Pick a camera and a lens, lock the quantities you know among working
/// distance, focal length and field of view, and the remaining one is
/// solved from the pinhole relation. Resolution density, smallest
/// detectable defect and motion blur follow from the settled field of view.

pub mod config;
pub mod error;
pub mod optics;
pub mod report;
pub mod state;
