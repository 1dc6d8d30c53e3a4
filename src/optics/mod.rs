/// Optical computations for a camera/lens pair
///
/// This module is pure arithmetic, no I/O and no state:
/// - Rearrangements of the pinhole proportionality law (geometry.rs)
/// - The WD/focal/FOV triple and its lock flags (params.rs)
/// - Resolution, defect size and motion blur metrics (metrics.rs)
/// - Lock-driven resolution of the unknown parameter (solver.rs)

pub mod geometry;
pub mod metrics;
pub mod params;
pub mod solver;

pub use metrics::{Computed, DerivedMetrics, Motion, MotionBlur};
pub use params::{Field, LockPattern, Locks, OpticalParams};
pub use solver::solve;
