/// Lock-driven constraint solver for the optical triple
///
/// With exactly two of {WD, focal, FOV} locked the third one is derived from
/// the pinhole relation. Any other lock combination leaves the triple alone:
/// zero or one lock means the caller decides what is being edited, three
/// locks are taken as given without a consistency check.

use super::geometry::{compute_focal, compute_fov, compute_wd};
use super::params::{Field, LockPattern, Locks, OpticalParams};
use crate::error::GeometryError;

/// Resolve the unlocked parameter, if the locks define exactly one
///
/// Applies at most one relation and never touches `locks`. A locked value
/// that is still undefined leaves the triple unchanged. Fails with
/// `DegenerateGeometry` when a locked value (or the sensor width) is a zero
/// divisor of the relation that applies, and with `Overflow` when the solved
/// value is not finite.
pub fn solve(
    params: OpticalParams,
    locks: Locks,
    sensor_mm: f64,
) -> Result<OpticalParams, GeometryError> {
    let unlocked = match locks.pattern() {
        LockPattern::TwoLocked { unlocked } => unlocked,
        LockPattern::ZeroOrOneLocked | LockPattern::AllLocked => return Ok(params),
    };

    if !(sensor_mm > 0.0) {
        return Err(GeometryError::DegenerateGeometry { divisor: "sensor_mm" });
    }

    let mut solved = params;
    match unlocked {
        Field::Fov => {
            if let (Some(wd), Some(focal)) = (params.wd_mm, params.focal_mm) {
                solved.fov_mm = Some(compute_fov(sensor_mm, focal, wd)?);
            }
        }
        Field::Focal => {
            if let (Some(wd), Some(fov)) = (params.wd_mm, params.fov_mm) {
                solved.focal_mm = Some(compute_focal(sensor_mm, wd, fov)?);
            }
        }
        Field::Wd => {
            if let (Some(focal), Some(fov)) = (params.focal_mm, params.fov_mm) {
                solved.wd_mm = Some(compute_wd(fov, sensor_mm, focal)?);
            }
        }
    }

    Ok(solved)
}
