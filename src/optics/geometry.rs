/// Geometric relations between sensor size, working distance, focal length and FOV
///
/// All three functions are rearrangements of the small-angle pinhole law:
///
/// ```text
/// fov_mm * focal_mm = sensor_mm * wd_mm
/// ```

use crate::error::GeometryError;

/// Field of view at the object plane: `FOV = sensor * WD / focal`
pub fn compute_fov(sensor_mm: f64, focal_mm: f64, wd_mm: f64) -> Result<f64, GeometryError> {
    if focal_mm == 0.0 {
        return Err(GeometryError::DegenerateGeometry { divisor: "focal_mm" });
    }
    finite("fov_mm", sensor_mm * wd_mm / focal_mm)
}

/// Working distance: `WD = FOV * focal / sensor`
pub fn compute_wd(fov_mm: f64, sensor_mm: f64, focal_mm: f64) -> Result<f64, GeometryError> {
    if sensor_mm == 0.0 {
        return Err(GeometryError::DegenerateGeometry { divisor: "sensor_mm" });
    }
    finite("wd_mm", fov_mm * focal_mm / sensor_mm)
}

/// Focal length: `focal = sensor * WD / FOV`
pub fn compute_focal(sensor_mm: f64, wd_mm: f64, fov_mm: f64) -> Result<f64, GeometryError> {
    if fov_mm == 0.0 {
        return Err(GeometryError::DegenerateGeometry { divisor: "fov_mm" });
    }
    finite("focal_mm", sensor_mm * wd_mm / fov_mm)
}

/// Optical magnification `m = sensor / FOV`
///
/// Returns `None` while the FOV is not a finite positive number.
pub fn magnification(sensor_mm: f64, fov_mm: f64) -> Option<f64> {
    let m = sensor_mm / fov_mm;
    (fov_mm.is_finite() && fov_mm > 0.0 && m.is_finite()).then_some(m)
}

fn finite(field: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::Overflow { field })
    }
}
