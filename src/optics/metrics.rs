/// Resolution-dependent quality metrics
///
/// These are computed from a resolved FOV plus the camera and kinematic
/// inputs. A metric whose inputs are not resolved yet is reported as
/// `Computed::NotComputable`, which is a normal transient state and not an
/// error: the caller shows a placeholder instead of an alarm.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::geometry;
use crate::error::ValidationError;

/// Minimum pixel count a defect must span to be detected (industrial rule of thumb)
pub const DEFAULT_REQUIRED_PX: u32 = 3;

/// A metric value, or the marker that it cannot be computed yet
///
/// Serializes as a bare number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Computed {
    Value(f64),
    NotComputable,
}

impl Computed {
    /// Wrap a value, turning `None` into `NotComputable`
    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(Computed::NotComputable, Computed::Value)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Computed::Value(v) => Some(v),
            Computed::NotComputable => None,
        }
    }

    /// Apply `f` to the value, keeping `NotComputable` as is
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Computed::Value(v) => Computed::Value(f(v)),
            Computed::NotComputable => Computed::NotComputable,
        }
    }
}

impl fmt::Display for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Value(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            Computed::NotComputable => f.write_str("N/A"),
        }
    }
}

/// Object speed and exposure time used for motion blur
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Motion {
    speed_m_s: f64,
    exposure_s: f64,
}

impl Motion {
    /// Both inputs must be finite and non-negative
    pub fn new(speed_m_s: f64, exposure_s: f64) -> Result<Self, ValidationError> {
        check_non_negative("speed_m_s", speed_m_s)?;
        check_non_negative("exposure_s", exposure_s)?;
        Ok(Self { speed_m_s, exposure_s })
    }
}

/// Motion blur expressed in object space, on the sensor and in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionBlur {
    pub object_mm: f64,
    pub sensor_um: Computed,
    pub px: Computed,
}

/// Everything derived from one resolved geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub px_per_mm: Computed,
    pub min_defect_mm: Computed,
    pub blur_object_mm: Computed,
    pub blur_sensor_um: Computed,
    pub blur_px: Computed,
    pub magnification: Computed,
}

impl Default for DerivedMetrics {
    fn default() -> Self {
        Self::not_computable()
    }
}

impl DerivedMetrics {
    /// All outputs cleared
    pub fn not_computable() -> Self {
        Self {
            px_per_mm: Computed::NotComputable,
            min_defect_mm: Computed::NotComputable,
            blur_object_mm: Computed::NotComputable,
            blur_sensor_um: Computed::NotComputable,
            blur_px: Computed::NotComputable,
            magnification: Computed::NotComputable,
        }
    }

    /// Compute all metrics for a horizontal FOV and a camera
    ///
    /// `fov_mm` is `None` while the FOV is still undefined. Motion blur is
    /// only computed once kinematic inputs are known.
    pub fn compute(
        fov_mm: Option<f64>,
        resolution_x_px: u32,
        pixel_size_um: f64,
        motion: Option<Motion>,
        required_px: u32,
    ) -> Result<Self, ValidationError> {
        let px_per_mm = fov_mm.map_or(Computed::NotComputable, |fov| {
            resolution_density(resolution_x_px, fov)
        });
        let min_defect_mm = px_per_mm
            .value()
            .map_or(Computed::NotComputable, |d| min_detectable_defect(d, required_px));

        let sensor_width_mm = pixel_size_um * resolution_x_px as f64 / 1000.0;
        let magnification = Computed::from_option(
            fov_mm.and_then(|fov| geometry::magnification(sensor_width_mm, fov)),
        );

        let (blur_object_mm, blur_sensor_um, blur_px) = match motion {
            Some(m) => {
                // px_per_mm <= 0 is the "not resolved" sentinel here
                let density = px_per_mm.value().unwrap_or(0.0);
                let blur = motion_blur(m.speed_m_s, m.exposure_s, density, pixel_size_um)?;
                (Computed::Value(blur.object_mm), blur.sensor_um, blur.px)
            }
            None => (
                Computed::NotComputable,
                Computed::NotComputable,
                Computed::NotComputable,
            ),
        };

        Ok(Self {
            px_per_mm,
            min_defect_mm,
            blur_object_mm,
            blur_sensor_um,
            blur_px,
            magnification,
        })
    }
}

/// Pixel density in object space: `px/mm = resolution_px / FOV_mm`
pub fn resolution_density(resolution_x_px: u32, fov_mm: f64) -> Computed {
    if fov_mm.is_finite() && fov_mm > 0.0 {
        positive(resolution_x_px as f64 / fov_mm)
    } else {
        Computed::NotComputable
    }
}

/// Smallest defect spanning `required_px` pixels: `defect_mm = required_px / (px/mm)`
pub fn min_detectable_defect(px_per_mm: f64, required_px: u32) -> Computed {
    if px_per_mm.is_finite() && px_per_mm > 0.0 {
        positive(required_px as f64 / px_per_mm)
    } else {
        Computed::NotComputable
    }
}

/// A finite, strictly positive value, else `NotComputable`
fn positive(value: f64) -> Computed {
    if value.is_finite() && value > 0.0 {
        Computed::Value(value)
    } else {
        Computed::NotComputable
    }
}

/// Motion blur during one exposure
///
/// - object space: `speed_m_s * exposure_s * 1000` mm
/// - pixels: `blur_object_mm * px_per_mm`
/// - sensor: `blur_px * pixel_size_um` µm
///
/// The object-space blur does not depend on resolution and is always
/// returned; the other two are `NotComputable` unless `px_per_mm` is a
/// finite positive number.
pub fn motion_blur(
    speed_m_s: f64,
    exposure_s: f64,
    px_per_mm: f64,
    pixel_size_um: f64,
) -> Result<MotionBlur, ValidationError> {
    check_non_negative("speed_m_s", speed_m_s)?;
    check_non_negative("exposure_s", exposure_s)?;
    check_non_negative("pixel_size_um", pixel_size_um)?;

    let object_mm = speed_m_s * exposure_s * 1000.0;
    let px = if px_per_mm.is_finite() && px_per_mm > 0.0 {
        Computed::Value(object_mm * px_per_mm)
    } else {
        Computed::NotComputable
    };

    Ok(MotionBlur {
        object_mm,
        sensor_um: px.map(|p| p * pixel_size_um),
        px,
    })
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field,
            input: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn value(c: Computed) -> f64 {
        c.value().expect("metric should be computable")
    }

    #[test]
    fn test_px_per_mm() {
        // 2048 px over a 200 mm FOV
        assert_abs_diff_eq!(value(resolution_density(2048, 200.0)), 10.24, epsilon = 1e-12);
    }

    #[test]
    fn test_min_defect() {
        // 3 px / 10 px/mm = 0.3 mm
        assert_abs_diff_eq!(
            value(min_detectable_defect(10.0, DEFAULT_REQUIRED_PX)),
            0.3,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(value(min_detectable_defect(10.0, 5)), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_unresolved_inputs_are_not_computable() {
        assert_eq!(resolution_density(2048, 0.0), Computed::NotComputable);
        assert_eq!(resolution_density(2048, -5.0), Computed::NotComputable);
        assert_eq!(min_detectable_defect(0.0, 3), Computed::NotComputable);
        assert_eq!(min_detectable_defect(-1.0, 3), Computed::NotComputable);
    }

    #[test]
    fn test_non_finite_inputs_are_not_computable() {
        assert_eq!(resolution_density(2048, f64::INFINITY), Computed::NotComputable);
        assert_eq!(resolution_density(2048, f64::NAN), Computed::NotComputable);
        // density overflows
        assert_eq!(resolution_density(2048, 1e-320), Computed::NotComputable);
        assert_eq!(min_detectable_defect(f64::INFINITY, 3), Computed::NotComputable);
        assert_eq!(min_detectable_defect(10.0, 0), Computed::NotComputable);
    }

    #[test]
    fn test_motion_blur() {
        let blur = motion_blur(1.0, 0.001, 10.24, 5.5).unwrap();
        assert_abs_diff_eq!(blur.object_mm, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(value(blur.px), 10.24, epsilon = 1e-9);
        assert_abs_diff_eq!(value(blur.sensor_um), 56.32, epsilon = 1e-9);
    }

    #[test]
    fn test_motion_blur_without_density_keeps_object_blur() {
        let blur = motion_blur(2.0, 0.0005, 0.0, 5.5).unwrap();
        assert_abs_diff_eq!(blur.object_mm, 1.0, epsilon = 1e-12);
        assert_eq!(blur.px, Computed::NotComputable);
        assert_eq!(blur.sensor_um, Computed::NotComputable);
    }

    #[test]
    fn test_motion_blur_rejects_negative_inputs() {
        assert!(motion_blur(-1.0, 0.001, 10.0, 5.5).is_err());
        assert!(motion_blur(1.0, -0.001, 10.0, 5.5).is_err());
        assert!(motion_blur(1.0, f64::NAN, 10.0, 5.5).is_err());
        assert!(Motion::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_compute_all_metrics() {
        let motion = Motion::new(1.0, 0.001).unwrap();
        let metrics =
            DerivedMetrics::compute(Some(200.0), 2048, 5.5, Some(motion), DEFAULT_REQUIRED_PX)
                .unwrap();

        assert_abs_diff_eq!(value(metrics.px_per_mm), 10.24, epsilon = 1e-12);
        assert_abs_diff_eq!(value(metrics.min_defect_mm), 3.0 / 10.24, epsilon = 1e-12);
        assert_abs_diff_eq!(value(metrics.blur_object_mm), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(value(metrics.blur_px), 10.24, epsilon = 1e-9);
        assert_abs_diff_eq!(value(metrics.blur_sensor_um), 56.32, epsilon = 1e-9);
        // sensor width 11.264 mm over 200 mm
        assert_abs_diff_eq!(value(metrics.magnification), 0.05632, epsilon = 1e-12);
    }

    #[test]
    fn test_compute_with_undefined_fov() {
        let motion = Motion::new(1.0, 0.001).unwrap();
        let metrics = DerivedMetrics::compute(None, 2048, 5.5, Some(motion), 3).unwrap();

        assert_eq!(metrics.px_per_mm, Computed::NotComputable);
        assert_eq!(metrics.min_defect_mm, Computed::NotComputable);
        assert_eq!(metrics.magnification, Computed::NotComputable);
        assert_abs_diff_eq!(value(metrics.blur_object_mm), 1.0, epsilon = 1e-12);
        assert_eq!(metrics.blur_px, Computed::NotComputable);
    }

    #[test]
    fn test_display_placeholder() {
        assert_eq!(format!("{:.3}", Computed::Value(10.24)), "10.240");
        assert_eq!(format!("{:.3}", Computed::NotComputable), "N/A");
    }

    #[test]
    fn test_serializes_as_number_or_null() {
        let json = serde_json::to_string(&[Computed::Value(1.5), Computed::NotComputable]).unwrap();
        assert_eq!(json, "[1.5,null]");
    }
}
