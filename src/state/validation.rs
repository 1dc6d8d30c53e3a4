/// Validation of raw form input
///
/// Catalog records and field commits arrive as text. Everything is parsed
/// and checked here before any state or file is touched.

use super::data::{Aperture, CameraProfile, LensProfile};
use crate::error::ValidationError;
use crate::optics::params::Field;

/// Text entered for a new camera
#[derive(Debug, Clone, Default)]
pub struct CameraForm {
    pub name: String,
    pub resolution_x: String,
    pub resolution_y: String,
    pub pixel_size_um: String,
    pub shutter: String,
    pub notes: String,
}

impl CameraForm {
    pub fn parse(&self) -> Result<CameraProfile, ValidationError> {
        Ok(CameraProfile {
            name: parse_name(&self.name)?,
            resolution_x: parse_positive_int("resolution_x", &self.resolution_x)?,
            resolution_y: parse_positive_int("resolution_y", &self.resolution_y)?,
            pixel_size_um: parse_positive_float("pixel_size_um", &self.pixel_size_um)?,
            shutter: self.shutter.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Text entered for a new lens
#[derive(Debug, Clone, Default)]
pub struct LensForm {
    pub name: String,
    pub focal_length: String,
    pub mount: String,
    pub max_image_circle: String,
    pub aperture: String,
}

impl LensForm {
    pub fn parse(&self) -> Result<LensProfile, ValidationError> {
        Ok(LensProfile {
            name: parse_name(&self.name)?,
            focal_length_mm: parse_positive_float("focal_length", &self.focal_length)?,
            mount: self.mount.trim().to_string(),
            max_image_circle_mm: parse_positive_float("max_image_circle", &self.max_image_circle)?,
            aperture: Aperture::parse(&self.aperture),
        })
    }
}

/// Check a profile built in code (not from a form) before it is persisted
pub fn check_camera(camera: &CameraProfile) -> Result<(), ValidationError> {
    parse_name(&camera.name)?;
    if camera.resolution_x == 0 {
        return Err(not_positive_int("resolution_x", camera.resolution_x));
    }
    if camera.resolution_y == 0 {
        return Err(not_positive_int("resolution_y", camera.resolution_y));
    }
    check_positive("pixel_size_um", camera.pixel_size_um)
}

/// Check a lens built in code before it is persisted
pub fn check_lens(lens: &LensProfile) -> Result<(), ValidationError> {
    parse_name(&lens.name)?;
    check_positive("focal_length", lens.focal_length_mm)?;
    check_positive("max_image_circle", lens.max_image_circle_mm)
}

/// Parse text committed into one of the optical fields
///
/// Blank text clears the field (`None`). Zero is accepted; negative,
/// non-finite or unparsable input is rejected.
pub fn parse_field_value(field: Field, text: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) => check_field_value(field, v).map(Some),
        Err(_) => Err(invalid(field, trimmed)),
    }
}

/// Check a numeric value committed into one of the optical fields
pub fn check_field_value(field: Field, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(field, &value.to_string()))
    }
}

fn invalid(field: Field, input: &str) -> ValidationError {
    let field = match field {
        Field::Wd => "wd_mm",
        Field::Focal => "focal_mm",
        Field::Fov => "fov_mm",
    };
    ValidationError::InvalidValue {
        field,
        input: input.to_string(),
    }
}

fn parse_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

fn parse_positive_int(field: &'static str, input: &str) -> Result<u32, ValidationError> {
    match input.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ValidationError::NotPositiveInteger {
            field,
            input: input.to_string(),
        }),
    }
}

fn parse_positive_float(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    match input.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ValidationError::NotPositiveFloat {
            field,
            input: input.to_string(),
        }),
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositiveFloat {
            field,
            input: value.to_string(),
        })
    }
}

fn not_positive_int(field: &'static str, value: u32) -> ValidationError {
    ValidationError::NotPositiveInteger {
        field,
        input: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_form() -> CameraForm {
        CameraForm {
            name: " acA2440-20gm ".to_string(),
            resolution_x: "2448".to_string(),
            resolution_y: "2048".to_string(),
            pixel_size_um: "3.45".to_string(),
            shutter: "global".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_camera_form_parses() {
        let cam = camera_form().parse().unwrap();
        assert_eq!(cam.name, "acA2440-20gm");
        assert_eq!(cam.resolution_x, 2448);
        assert_eq!(cam.resolution_y, 2048);
        assert_eq!(cam.pixel_size_um, 3.45);
    }

    #[test]
    fn test_camera_form_rejects_bad_numbers() {
        let mut form = camera_form();
        form.resolution_x = "2448.5".to_string();
        assert!(matches!(
            form.parse(),
            Err(ValidationError::NotPositiveInteger { field: "resolution_x", .. })
        ));

        let mut form = camera_form();
        form.resolution_y = "0".to_string();
        assert!(matches!(
            form.parse(),
            Err(ValidationError::NotPositiveInteger { field: "resolution_y", .. })
        ));

        let mut form = camera_form();
        form.pixel_size_um = "-3.45".to_string();
        assert!(matches!(
            form.parse(),
            Err(ValidationError::NotPositiveFloat { field: "pixel_size_um", .. })
        ));

        let mut form = camera_form();
        form.name = "   ".to_string();
        assert_eq!(form.parse(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_lens_form() {
        let form = LensForm {
            name: "Fujinon HF16HA".to_string(),
            focal_length: "16".to_string(),
            mount: "C".to_string(),
            max_image_circle: "11".to_string(),
            aperture: "1.4".to_string(),
        };
        let lens = form.parse().unwrap();
        assert_eq!(lens.focal_length_mm, 16.0);
        assert_eq!(lens.aperture, Aperture::FNumber(1.4));

        let bad = LensForm {
            max_image_circle: "nan".to_string(),
            ..form
        };
        assert!(matches!(
            bad.parse(),
            Err(ValidationError::NotPositiveFloat { field: "max_image_circle", .. })
        ));
    }

    #[test]
    fn test_field_values() {
        assert_eq!(parse_field_value(Field::Wd, " 400 "), Ok(Some(400.0)));
        assert_eq!(parse_field_value(Field::Fov, ""), Ok(None));
        assert_eq!(parse_field_value(Field::Focal, "0"), Ok(Some(0.0)));
        assert!(parse_field_value(Field::Focal, "abc").is_err());
        assert!(parse_field_value(Field::Wd, "-1").is_err());
        assert!(parse_field_value(Field::Wd, "inf").is_err());
    }

    #[test]
    fn test_check_profiles() {
        let mut cam = camera_form().parse().unwrap();
        assert!(check_camera(&cam).is_ok());
        cam.pixel_size_um = 0.0;
        assert!(check_camera(&cam).is_err());
    }
}
