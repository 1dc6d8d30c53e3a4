/// Shared data structures for the application state
///
/// These structs are the catalog records handed to a session: read-only
/// snapshots of one camera body or one lens, as stored in the JSON
/// catalogs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a single camera body in the catalog
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CameraProfile {
    /// Unique name (e.g., "acA2440-20gm")
    pub name: String,
    /// Horizontal resolution in pixels
    pub resolution_x: u32,
    /// Vertical resolution in pixels
    pub resolution_y: u32,
    /// Pixel pitch in micrometers
    pub pixel_size_um: f64,
    /// Shutter type: "global", "rolling", ...
    #[serde(default)]
    pub shutter: String,
    #[serde(default)]
    pub notes: String,
}

impl CameraProfile {
    /// Physical sensor width: `pixel_size_um * resolution_x / 1000`
    pub fn sensor_width_mm(&self) -> f64 {
        self.pixel_size_um * self.resolution_x as f64 / 1000.0
    }

    /// Physical sensor height: `pixel_size_um * resolution_y / 1000`
    pub fn sensor_height_mm(&self) -> f64 {
        self.pixel_size_um * self.resolution_y as f64 / 1000.0
    }

    pub fn sensor_diagonal_mm(&self) -> f64 {
        self.sensor_width_mm().hypot(self.sensor_height_mm())
    }
}

/// Lens aperture: an f-number when known, free text otherwise ("f/1.4-16")
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Aperture {
    FNumber(f64),
    Text(String),
}

impl Default for Aperture {
    fn default() -> Self {
        Aperture::Text(String::new())
    }
}

impl Aperture {
    /// Keep numeric input as an f-number ("2.8" or "f/2.8"), anything else as text
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let numeric = trimmed
            .strip_prefix("f/")
            .or_else(|| trimmed.strip_prefix("F/"))
            .unwrap_or(trimmed);
        match numeric.parse::<f64>() {
            Ok(n) if n.is_finite() && n > 0.0 => Aperture::FNumber(n),
            _ => Aperture::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for Aperture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aperture::FNumber(n) => write!(f, "f/{}", n),
            Aperture::Text(t) => f.write_str(t),
        }
    }
}

/// Represents a single lens (objective) in the catalog
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LensProfile {
    /// Unique name
    pub name: String,
    /// Focal length in millimeters
    #[serde(rename = "focal_length")]
    pub focal_length_mm: f64,
    /// Mount type: "C", "CS", "M12", ...
    #[serde(default)]
    pub mount: String,
    /// Largest image circle the lens covers (mm)
    ///
    /// Older catalogs spell the key `max_image_cirle`.
    #[serde(rename = "max_image_circle", alias = "max_image_cirle")]
    pub max_image_circle_mm: f64,
    #[serde(default)]
    pub aperture: Aperture,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera(pixel_size_um: f64, resolution_x: u32, resolution_y: u32) -> CameraProfile {
        CameraProfile {
            name: "test".to_string(),
            resolution_x,
            resolution_y,
            pixel_size_um,
            shutter: "global".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_sensor_size() {
        let cam = camera(5.5, 2448, 2048);
        assert_abs_diff_eq!(cam.sensor_width_mm(), 13.464, epsilon = 1e-3);
        assert_abs_diff_eq!(cam.sensor_height_mm(), 11.264, epsilon = 1e-3);
        assert_abs_diff_eq!(cam.sensor_diagonal_mm(), 17.554, epsilon = 1e-3);
    }

    #[test]
    fn test_camera_document_keys() {
        let json = r#"{"name": "cam", "resolution_x": 2048, "resolution_y": 1536,
                       "pixel_size_um": 3.45, "shutter": "global", "notes": ""}"#;
        let cam: CameraProfile = serde_json::from_str(json).unwrap();
        assert_eq!(cam.resolution_x, 2048);
        assert_eq!(cam.pixel_size_um, 3.45);
    }

    #[test]
    fn test_lens_reads_legacy_image_circle_key() {
        let json = r#"{"name": "lens", "focal_length": 16.0, "mount": "C",
                       "max_image_cirle": 11.0, "aperture": "f/1.4-16"}"#;
        let lens: LensProfile = serde_json::from_str(json).unwrap();
        assert_eq!(lens.max_image_circle_mm, 11.0);
        assert_eq!(lens.aperture, Aperture::Text("f/1.4-16".to_string()));

        let written = serde_json::to_string(&lens).unwrap();
        assert!(written.contains("\"max_image_circle\":11.0"));
        assert!(written.contains("\"focal_length\":16.0"));
    }

    #[test]
    fn test_aperture_parse() {
        assert_eq!(Aperture::parse("2.8"), Aperture::FNumber(2.8));
        assert_eq!(Aperture::parse("f/1.4"), Aperture::FNumber(1.4));
        assert_eq!(Aperture::parse("1.4-16"), Aperture::Text("1.4-16".to_string()));
        assert_eq!(Aperture::FNumber(2.8).to_string(), "f/2.8");
    }

    #[test]
    fn test_aperture_accepts_number_or_text() {
        let n: Aperture = serde_json::from_str("4.0").unwrap();
        let t: Aperture = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(n, Aperture::FNumber(4.0));
        assert_eq!(t, Aperture::Text("manual".to_string()));
    }
}
