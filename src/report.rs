/// Presentation of a settled session
///
/// Renders the same rows the configurator form shows: camera details,
/// the three optical fields with their locks, and the derived metrics.
/// Undefined fields render as "-" and non-computable metrics as "N/A".

use serde::Serialize;
use std::fmt::Write;

use crate::optics::metrics::{Computed, DerivedMetrics};
use crate::optics::params::{Field, Locks, OpticalParams};
use crate::state::session::Session;

/// Machine-readable snapshot of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub sensor_width_mm: Option<f64>,
    pub sensor_height_mm: Option<f64>,
    pub params: OpticalParams,
    pub locks: Locks,
    pub metrics: DerivedMetrics,
    pub required_defect_px: u32,
}

impl SessionReport {
    pub fn from_session(session: &Session) -> Self {
        let camera = session.camera();
        Self {
            camera: camera.map(|c| c.name.clone()),
            lens: session.lens().map(|l| l.name.clone()),
            sensor_width_mm: camera.map(|c| c.sensor_width_mm()),
            sensor_height_mm: camera.map(|c| c.sensor_height_mm()),
            params: *session.params(),
            locks: *session.locks(),
            metrics: *session.metrics(),
            required_defect_px: session.settings().required_defect_px,
        }
    }
}

/// Render the session as aligned label/value rows
pub fn render(session: &Session) -> String {
    let mut rows: Vec<(String, String)> = Vec::new();

    match session.camera() {
        Some(cam) => {
            rows.push(("Camera".into(), cam.name.clone()));
            rows.push(("Pixel size (µm)".into(), format!("{:.3}", cam.pixel_size_um)));
            rows.push((
                "Resolution (px)".into(),
                format!("{} × {}", cam.resolution_x, cam.resolution_y),
            ));
            rows.push((
                "Sensor size (mm)".into(),
                format!("{:.3} × {:.3}", cam.sensor_width_mm(), cam.sensor_height_mm()),
            ));
            rows.push((
                "Sensor diagonal (mm)".into(),
                format!("{:.3}", cam.sensor_diagonal_mm()),
            ));
        }
        None => rows.push(("Camera".into(), "-".into())),
    }

    let lens = match session.lens() {
        Some(lens) => format!("{} ({}, {})", lens.name, lens.mount, lens.aperture),
        None => "-".into(),
    };
    rows.push(("Lens".into(), lens));

    let params = session.params();
    let locks = session.locks();
    for field in Field::ALL {
        let value = format_mm(params.get(field));
        let value = if locks.get(field) {
            format!("{} [locked]", value)
        } else {
            value
        };
        rows.push((field.label().into(), value));
    }

    let metrics = session.metrics();
    let required_px = session.settings().required_defect_px;
    rows.push(("px / mm (X)".into(), format!("{:.3}", metrics.px_per_mm)));
    rows.push((
        format!("Min defect ({} px)", required_px),
        format_um(metrics.min_defect_mm),
    ));
    rows.push(("Magnification".into(), format!("{:.4}", metrics.magnification)));
    rows.push(("Blur (mm)".into(), format!("{:.3}", metrics.blur_object_mm)));
    rows.push(("Blur (px)".into(), format!("{:.2}", metrics.blur_px)));
    rows.push(("Blur on sensor (µm)".into(), format!("{:.2}", metrics.blur_sensor_um)));

    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0) + 1;
    let mut out = String::new();
    for (label, value) in rows {
        let pad = width - label.chars().count();
        let _ = writeln!(out, "{}:{}{}", label, " ".repeat(pad), value);
    }
    out
}

/// Millimeters with three decimals, "-" while undefined
pub fn format_mm(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

/// A length in mm shown in micrometers
pub fn format_um(value_mm: Computed) -> String {
    match value_mm {
        Computed::Value(mm) => format!("{:.1} µm", mm * 1000.0),
        Computed::NotComputable => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::state::catalog::Catalog;
    use crate::state::data::CameraProfile;

    fn session() -> Session {
        let cam = CameraProfile {
            name: "cam".to_string(),
            resolution_x: 2048,
            resolution_y: 1536,
            pixel_size_um: 2.9296875,
            shutter: "global".to_string(),
            notes: String::new(),
        };
        Session::new(Catalog::new(vec![cam]), Catalog::default(), Settings::default()).unwrap()
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_mm(Some(200.0)), "200.000");
        assert_eq!(format_mm(None), "-");
        assert_eq!(format_um(Computed::Value(0.3)), "300.0 µm");
        assert_eq!(format_um(Computed::NotComputable), "N/A");
    }

    #[test]
    fn test_render_unresolved_session() {
        let text = render(&session());
        assert!(text.contains("Camera"));
        assert!(text.contains("6.000 × 4.500"));
        assert!(text.contains("7.500"));
        assert!(text.contains("200.000"));
        assert!(text.contains("Min defect (3 px)"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn test_render_resolved_session() {
        let mut s = session();
        s.commit_edit(Field::Focal, 12.0).unwrap();
        s.toggle_lock(Field::Wd).unwrap();
        s.toggle_lock(Field::Focal).unwrap();

        let text = render(&s);
        assert!(text.contains("100.000"));
        assert!(text.contains("[locked]"));
        // 2048 / 100 mm = 20.48 px/mm, 3 px → 146.5 µm
        assert!(text.contains("20.480"));
        assert!(text.contains("146.5 µm"));
    }

    #[test]
    fn test_report_serializes() {
        let report = SessionReport::from_session(&session());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["camera"], "cam");
        assert_eq!(json["params"]["wd_mm"], 200.0);
        assert!(json["params"]["fov_mm"].is_null());
        assert!(json["metrics"]["px_per_mm"].is_null());
    }
}
