/// The optical triple and its lock flags
///
/// The triple (working distance, focal length, field of view) is the set of
/// unknowns the solver works on. Each value is either a positive number or
/// explicitly undefined (`None`) until first resolved; undefined is never
/// stored as zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Working distance a fresh session starts with (mm)
pub const DEFAULT_WD_MM: f64 = 200.0;

/// One of the three optical unknowns
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Wd,
    Focal,
    Fov,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Wd, Field::Focal, Field::Fov];

    pub fn name(self) -> &'static str {
        match self {
            Field::Wd => "wd",
            Field::Focal => "focal",
            Field::Fov => "fov",
        }
    }

    /// Form label, as shown next to the input
    pub fn label(self) -> &'static str {
        match self {
            Field::Wd => "WD (mm)",
            Field::Focal => "Focal (mm)",
            Field::Fov => "FOV (mm)",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wd" => Ok(Field::Wd),
            "focal" => Ok(Field::Focal),
            "fov" => Ok(Field::Fov),
            other => Err(format!("unknown field '{}' (expected wd, focal or fov)", other)),
        }
    }
}

/// The working distance / focal length / FOV triple
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OpticalParams {
    /// Working distance: lens to observed object (mm)
    pub wd_mm: Option<f64>,
    /// Lens focal length (mm)
    pub focal_mm: Option<f64>,
    /// Horizontal field of view at the object plane (mm)
    pub fov_mm: Option<f64>,
}

impl Default for OpticalParams {
    /// Working distance at its default, focal and FOV undefined
    fn default() -> Self {
        Self::with_wd(DEFAULT_WD_MM)
    }
}

impl OpticalParams {
    /// Start from a given working distance, focal and FOV undefined
    pub fn with_wd(wd_mm: f64) -> Self {
        Self {
            wd_mm: Some(wd_mm),
            focal_mm: None,
            fov_mm: None,
        }
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Wd => self.wd_mm,
            Field::Focal => self.focal_mm,
            Field::Fov => self.fov_mm,
        }
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        match field {
            Field::Wd => self.wd_mm = value,
            Field::Focal => self.focal_mm = value,
            Field::Fov => self.fov_mm = value,
        }
    }

    /// Check `fov * focal == sensor * wd` within a relative tolerance
    ///
    /// Returns `false` while any value is undefined.
    pub fn is_consistent(&self, sensor_mm: f64, tolerance: f64) -> bool {
        match (self.wd_mm, self.focal_mm, self.fov_mm) {
            (Some(wd), Some(focal), Some(fov)) => {
                let lhs = fov * focal;
                let rhs = sensor_mm * wd;
                (lhs - rhs).abs() <= tolerance * lhs.abs().max(rhs.abs()).max(1.0)
            }
            _ => false,
        }
    }

    /// Reset to the starting triple
    pub fn reset(&mut self, default_wd_mm: f64) {
        *self = Self::with_wd(default_wd_mm);
    }
}

/// Which of the triple the user has fixed as inputs
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Locks {
    pub wd: bool,
    pub focal: bool,
    pub fov: bool,
}

/// The eight lock combinations, grouped by what the solver can do with them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPattern {
    /// Under-constrained: nothing to solve
    ZeroOrOneLocked,
    /// Exactly one unknown, derivable from the other two
    TwoLocked { unlocked: Field },
    /// Over-constrained: values are taken as given
    AllLocked,
}

impl Locks {
    pub fn get(&self, field: Field) -> bool {
        match field {
            Field::Wd => self.wd,
            Field::Focal => self.focal,
            Field::Fov => self.fov,
        }
    }

    pub fn set(&mut self, field: Field, locked: bool) {
        match field {
            Field::Wd => self.wd = locked,
            Field::Focal => self.focal = locked,
            Field::Fov => self.fov = locked,
        }
    }

    /// Flip one lock and return its new state
    pub fn toggle(&mut self, field: Field) -> bool {
        let locked = !self.get(field);
        self.set(field, locked);
        locked
    }

    pub fn count(&self) -> usize {
        Field::ALL.iter().filter(|&&f| self.get(f)).count()
    }

    pub fn pattern(&self) -> LockPattern {
        match (self.wd, self.focal, self.fov) {
            (true, true, true) => LockPattern::AllLocked,
            (true, true, false) => LockPattern::TwoLocked { unlocked: Field::Fov },
            (true, false, true) => LockPattern::TwoLocked { unlocked: Field::Focal },
            (false, true, true) => LockPattern::TwoLocked { unlocked: Field::Wd },
            _ => LockPattern::ZeroOrOneLocked,
        }
    }

    /// Clear all locks
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
