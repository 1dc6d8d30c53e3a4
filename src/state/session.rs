/// Configuration session and its update protocol
///
/// A session owns the current camera/lens selection, the optical triple,
/// the lock flags, the kinematic inputs and the derived metrics. Every
/// external event (field commit, lock toggle, selection, motion change,
/// reset) runs exactly one settle pass:
///
/// ```text
/// event → apply to a candidate copy → solve → derive metrics → store → write back
/// ```
///
/// The candidate only replaces the live state if the whole pass succeeds,
/// so a rejected event leaves nothing behind. While a pass runs, the
/// re-entrancy guard is held: events produced by the write-back (what a
/// live form emits when its fields are rewritten) are dropped instead of
/// starting a second pass.

use log::{debug, info, warn};
use serde::Serialize;

use super::catalog::{Catalog, CatalogRepository};
use super::data::{CameraProfile, LensProfile};
use super::validation::{check_field_value, parse_field_value};
use crate::config::Settings;
use crate::error::SessionError;
use crate::optics::metrics::{DerivedMetrics, Motion};
use crate::optics::params::{Field, Locks, OpticalParams};
use crate::optics::solver::solve;

/// An external event driving one settle pass
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A field was edited; `None` clears it
    CommitEdit { field: Field, value: Option<f64> },
    ToggleLock(Field),
    SelectCamera(String),
    SelectLens(String),
    /// Object speed and exposure; `None` clears them
    SetMotion(Option<Motion>),
    Reset,
}

/// Result of a settle pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Settled {
    pub params: OpticalParams,
    pub locks: Locks,
    pub metrics: DerivedMetrics,
}

/// Receives every settled state, typically to refresh a form
///
/// Returned events are dispatched back into the session while the settle
/// pass still holds its guard, so they are dropped.
pub trait WriteBack {
    fn write_back(&mut self, settled: &Settled) -> Vec<SessionEvent>;
}

/// Everything one event may change, swapped in as a whole
#[derive(Debug, Clone)]
struct SessionFields {
    camera: Option<CameraProfile>,
    lens: Option<LensProfile>,
    params: OpticalParams,
    locks: Locks,
    motion: Option<Motion>,
    metrics: DerivedMetrics,
}

impl SessionFields {
    fn fresh(default_wd_mm: f64) -> Self {
        Self {
            camera: None,
            lens: None,
            params: OpticalParams::with_wd(default_wd_mm),
            locks: Locks::default(),
            motion: None,
            metrics: DerivedMetrics::not_computable(),
        }
    }
}

pub struct Session {
    cameras: Catalog<CameraProfile>,
    lenses: Catalog<LensProfile>,
    settings: Settings,
    current: SessionFields,
    /// Re-entrancy guard, held for the duration of one settle pass
    settling: bool,
    write_back: Option<Box<dyn WriteBack + Send>>,
    settle_count: u64,
    dropped_events: u64,
}

impl Session {
    /// Create a session over catalog snapshots and settle it once from a reset
    pub fn new(
        cameras: Catalog<CameraProfile>,
        lenses: Catalog<LensProfile>,
        settings: Settings,
    ) -> Result<Self, SessionError> {
        settings.validate()?;
        if cameras.is_empty() {
            info!("No camera in catalog, select one after adding it");
        }

        let mut session = Self {
            cameras,
            lenses,
            current: SessionFields::fresh(settings.default_wd_mm),
            settings,
            settling: false,
            write_back: None,
            settle_count: 0,
            dropped_events: 0,
        };
        session.reset()?;
        Ok(session)
    }

    /// Load both catalogs from a repository and create a session over them
    pub fn from_repository(
        repo: &dyn CatalogRepository,
        settings: Settings,
    ) -> Result<Self, SessionError> {
        Self::new(repo.load_cameras()?, repo.load_lenses()?, settings)
    }

    /// Install the write-back sink
    pub fn set_write_back(&mut self, sink: Box<dyn WriteBack + Send>) {
        self.write_back = Some(sink);
    }

    /// Replace the catalog snapshots. The current selection is kept as is.
    pub fn reload(&mut self, repo: &dyn CatalogRepository) -> Result<(), SessionError> {
        let cameras = repo.load_cameras()?;
        let lenses = repo.load_lenses()?;
        self.cameras = cameras;
        self.lenses = lenses;
        Ok(())
    }

    // ----------------------------
    // Boundary operations
    // ----------------------------

    /// Commit a numeric edit of one field
    pub fn commit_edit(&mut self, field: Field, value: f64) -> Result<Settled, SessionError> {
        let value = check_field_value(field, value)?;
        self.handle(SessionEvent::CommitEdit {
            field,
            value: Some(value),
        })
    }

    /// Commit the text of one field; blank text clears it
    pub fn commit_text(&mut self, field: Field, text: &str) -> Result<Settled, SessionError> {
        let value = parse_field_value(field, text)?;
        self.handle(SessionEvent::CommitEdit { field, value })
    }

    pub fn toggle_lock(&mut self, field: Field) -> Result<Settled, SessionError> {
        self.handle(SessionEvent::ToggleLock(field))
    }

    pub fn select_camera(&mut self, name: &str) -> Result<Settled, SessionError> {
        self.handle(SessionEvent::SelectCamera(name.to_string()))
    }

    pub fn select_lens(&mut self, name: &str) -> Result<Settled, SessionError> {
        self.handle(SessionEvent::SelectLens(name.to_string()))
    }

    /// Set object speed (m/s) and exposure time (s) for motion blur
    pub fn set_motion(&mut self, speed_m_s: f64, exposure_s: f64) -> Result<Settled, SessionError> {
        let motion = Motion::new(speed_m_s, exposure_s)?;
        self.handle(SessionEvent::SetMotion(Some(motion)))
    }

    pub fn clear_motion(&mut self) -> Result<Settled, SessionError> {
        self.handle(SessionEvent::SetMotion(None))
    }

    pub fn reset(&mut self) -> Result<Settled, SessionError> {
        self.handle(SessionEvent::Reset)
    }

    /// Run one event through the session
    ///
    /// Returns `Ok(None)` when the event was dropped because a settle pass
    /// is already running.
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Option<Settled>, SessionError> {
        if self.settling {
            self.dropped_events += 1;
            warn!("Dropping re-entrant event during settle pass: {:?}", event);
            return Ok(None);
        }

        self.settling = true;
        let result = self.settle(event);
        if let Ok(settled) = &result {
            self.run_write_back(settled);
        }
        self.settling = false;

        result.map(Some)
    }

    fn handle(&mut self, event: SessionEvent) -> Result<Settled, SessionError> {
        self.dispatch(event)?.ok_or(SessionError::SettleInProgress)
    }

    // ----------------------------
    // Settle pass
    // ----------------------------

    fn settle(&mut self, event: SessionEvent) -> Result<Settled, SessionError> {
        let mut next = self.current.clone();
        self.apply(&mut next, event)?;

        match &next.camera {
            Some(camera) => {
                let sensor_mm = camera.sensor_width_mm();
                debug!(
                    "Settling with sensor {:.3} mm, locks {:?}",
                    sensor_mm,
                    next.locks.pattern()
                );
                next.params = solve(next.params, next.locks, sensor_mm).map_err(|e| {
                    warn!("Degenerate geometry, event rejected: {}", e);
                    e
                })?;
                next.metrics = DerivedMetrics::compute(
                    next.params.fov_mm,
                    camera.resolution_x,
                    camera.pixel_size_um,
                    next.motion,
                    self.settings.required_defect_px,
                )?;
            }
            None => {
                // sensor width unknown: nothing can be solved or derived
                next.metrics = DerivedMetrics::not_computable();
            }
        }

        self.current = next;
        self.settle_count += 1;
        Ok(self.settled())
    }

    /// Apply the raw effect of an event to the candidate state
    fn apply(&self, next: &mut SessionFields, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::CommitEdit { field, value } => {
                debug!("Commit {} = {:?}", field, value);
                next.params.set(field, value);
            }
            SessionEvent::ToggleLock(field) => {
                let locked = next.locks.toggle(field);
                debug!("Lock {} -> {}", field, locked);
            }
            SessionEvent::SelectCamera(name) => {
                let camera = self
                    .cameras
                    .get(&name)
                    .ok_or_else(|| SessionError::UnknownCamera(name.clone()))?;
                info!(
                    "📷 Camera '{}': {} x {} px, sensor {:.3} x {:.3} mm",
                    camera.name,
                    camera.resolution_x,
                    camera.resolution_y,
                    camera.sensor_width_mm(),
                    camera.sensor_height_mm()
                );
                next.camera = Some(camera.clone());
            }
            SessionEvent::SelectLens(name) => {
                let lens = self
                    .lenses
                    .get(&name)
                    .ok_or_else(|| SessionError::UnknownLens(name.clone()))?;
                info!("🔭 Lens '{}': focal {:.3} mm", lens.name, lens.focal_length_mm);
                // the lens focal length is authoritative
                next.params.focal_mm = Some(lens.focal_length_mm);
                next.locks.focal = true;
                next.lens = Some(lens.clone());
            }
            SessionEvent::SetMotion(motion) => {
                next.motion = motion;
            }
            SessionEvent::Reset => {
                next.params.reset(self.settings.default_wd_mm);
                next.locks.reset();
                next.lens = None;
                next.motion = None;
                next.metrics = DerivedMetrics::not_computable();
                next.camera = self.cameras.first().cloned();
                if let Some(camera) = &next.camera {
                    debug!("Reset, selecting first camera '{}'", camera.name);
                }
            }
        }
        Ok(())
    }

    fn run_write_back(&mut self, settled: &Settled) {
        let Some(mut sink) = self.write_back.take() else {
            return;
        };
        let echoes = sink.write_back(settled);
        self.write_back = Some(sink);

        for event in echoes {
            // guard is still held, so this only counts the drop
            let outcome = self.dispatch(event);
            debug_assert!(matches!(outcome, Ok(None)));
        }
    }

    // ----------------------------
    // Accessors
    // ----------------------------

    pub fn settled(&self) -> Settled {
        Settled {
            params: self.current.params,
            locks: self.current.locks,
            metrics: self.current.metrics,
        }
    }

    pub fn camera(&self) -> Option<&CameraProfile> {
        self.current.camera.as_ref()
    }

    pub fn lens(&self) -> Option<&LensProfile> {
        self.current.lens.as_ref()
    }

    pub fn params(&self) -> &OpticalParams {
        &self.current.params
    }

    pub fn locks(&self) -> &Locks {
        &self.current.locks
    }

    pub fn motion(&self) -> Option<Motion> {
        self.current.motion
    }

    pub fn metrics(&self) -> &DerivedMetrics {
        &self.current.metrics
    }

    pub fn cameras(&self) -> &Catalog<CameraProfile> {
        &self.cameras
    }

    pub fn lenses(&self) -> &Catalog<LensProfile> {
        &self.lenses
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of completed settle passes
    pub fn settle_count(&self) -> u64 {
        self.settle_count
    }

    /// Number of events dropped by the re-entrancy guard
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("camera", &self.current.camera.as_ref().map(|c| &c.name))
            .field("lens", &self.current.lens.as_ref().map(|l| &l.name))
            .field("params", &self.current.params)
            .field("locks", &self.current.locks)
            .field("settle_count", &self.settle_count)
            .finish()
    }
}
