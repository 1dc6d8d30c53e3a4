/// Session shared between threads
///
/// A settle pass reads and writes several fields that must look atomic to
/// other callers, so the whole pass runs under one exclusive lock. Inside
/// the lock the session's own re-entrancy guard still applies.

use parking_lot::Mutex;
use std::sync::Arc;

use super::session::{Session, SessionEvent, Settled};
use crate::error::SessionError;
use crate::optics::params::Field;

#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.inner.lock();
        f(&mut session)
    }

    pub fn dispatch(&self, event: SessionEvent) -> Result<Option<Settled>, SessionError> {
        self.inner.lock().dispatch(event)
    }

    pub fn commit_edit(&self, field: Field, value: f64) -> Result<Settled, SessionError> {
        self.inner.lock().commit_edit(field, value)
    }

    pub fn toggle_lock(&self, field: Field) -> Result<Settled, SessionError> {
        self.inner.lock().toggle_lock(field)
    }

    pub fn select_camera(&self, name: &str) -> Result<Settled, SessionError> {
        self.inner.lock().select_camera(name)
    }

    pub fn select_lens(&self, name: &str) -> Result<Settled, SessionError> {
        self.inner.lock().select_lens(name)
    }

    pub fn reset(&self) -> Result<Settled, SessionError> {
        self.inner.lock().reset()
    }

    pub fn settled(&self) -> Settled {
        self.inner.lock().settled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::state::catalog::Catalog;
    use crate::state::data::CameraProfile;
    use std::thread;

    fn camera() -> CameraProfile {
        CameraProfile {
            name: "cam".to_string(),
            resolution_x: 2000,
            resolution_y: 1000,
            pixel_size_um: 3.0,
            shutter: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_concurrent_edits_stay_consistent() {
        let session = Session::new(
            Catalog::new(vec![camera()]),
            Catalog::default(),
            Settings::default(),
        )
        .unwrap();
        let shared = SharedSession::new(session);
        shared.commit_edit(Field::Focal, 12.0).unwrap();
        shared.toggle_lock(Field::Wd).unwrap();
        shared.toggle_lock(Field::Focal).unwrap();

        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        shared.commit_edit(Field::Wd, (i * 100 + j) as f64).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 6 mm sensor
        let settled = shared.settled();
        assert!(settled.params.is_consistent(6.0, 1e-9));
        assert_eq!(shared.with(|s| s.settle_count()), 1 + 3 + 8 * 50);
        assert_eq!(shared.with(|s| s.dropped_events()), 0);
    }
}
