/// State management module
///
/// This module handles all session state, including:
/// - Camera and lens records (data.rs)
/// - JSON-backed catalogs (catalog.rs)
/// - Validation of form input (validation.rs)
/// - The session and its settle pass (session.rs)
/// - Thread-safe session wrapper (shared.rs)

pub mod catalog;
pub mod data;
pub mod session;
pub mod shared;
pub mod validation;

pub use catalog::{Catalog, CatalogRepository, JsonCatalog, MemoryCatalog};
pub use data::{Aperture, CameraProfile, LensProfile};
pub use crate::optics::params::{Field, LockPattern, Locks, OpticalParams};
pub use session::{Session, SessionEvent, Settled, WriteBack};
pub use shared::SharedSession;
