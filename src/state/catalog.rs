/// Camera and lens catalogs
///
/// Each catalog is one JSON document on disk:
/// - `cameras.json`: `{"cameras": [ {name, resolution_x, ...}, ... ]}`
/// - `objectives.json`: `{"objectives": [ {name, focal_length, ...}, ... ]}`
///
/// A missing file is an empty catalog and is created on first use.
/// Records are looked up by name, first match wins; adding a record whose
/// name is already taken is rejected so no record can become unreachable.

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::data::{CameraProfile, LensProfile};
use super::validation::{check_camera, check_lens};
use crate::error::{CatalogError, ValidationError};

pub const CAMERA_FILE: &str = "cameras.json";
pub const LENS_FILE: &str = "objectives.json";

/// A catalog record with a unique name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for CameraProfile {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for LensProfile {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Name-keyed records in catalog order
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog<T> {
    entries: Vec<T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Named> Catalog<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self { entries }
    }

    /// First record with this name
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn first(&self) -> Option<&T> {
        self.entries.first()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of camera and lens records
pub trait CatalogRepository {
    fn load_cameras(&self) -> Result<Catalog<CameraProfile>, CatalogError>;
    fn load_lenses(&self) -> Result<Catalog<LensProfile>, CatalogError>;
    /// Validate, reject duplicate names, append and persist
    fn add_camera(&mut self, camera: CameraProfile) -> Result<(), CatalogError>;
    /// Validate, reject duplicate names, append and persist
    fn add_lens(&mut self, lens: LensProfile) -> Result<(), CatalogError>;
}

/// Records stay raw JSON until loaded so one malformed entry cannot hide the rest
#[derive(Serialize, Deserialize, Default)]
struct CameraDocument {
    #[serde(default)]
    cameras: Vec<Value>,
}

#[derive(Serialize, Deserialize, Default)]
struct LensDocument {
    #[serde(default)]
    objectives: Vec<Value>,
}

/// File-backed catalogs stored as JSON documents in one directory
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    dir: PathBuf,
}

impl JsonCatalog {
    /// Open the catalogs in `dir`, creating the directory and empty documents if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CatalogError::Io {
            path: dir.clone(),
            source,
        })?;

        let catalog = Self { dir };
        if !catalog.camera_path().exists() {
            write_document(&catalog.camera_path(), &CameraDocument::default())?;
        }
        if !catalog.lens_path().exists() {
            write_document(&catalog.lens_path(), &LensDocument::default())?;
        }

        info!("📁 Catalogs at: {}", catalog.dir.display());
        Ok(catalog)
    }

    pub fn camera_path(&self) -> PathBuf {
        self.dir.join(CAMERA_FILE)
    }

    pub fn lens_path(&self) -> PathBuf {
        self.dir.join(LENS_FILE)
    }
}

impl CatalogRepository for JsonCatalog {
    fn load_cameras(&self) -> Result<Catalog<CameraProfile>, CatalogError> {
        let doc: CameraDocument = read_document(&self.camera_path())?;
        let cameras = keep_valid(doc.cameras, "camera", check_camera);
        info!("📷 Loaded {} cameras", cameras.len());
        Ok(cameras)
    }

    fn load_lenses(&self) -> Result<Catalog<LensProfile>, CatalogError> {
        let doc: LensDocument = read_document(&self.lens_path())?;
        let lenses = keep_valid(doc.objectives, "lens", check_lens);
        info!("🔭 Loaded {} lenses", lenses.len());
        Ok(lenses)
    }

    fn add_camera(&mut self, camera: CameraProfile) -> Result<(), CatalogError> {
        check_camera(&camera)?;
        let path = self.camera_path();
        let mut doc: CameraDocument = read_document(&path)?;
        reject_duplicate(doc.cameras.iter().filter_map(record_name), &camera.name, "camera")?;

        info!("➕ Adding camera '{}'", camera.name);
        doc.cameras.push(to_record(&path, &camera)?);
        write_document(&path, &doc)
    }

    fn add_lens(&mut self, lens: LensProfile) -> Result<(), CatalogError> {
        check_lens(&lens)?;
        let path = self.lens_path();
        let mut doc: LensDocument = read_document(&path)?;
        reject_duplicate(doc.objectives.iter().filter_map(record_name), &lens.name, "lens")?;

        info!("➕ Adding lens '{}'", lens.name);
        doc.objectives.push(to_record(&path, &lens)?);
        write_document(&path, &doc)
    }
}

/// In-memory catalogs, for embedding hosts and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    cameras: Vec<CameraProfile>,
    lenses: Vec<LensProfile>,
}

impl MemoryCatalog {
    pub fn new(cameras: Vec<CameraProfile>, lenses: Vec<LensProfile>) -> Self {
        Self { cameras, lenses }
    }
}

impl CatalogRepository for MemoryCatalog {
    fn load_cameras(&self) -> Result<Catalog<CameraProfile>, CatalogError> {
        Ok(Catalog::new(self.cameras.clone()))
    }

    fn load_lenses(&self) -> Result<Catalog<LensProfile>, CatalogError> {
        Ok(Catalog::new(self.lenses.clone()))
    }

    fn add_camera(&mut self, camera: CameraProfile) -> Result<(), CatalogError> {
        check_camera(&camera)?;
        reject_duplicate(self.cameras.iter().map(Named::name), &camera.name, "camera")?;
        self.cameras.push(camera);
        Ok(())
    }

    fn add_lens(&mut self, lens: LensProfile) -> Result<(), CatalogError> {
        check_lens(&lens)?;
        reject_duplicate(self.lenses.iter().map(Named::name), &lens.name, "lens")?;
        self.lenses.push(lens);
        Ok(())
    }
}

/// Read a catalog document; a file that vanished since `open` reads as empty
fn read_document<T>(path: &Path) -> Result<T, CatalogError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&text).map_err(|source| CatalogError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), CatalogError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser).map_err(|source| CatalogError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, buf).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn to_record<T: Serialize>(path: &Path, record: &T) -> Result<Value, CatalogError> {
    serde_json::to_value(record).map_err(|source| CatalogError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn record_name(record: &Value) -> Option<&str> {
    record.get("name")?.as_str()
}

fn reject_duplicate<'a>(
    mut existing: impl Iterator<Item = &'a str>,
    name: &str,
    kind: &'static str,
) -> Result<(), ValidationError> {
    if existing.any(|e| e == name) {
        return Err(ValidationError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Drop records that do not parse or fail validation (hand-edited files) and flag shadowed names
fn keep_valid<T: Named + DeserializeOwned>(
    records: Vec<Value>,
    kind: &str,
    check: impl Fn(&T) -> Result<(), ValidationError>,
) -> Catalog<T> {
    let mut kept: Vec<T> = Vec::with_capacity(records.len());
    for raw in records {
        let name = record_name(&raw).unwrap_or("<unnamed>").to_string();
        let record: T = match serde_json::from_value(raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("⚠️  Skipping {} '{}': {}", kind, name, e);
                continue;
            }
        };
        if let Err(e) = check(&record) {
            warn!("⚠️  Skipping {} '{}': {}", kind, record.name(), e);
            continue;
        }
        if kept.iter().any(|k| k.name() == record.name()) {
            warn!("⚠️  Duplicate {} name '{}', later entry is unreachable", kind, record.name());
        }
        kept.push(record);
    }
    Catalog::new(kept)
}
