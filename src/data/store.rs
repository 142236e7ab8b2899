use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Deref;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};

use super::filter::{partial_match, ModelFilter, Window};
use super::model::{AuthorBibref, VelocityModel1D, VelocityModel3D, WaveType};
use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Read-only repository interface
// ---------------------------------------------------------------------------

/// The three velocity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    OneD,
    ThreeD(WaveType),
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::OneD,
        Collection::ThreeD(WaveType::Vp),
        Collection::ThreeD(WaveType::Vs),
    ];
}

/// String fields that discovery can enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Nfo,
}

/// What the query pipeline needs from storage. Every method is read-only.
pub trait RecordStore {
    fn count_1d(&self, filter: &ModelFilter) -> Result<usize, StoreError>;

    /// Matching rows in [`VelocityModel1D::fetch_order`], windowed.
    fn fetch_1d(
        &self,
        filter: &ModelFilter,
        window: Window,
    ) -> Result<Vec<VelocityModel1D>, StoreError>;

    fn count_3d(&self, wave_type: WaveType, filter: &ModelFilter) -> Result<usize, StoreError>;

    /// Matching rows in [`VelocityModel3D::fetch_order`], windowed.
    fn fetch_3d(
        &self,
        wave_type: WaveType,
        filter: &ModelFilter,
        window: Window,
    ) -> Result<Vec<VelocityModel3D>, StoreError>;

    /// Distinct non-empty values of `field` in one collection.
    fn distinct(&self, collection: Collection, field: Field) -> Result<BTreeSet<String>, StoreError>;

    /// Bibref of the first author (in author order) containing `author`.
    fn bibref(&self, author: &str) -> Result<Option<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// Tables – the in-memory collections
// ---------------------------------------------------------------------------

/// All four collections. Velocity rows are kept sorted in fetch order so a
/// windowed fetch is a filtered skip/take.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    models_1d: Vec<VelocityModel1D>,
    #[serde(default)]
    models_3d_vp: Vec<VelocityModel3D>,
    #[serde(default)]
    models_3d_vs: Vec<VelocityModel3D>,
    #[serde(default)]
    bibrefs: BTreeMap<String, String>,
}

/// Counts from one import batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Rows dropped because their key already existed.
    pub skipped: usize,
    /// Bibrefs whose text was replaced.
    pub updated: usize,
}

impl Tables {
    fn models_3d(&self, wave_type: WaveType) -> &[VelocityModel3D] {
        match wave_type {
            WaveType::Vp => &self.models_3d_vp,
            WaveType::Vs => &self.models_3d_vs,
        }
    }

    fn models_3d_mut(&mut self, wave_type: WaveType) -> &mut Vec<VelocityModel3D> {
        match wave_type {
            WaveType::Vp => &mut self.models_3d_vp,
            WaveType::Vs => &mut self.models_3d_vs,
        }
    }

    /// Insert rows whose full tuple is not present yet.
    pub fn insert_1d(&mut self, rows: impl IntoIterator<Item = VelocityModel1D>) -> ImportReport {
        let mut seen: HashSet<_> = self.models_1d.iter().map(VelocityModel1D::key).collect();
        let mut report = ImportReport::default();
        for row in rows {
            if seen.insert(row.key()) {
                self.models_1d.push(row);
                report.imported += 1;
            } else {
                report.skipped += 1;
            }
        }
        self.models_1d.sort_by(VelocityModel1D::fetch_order);
        report
    }

    /// Insert rows whose (longitude, latitude, depth, nfo, author) is new
    /// within the `wave_type` collection.
    pub fn insert_3d(
        &mut self,
        wave_type: WaveType,
        rows: impl IntoIterator<Item = VelocityModel3D>,
    ) -> ImportReport {
        let table = self.models_3d_mut(wave_type);
        let mut seen: HashSet<_> = table.iter().map(VelocityModel3D::key).collect();
        let mut report = ImportReport::default();
        for row in rows {
            if seen.insert(row.key()) {
                table.push(row);
                report.imported += 1;
            } else {
                report.skipped += 1;
            }
        }
        table.sort_by(VelocityModel3D::fetch_order);
        report
    }

    /// Upsert bibrefs keyed by author.
    pub fn upsert_bibrefs(&mut self, rows: impl IntoIterator<Item = AuthorBibref>) -> ImportReport {
        let mut report = ImportReport::default();
        for AuthorBibref { author, bibref } in rows {
            match self.bibrefs.get_mut(&author) {
                Some(existing) if *existing == bibref => report.skipped += 1,
                Some(existing) => {
                    *existing = bibref;
                    report.updated += 1;
                }
                None => {
                    self.bibrefs.insert(author, bibref);
                    report.imported += 1;
                }
            }
        }
        report
    }

    /// Re-apply fetch order and key uniqueness to decoded rows. Returns the
    /// number of duplicates dropped.
    fn rebuild(self) -> (Self, usize) {
        let Tables {
            models_1d,
            models_3d_vp,
            models_3d_vs,
            bibrefs,
        } = self;
        let mut tables = Tables {
            bibrefs,
            ..Tables::default()
        };
        let dropped = tables.insert_1d(models_1d).skipped
            + tables.insert_3d(WaveType::Vp, models_3d_vp).skipped
            + tables.insert_3d(WaveType::Vs, models_3d_vs).skipped;
        (tables, dropped)
    }

    pub fn len_1d(&self) -> usize {
        self.models_1d.len()
    }

    pub fn len_3d(&self, wave_type: WaveType) -> usize {
        self.models_3d(wave_type).len()
    }
}

fn window_of<'a, T: Clone + 'a>(rows: impl Iterator<Item = &'a T>, window: Window) -> Vec<T> {
    rows.skip(window.offset).take(window.limit).cloned().collect()
}

impl RecordStore for Tables {
    fn count_1d(&self, filter: &ModelFilter) -> Result<usize, StoreError> {
        Ok(self
            .models_1d
            .iter()
            .filter(|m| filter.matches(&m.author, &m.nfo))
            .count())
    }

    fn fetch_1d(
        &self,
        filter: &ModelFilter,
        window: Window,
    ) -> Result<Vec<VelocityModel1D>, StoreError> {
        let rows = self
            .models_1d
            .iter()
            .filter(|m| filter.matches(&m.author, &m.nfo));
        Ok(window_of(rows, window))
    }

    fn count_3d(&self, wave_type: WaveType, filter: &ModelFilter) -> Result<usize, StoreError> {
        Ok(self
            .models_3d(wave_type)
            .iter()
            .filter(|m| filter.matches(&m.author, &m.nfo))
            .count())
    }

    fn fetch_3d(
        &self,
        wave_type: WaveType,
        filter: &ModelFilter,
        window: Window,
    ) -> Result<Vec<VelocityModel3D>, StoreError> {
        let rows = self
            .models_3d(wave_type)
            .iter()
            .filter(|m| filter.matches(&m.author, &m.nfo));
        Ok(window_of(rows, window))
    }

    fn distinct(&self, collection: Collection, field: Field) -> Result<BTreeSet<String>, StoreError> {
        let pick = |author: &str, nfo: &str| -> String {
            match field {
                Field::Author => author.to_string(),
                Field::Nfo => nfo.to_string(),
            }
        };
        let values: BTreeSet<String> = match collection {
            Collection::OneD => self
                .models_1d
                .iter()
                .map(|m| pick(&m.author, &m.nfo))
                .collect(),
            Collection::ThreeD(wave_type) => self
                .models_3d(wave_type)
                .iter()
                .map(|m| pick(&m.author, &m.nfo))
                .collect(),
        };
        Ok(values.into_iter().filter(|v| !v.is_empty()).collect())
    }

    fn bibref(&self, author: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .bibrefs
            .iter()
            .find(|(stored, _)| partial_match(stored, author))
            .map(|(_, bibref)| bibref.clone()))
    }
}

// ---------------------------------------------------------------------------
// Catalog – shared handle with per-request sessions
// ---------------------------------------------------------------------------

/// Shared store. Queries borrow a [`Session`] for the duration of one
/// request; imports take the write lock.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<Tables>,
}

/// Read access scoped to one request. Released on drop.
pub struct Session<'a> {
    guard: RwLockReadGuard<'a, Tables>,
}

impl Deref for Session<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.guard
    }
}

impl Catalog {
    pub fn new(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Load a JSON snapshot. A missing file yields an empty catalog.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            log::info!("Snapshot {} not found, starting empty", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::ReadSnapshot {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded: Tables =
            serde_json::from_str(&text).map_err(|source| StoreError::DecodeSnapshot {
                path: path.to_path_buf(),
                source,
            })?;
        let (tables, dropped) = decoded.rebuild();
        if dropped > 0 {
            log::warn!(
                "Dropped {dropped} duplicate rows from snapshot {}",
                path.display()
            );
        }
        log::info!(
            "Loaded snapshot {}: {} 1D rows, {} 3D VP rows, {} 3D VS rows, {} bibrefs",
            path.display(),
            tables.models_1d.len(),
            tables.models_3d_vp.len(),
            tables.models_3d_vs.len(),
            tables.bibrefs.len()
        );
        Ok(Self::new(tables))
    }

    /// Write the snapshot next to `path` and rename it into place.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let session = self.session()?;
        let bytes = serde_json::to_vec(&*session).map_err(StoreError::EncodeSnapshot)?;
        let tmp = path.with_extension("json.tmp");
        let write_err = |source: std::io::Error| StoreError::WriteSnapshot {
            path: path.to_path_buf(),
            source,
        };
        std::fs::write(&tmp, bytes).map_err(write_err)?;
        std::fs::rename(&tmp, path).map_err(write_err)?;
        Ok(())
    }

    pub fn session(&self) -> Result<Session<'_>, StoreError> {
        let guard = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(Session { guard })
    }

    pub fn import_1d(&self, rows: Vec<VelocityModel1D>) -> Result<ImportReport, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.insert_1d(rows))
    }

    pub fn import_3d(
        &self,
        wave_type: WaveType,
        rows: Vec<VelocityModel3D>,
    ) -> Result<ImportReport, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.insert_3d(wave_type, rows))
    }

    pub fn import_bibrefs(&self, rows: Vec<AuthorBibref>) -> Result<ImportReport, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.upsert_bibrefs(rows))
    }
}
