//! CalibrationStore - shared calibration cache
//!
//! Keyed by (subject, dataset root). Every lookup re-reads the file bytes and compares a
//! CRC-64 fingerprint plus length with the cached entry, so an edited file is re-parsed
//! instead of served stale.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use contracts::{CalibrationRecord, DatasetConfig, Result, SubjectId};
use crc::{Crc, CRC_64_XZ};
use tracing::{debug, instrument};

use crate::calibration::{parse_calibration, read_calibration_bytes};
use crate::layout::DatasetLayout;

const FINGERPRINT: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

type CacheKey = (SubjectId, PathBuf);

#[derive(Debug)]
struct CachedCalibration {
    fingerprint: u64,
    len: usize,
    record: Arc<CalibrationRecord>,
}

/// Thread-safe calibration cache
#[derive(Debug, Default)]
pub struct CalibrationStore {
    entries: RwLock<HashMap<CacheKey, CachedCalibration>>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calibration of `subject`, parsed at most once per file content
    #[instrument(name = "calibration_store_get", skip(self, config), fields(subject = %subject))]
    pub fn get(
        &self,
        config: &DatasetConfig,
        subject: &str,
        data_folder: Option<&Path>,
    ) -> Result<Arc<CalibrationRecord>> {
        let layout = DatasetLayout::resolve(config, data_folder)?;
        let path = layout.calibration_path(subject);
        let bytes = read_calibration_bytes(subject, &path)?;
        let fingerprint = FINGERPRINT.checksum(&bytes);
        let key: CacheKey = (SubjectId::from(subject), layout.root().to_path_buf());

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = entries.get(&key) {
                if cached.fingerprint == fingerprint && cached.len == bytes.len() {
                    debug!("calibration cache hit");
                    return Ok(Arc::clone(&cached.record));
                }
                debug!("calibration file changed, reloading");
            }
        }

        let record = Arc::new(parse_calibration(subject, &path, &bytes)?);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CachedCalibration {
                fingerprint,
                len: bytes.len(),
                record: Arc::clone(&record),
            },
        );
        Ok(record)
    }

    /// Drop the cached entry of one subject under `root`
    pub fn invalidate(&self, subject: &str, root: &Path) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .remove(&(SubjectId::from(subject), root.to_path_buf()))
            .is_some()
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
