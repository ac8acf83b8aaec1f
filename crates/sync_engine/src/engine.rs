//! TrialLoader - loads one trial into calibrated, time-aligned tables.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use catalog::{CalibrationStore, DatasetLayout};
use contracts::{
    AlignmentInfo, CalibrationRecord, DatasetConfig, DatasetError, ImuChannels, ImuTable,
    MocapTable, OriginSource, RawImuSensor, RawImuStream, RawMocapStream, Result, SubjectMetadata,
    SynchronizedTrialData, TestName, TrialMetadata, TrialSources, Vector3,
};
use ingestion::{ImuReader, MocapReader, StreamReader};
use nalgebra::Matrix3;
use tracing::{debug, info, instrument, warn};

use crate::alignment::{foot_frame_rotation, mounting_correction, rotate};
use crate::calibration::CompiledCalibration;
use crate::trigger::{DetectorChain, TriggerDetector, TriggerSignal, TRIGGER_CHANNELS};
use crate::window::{
    common_counter_range, crop_window, place_on_grid, place_vectors, time_index,
};

/// One body position after calibration and rotation, before counter alignment
struct PositionedSensor<'a> {
    position: &'a str,
    raw: &'a RawImuSensor,
    acc: Vec<Vector3>,
    gyr: Vec<Vector3>,
    mag: Option<Vec<Vector3>>,
}

/// IMU sensors on one counter grid
struct AlignedImu {
    rate_hz: f64,
    rows: usize,
    sensors: BTreeMap<String, ImuChannels>,
    sync: Option<Vec<f64>>,
}

/// Loads trials of one dataset
///
/// Holds the configuration, a calibration cache shared by every load and the trigger
/// detector. Loading is read-only; a loader can be shared between threads.
pub struct TrialLoader {
    config: DatasetConfig,
    calibrations: Arc<CalibrationStore>,
    detector: Box<dyn TriggerDetector>,
}

impl TrialLoader {
    pub fn new(config: DatasetConfig) -> Self {
        let detector = DetectorChain::standard(&config.load.trigger);
        Self {
            config,
            calibrations: Arc::new(CalibrationStore::new()),
            detector: Box::new(detector),
        }
    }

    /// Share a calibration cache with other loaders
    pub fn with_calibration_store(mut self, store: Arc<CalibrationStore>) -> Self {
        self.calibrations = store;
        self
    }

    /// Replace the default detector chain
    pub fn with_detector(mut self, detector: impl TriggerDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn calibrations(&self) -> &CalibrationStore {
        &self.calibrations
    }

    /// Load, calibrate and align one trial
    ///
    /// # Errors
    /// - `NotFound`: unknown subject or test, or a missing recording
    /// - `CorruptRecording`: undecodable recording, a mapped sensor or required marker absent
    /// - `CalibrationNotFound` / `CalibrationFormat`: calibration missing or unusable
    #[instrument(
        name = "sync_engine_load_trial",
        skip(self, data_folder),
        fields(subject = %subject, test = %test)
    )]
    pub fn load_trial(
        &self,
        subject: &str,
        test: TestName,
        data_folder: Option<&Path>,
    ) -> Result<SynchronizedTrialData> {
        let started = Instant::now();
        let result = self.load(subject, test, data_folder);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(trial) => {
                observability::record_trial_loaded(test.as_str(), trial.alignment.origin, elapsed_ms);
                info!(
                    imu_rows = trial.imu.len(),
                    mocap_frames = trial.mocap.len(),
                    origin = ?trial.alignment.origin,
                    elapsed_ms,
                    "trial loaded"
                );
            }
            Err(e) => {
                observability::record_trial_failed(test.as_str(), e.kind());
                warn!(error = %e, "trial load failed");
            }
        }
        result
    }

    fn load(
        &self,
        subject: &str,
        test: TestName,
        data_folder: Option<&Path>,
    ) -> Result<SynchronizedTrialData> {
        let layout = DatasetLayout::resolve(&self.config, data_folder)?;
        let meta = catalog::read_subject_metadata(&self.config, subject, Some(layout.root()))?;
        let trial = meta.trial(test).ok_or_else(|| {
            DatasetError::not_found(
                format!("test '{test}' of subject '{subject}'"),
                layout.metadata_path(subject),
            )
        })?;
        if trial.sensors.is_empty() {
            return Err(DatasetError::metadata_format(
                layout.metadata_path(subject),
                format!("subject '{subject}' maps no sensors to positions"),
            ));
        }
        let paths = layout.trial_paths(subject, test)?;

        let raw_imu = ImuReader.read(&paths.imu)?;
        let raw_mocap = MocapReader.read(&paths.mocap)?;
        let calibration_path = layout.calibration_path(subject);
        let calibration = self
            .calibrations
            .get(&self.config, subject, Some(layout.root()))?;

        let sensors = self.calibrated_sensors(&meta, trial, &raw_imu, &calibration, &calibration_path)?;
        let imu = align_by_counter(sensors, &raw_imu.source)?;
        if raw_mocap.frame_count == 0 {
            return Err(DatasetError::corrupt(&raw_mocap.source, "recording has no frames"));
        }

        let mut warnings = Vec::new();
        let (imu_origin, mocap_origin, origin) =
            self.resolve_origin(subject, test, trial, &imu, &raw_mocap, &mut warnings);

        let padding_s = self.config.load.padding_s;
        let imu_window = crop_window(imu.rows, imu_origin, imu.rate_hz, trial.duration_s, padding_s);
        let mocap_window = crop_window(
            raw_mocap.frame_count,
            mocap_origin,
            raw_mocap.frame_rate_hz,
            trial.duration_s,
            padding_s,
        );
        debug!(?imu_window, ?mocap_window, "crop windows");

        let imu_table = ImuTable {
            sampling_rate_hz: imu.rate_hz,
            time_s: time_index(imu_window.clone(), imu_origin, imu.rate_hz),
            sensors: imu
                .sensors
                .into_iter()
                .map(|(position, channels)| {
                    let window = imu_window.clone();
                    let channels = ImuChannels {
                        acc: channels.acc[window.clone()].to_vec(),
                        gyr: channels.gyr[window.clone()].to_vec(),
                        mag: channels.mag.map(|m| m[window].to_vec()),
                    };
                    (position, channels)
                })
                .collect(),
        };

        let mut markers = BTreeMap::new();
        for marker in &raw_mocap.markers {
            let positions = marker.positions[mocap_window.clone()].to_vec();
            if markers.insert(marker.label.clone(), positions).is_some() {
                return Err(DatasetError::corrupt(
                    &raw_mocap.source,
                    format!("marker '{}' is labelled more than once", marker.label),
                ));
            }
        }
        for required in &self.config.load.required_markers {
            if !markers.contains_key(&required.to_lowercase()) {
                return Err(DatasetError::corrupt(
                    &raw_mocap.source,
                    format!("required marker '{required}' is missing"),
                ));
            }
        }
        let mocap_table = MocapTable {
            sampling_rate_hz: raw_mocap.frame_rate_hz,
            time_s: time_index(mocap_window, mocap_origin, raw_mocap.frame_rate_hz),
            markers,
        };

        Ok(SynchronizedTrialData {
            subject: meta.subject.clone(),
            test,
            imu: imu_table,
            mocap: mocap_table,
            alignment: AlignmentInfo {
                origin,
                imu_origin_sample: imu_origin,
                mocap_origin_frame: mocap_origin,
                padding_s,
                quirks: raw_imu.quirks(),
                warnings,
            },
            sources: TrialSources {
                imu: paths.imu,
                imu_format: raw_imu.format,
                mocap: paths.mocap,
                calibration: calibration_path,
            },
        })
    }

    /// Calibrate and rotate every sensor the trial maps to a body position
    fn calibrated_sensors<'a>(
        &self,
        meta: &SubjectMetadata,
        trial: &'a TrialMetadata,
        imu: &'a RawImuStream,
        calibration: &CalibrationRecord,
        calibration_path: &Path,
    ) -> Result<Vec<PositionedSensor<'a>>> {
        let mut sensors = Vec::with_capacity(trial.sensors.len());
        for (position, hardware_id) in &trial.sensors {
            let raw = imu.sensor(hardware_id).ok_or_else(|| {
                DatasetError::corrupt(
                    &imu.source,
                    format!("sensor '{hardware_id}' ({position}) is not in the recording"),
                )
            })?;
            let compiled = calibration
                .sensor(hardware_id)
                .ok_or_else(|| {
                    DatasetError::calibration_format(
                        calibration_path,
                        format!("no calibration for sensor '{hardware_id}' ({position})"),
                    )
                })
                .and_then(|cal| {
                    CompiledCalibration::new(cal).ok_or_else(|| {
                        DatasetError::calibration_format(
                            calibration_path,
                            format!("sensor '{hardware_id}': misalignment matrix is singular"),
                        )
                    })
                })?;

            let mut acc = raw.acc.clone();
            let mut gyr = raw.gyr.clone();
            let mut mag = raw.mag.clone();
            compiled.apply_all(&mut acc, &mut gyr);

            if let Some(rotation) = self.rotation_for(meta, position) {
                rotate(&rotation, &mut acc);
                rotate(&rotation, &mut gyr);
                if let Some(mag) = &mut mag {
                    rotate(&rotation, mag);
                }
            }

            sensors.push(PositionedSensor {
                position,
                raw,
                acc,
                gyr,
                mag,
            });
        }
        Ok(sensors)
    }

    /// Mounting correction first, then the foot-frame rotation when enabled
    fn rotation_for(&self, meta: &SubjectMetadata, position: &str) -> Option<Matrix3<f64>> {
        let correction = meta
            .mounting_corrections
            .get(position)
            .map(|degrees| mounting_correction(*degrees));
        let foot = self
            .config
            .load
            .align_coordinates
            .then(|| foot_frame_rotation(position))
            .flatten();

        match (foot, correction) {
            (Some(foot), Some(correction)) => Some(foot * correction),
            (foot, correction) => foot.or(correction),
        }
    }

    fn resolve_origin(
        &self,
        subject: &str,
        test: TestName,
        trial: &TrialMetadata,
        imu: &AlignedImu,
        mocap: &RawMocapStream,
        warnings: &mut Vec<String>,
    ) -> (usize, usize, OriginSource) {
        let mocap_channel = TRIGGER_CHANNELS
            .iter()
            .find_map(|label| mocap.analog_channel(label));

        let imu_hit = self.detector.locate(&TriggerSignal {
            stream: "imu",
            len: imu.rows,
            hint: trial.imu_sync_sample,
            samples: imu.sync.as_deref(),
            samples_per_row: 1,
            sample_rate_hz: imu.rate_hz,
        });
        let mocap_hit = self.detector.locate(&TriggerSignal {
            stream: "mocap",
            len: mocap.frame_count,
            hint: trial.mocap_sync_frame,
            samples: mocap_channel.map(|c| c.samples.as_slice()),
            samples_per_row: mocap.analog_per_frame(),
            sample_rate_hz: mocap.analog_rate_hz,
        });

        match (imu_hit, mocap_hit) {
            (Some(i), Some(m)) => {
                let origin = if i.source == OriginSource::Metadata && m.source == OriginSource::Metadata {
                    OriginSource::Metadata
                } else {
                    OriginSource::DetectedTrigger
                };
                debug!(imu_origin = i.row, mocap_origin = m.row, ?origin, "origin resolved");
                (i.row, m.row, origin)
            }
            (i, m) => {
                let missing = match (i, m) {
                    (None, None) => "IMU and mocap streams",
                    (None, Some(_)) => "IMU stream",
                    _ => "mocap stream",
                };
                let message = format!("no trigger found in the {missing}; aligned first samples instead");
                warn!(subject, test = %test, "{message}");
                observability::record_alignment_fallback(subject, test.as_str());
                warnings.push(message);
                (0, 0, OriginSource::FirstSampleFallback)
            }
        }
    }
}

/// Counter grid rows allowed per kept sample of the longest sensor
const MAX_GRID_ROWS_PER_SAMPLE: u64 = 4;
/// Extra grid rows allowed on top of the per-sample bound
const GRID_ROW_SLACK: u64 = 1024;

/// Put all sensors on the counter grid they share; gaps are NaN rows
fn align_by_counter(sensors: Vec<PositionedSensor<'_>>, source: &Path) -> Result<AlignedImu> {
    let Some(first) = sensors.first() else {
        return Err(DatasetError::corrupt(source, "no sensors selected"));
    };
    let rate_hz = first.raw.sampling_rate_hz;
    for s in &sensors {
        if s.raw.is_empty() {
            return Err(DatasetError::corrupt(
                source,
                format!("sensor '{}' ({}) has no samples", s.raw.sensor_id, s.position),
            ));
        }
        if (s.raw.sampling_rate_hz - rate_hz).abs() > 1e-9 {
            return Err(DatasetError::corrupt(
                source,
                format!(
                    "sensors record at different rates: {} Hz ({}) and {} Hz ({})",
                    rate_hz, first.position, s.raw.sampling_rate_hz, s.position
                ),
            ));
        }
    }

    let range = common_counter_range(sensors.iter().map(|s| s.raw.counter.as_slice()))
        .ok_or_else(|| DatasetError::corrupt(source, "sensors share no common counter range"))?;
    let rows = u64::from(range.1 - range.0) + 1;
    let longest = sensors.iter().map(|s| s.raw.len()).max().unwrap_or(0) as u64;
    let max_rows = longest
        .saturating_mul(MAX_GRID_ROWS_PER_SAMPLE)
        .saturating_add(GRID_ROW_SLACK);
    if rows > max_rows {
        return Err(DatasetError::corrupt(
            source,
            format!(
                "counters {}..={} span {rows} rows for at most {longest} samples per sensor",
                range.0, range.1
            ),
        ));
    }
    let rows = rows as usize;

    let sync = sensors.iter().find_map(|s| {
        s.raw
            .sync
            .as_ref()
            .map(|sync| place_on_grid(&s.raw.counter, sync, range, f64::NAN))
    });

    let sensors = sensors
        .into_iter()
        .map(|s| {
            let counter = &s.raw.counter;
            let channels = ImuChannels {
                acc: place_vectors(counter, &s.acc, range),
                gyr: place_vectors(counter, &s.gyr, range),
                mag: s.mag.as_ref().map(|m| place_vectors(counter, m, range)),
            };
            (s.position.to_string(), channels)
        })
        .collect();

    Ok(AlignedImu {
        rate_hz,
        rows,
        sensors,
        sync,
    })
}

/// Load one trial with a fresh [`TrialLoader`]
pub fn load_trial(
    config: &DatasetConfig,
    subject: &str,
    test: TestName,
    data_folder: Option<&Path>,
) -> Result<SynchronizedTrialData> {
    TrialLoader::new(config.clone()).load_trial(subject, test, data_folder)
}
