//! Trial loading from files on disk to synchronized tables.

use std::fs;

use contracts::{DatasetError, ImuFormatRevision, OriginSource, TestName, Vector3};
use ingestion::fixtures::{encode_imu_csv, encode_imu_v1, encode_imu_v2, C3dFixture, ImuSensorFixture};
use serde_json::json;
use sync_engine::{load_trial, TrialLoader};

use crate::support::{
    standard_sensors, SubjectFiles, TestDataset, IMU_TRIGGER, MOCAP_TRIGGER, SAMPLES, SUBJECT,
    TEST,
};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_standard_trial() {
    let dataset = TestDataset::standard();
    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();

    assert_eq!(trial.subject, SUBJECT);
    assert_eq!(trial.test, TEST);
    assert_eq!(trial.alignment.origin, OriginSource::DetectedTrigger);
    assert_eq!(trial.alignment.imu_origin_sample, IMU_TRIGGER);
    assert_eq!(trial.alignment.mocap_origin_frame, MOCAP_TRIGGER);
    assert!(trial.alignment.quirks.is_clean());
    assert_eq!(trial.sources.imu_format, ImuFormatRevision::Binary);
    assert_eq!(trial.sources.imu, dataset.imu_path(SUBJECT, TEST, "bin"));

    // one second at 100 Hz, both ends inclusive
    assert_eq!(trial.imu.len(), 101);
    assert_eq!(trial.mocap.len(), 101);
    assert_eq!(trial.imu.time_s[0], 0.0);
    assert_eq!(trial.mocap.time_s[0], 0.0);
    assert!(approx(*trial.imu.time_s.last().unwrap(), 1.0));

    assert_eq!(
        trial.imu.column_names()[..3],
        ["l_cavity/acc_x", "l_cavity/acc_y", "l_cavity/acc_z"]
    );
    assert!(approx(trial.imu.sensors["l_cavity"].acc[0].z, 9.81));
    assert!(approx(trial.imu.sensors["r_heel"].acc[0].x, 9.81));

    // labels are lower-cased; R_TOE drops out every tenth frame
    let toe = &trial.mocap.markers["l_toe"];
    assert_eq!(toe[0], Some(Vector3::new(MOCAP_TRIGGER as f64, 1.0, 2.0)));
    assert_eq!(trial.mocap.markers["r_toe"][0], None);
    assert!(trial.mocap.markers["r_toe"][1].is_some());
}

#[test]
fn test_loading_is_deterministic() {
    let dataset = TestDataset::standard();
    let config = dataset.config();
    let first = load_trial(&config, SUBJECT, TEST, None).unwrap();
    let second = load_trial(&config, SUBJECT, TEST, None).unwrap();
    // NaN-safe comparison
    assert_eq!(format!("{first:?}"), format!("{second:?}"));
}

#[test]
fn test_padding_is_symmetric() {
    let dataset = TestDataset::standard();
    let mut config = dataset.config();
    config.load.padding_s = 0.5;
    let trial = load_trial(&config, SUBJECT, TEST, None).unwrap();

    for time in [&trial.imu.time_s, &trial.mocap.time_s] {
        assert_eq!(time.len(), 201);
        assert!(approx(time[0], -0.5));
        assert!(approx(*time.last().unwrap(), 1.5));
        assert_eq!(time[50], 0.0);
    }
    assert_eq!(trial.alignment.padding_s, 0.5);
    assert_eq!(
        trial.mocap.markers["l_toe"][50],
        Some(Vector3::new(MOCAP_TRIGGER as f64, 1.0, 2.0))
    );
}

#[test]
fn test_legacy_header_rate() {
    let sensors = [
        ImuSensorFixture::new("9e82", 204.8, 600).with_sync(|i| if i >= IMU_TRIGGER { 65535 } else { 0 }),
        ImuSensorFixture::new("c41a", 204.8, 600),
    ];
    let dataset = TestDataset::new(&[
        SubjectFiles::standard(SUBJECT).with_imu("bin", encode_imu_v1(0, &sensors)),
    ]);
    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();

    assert_eq!(trial.sources.imu_format, ImuFormatRevision::LegacyBinary);
    assert_eq!(trial.imu.sampling_rate_hz, 1024.0 / 5.0);
    assert_eq!(trial.mocap.sampling_rate_hz, 100.0);
    // round(1.0 s * 204.8 Hz) rows after the origin
    assert_eq!(trial.imu.len(), 206);
    assert_eq!(trial.mocap.len(), 101);
}

#[test]
fn test_csv_export() {
    let dataset = TestDataset::new(&[
        SubjectFiles::standard(SUBJECT).with_imu("csv", encode_imu_csv(None, &standard_sensors())),
    ]);
    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();

    assert_eq!(trial.sources.imu_format, ImuFormatRevision::Csv);
    assert_eq!(trial.alignment.imu_origin_sample, IMU_TRIGGER);
    assert!(approx(trial.imu.sensors["l_cavity"].acc[0].z, 9.81));
}

#[test]
fn test_firmware_quirks_are_reported() {
    let mut counters: Vec<u32> = (0..SAMPLES as u32).collect();
    counters.insert(150, 149);
    let sensors = [
        standard_sensors().remove(0),
        ImuSensorFixture::new("c41a", 100.0, SAMPLES).with_counters(counters),
    ];
    let dataset = TestDataset::new(&[
        SubjectFiles::standard(SUBJECT).with_imu("bin", encode_imu_v2(0, &sensors)),
    ]);
    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();

    assert_eq!(trial.alignment.quirks.duplicates, 1);
    assert_eq!(trial.imu.len(), 101);
}

/// One trigger pulse at 2.345 s seen by a 204.8 Hz IMU and a 100 Hz mocap system sampling
/// its analog channel at 1 kHz; both recordings start at 0 s
#[test]
fn test_origins_coincide_across_rates() {
    const PULSE_S: f64 = 2.345;
    const IMU_RATE_HZ: f64 = 204.8;
    const MOCAP_RATE_HZ: f64 = 100.0;

    let imu = encode_imu_v2(
        0,
        &[
            ImuSensorFixture::new("9e82", IMU_RATE_HZ, 1024)
                .with_acc(|_| [0, 0, 2048])
                .with_sync(|i| if i as f64 / IMU_RATE_HZ >= PULSE_S { 65535 } else { 0 }),
            ImuSensorFixture::new("c41a", IMU_RATE_HZ, 1024),
        ],
    );
    let mocap = C3dFixture::new(MOCAP_RATE_HZ as f32, 500)
        .with_marker("l_toe", |i| Some([i as f32, 1.0, 2.0]))
        .with_analog("sync", 10, |s| if s as f64 / 1000.0 >= PULSE_S { 5.0 } else { 0.0 })
        .encode();
    let dataset = TestDataset::new(&[SubjectFiles::standard(SUBJECT)
        .with_imu("bin", imu)
        .with_mocap(mocap)]);

    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();
    assert_eq!(trial.alignment.origin, OriginSource::DetectedTrigger);
    // the binary header stores the rate as f32
    assert!((trial.imu.sampling_rate_hz - IMU_RATE_HZ).abs() < 1e-4);
    assert_eq!(trial.mocap.sampling_rate_hz, MOCAP_RATE_HZ);

    let t_imu = trial.alignment.imu_origin_sample as f64 / trial.imu.sampling_rate_hz;
    let t_mocap = trial.alignment.mocap_origin_frame as f64 / trial.mocap.sampling_rate_hz;
    assert!(
        (t_imu - t_mocap).abs() <= 1.0 / MOCAP_RATE_HZ,
        "imu origin {t_imu} s, mocap origin {t_mocap} s"
    );
    assert!((t_imu - PULSE_S).abs() <= 1.0 / IMU_RATE_HZ);
    assert!((t_mocap - PULSE_S).abs() <= 1.0 / MOCAP_RATE_HZ);

    // both tables start at the origin and span the one-second test
    assert_eq!(trial.imu.time_s[0], 0.0);
    assert_eq!(trial.mocap.time_s[0], 0.0);
    assert!((trial.imu.time_s.last().unwrap() - 1.0).abs() <= 0.5 / IMU_RATE_HZ);
    assert_eq!(trial.mocap.len(), 101);
    assert_eq!(
        trial.mocap.markers["l_toe"][0],
        Some(Vector3::new(trial.alignment.mocap_origin_frame as f64, 1.0, 2.0))
    );
}

#[test]
fn test_first_sample_fallback() {
    let mocap = C3dFixture::new(100.0, SAMPLES)
        .with_marker("l_toe", |i| Some([i as f32, 1.0, 2.0]))
        .encode();
    let dataset = TestDataset::new(&[SubjectFiles::standard(SUBJECT).with_mocap(mocap)]);
    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();

    assert_eq!(trial.alignment.origin, OriginSource::FirstSampleFallback);
    assert_eq!(trial.alignment.imu_origin_sample, 0);
    assert_eq!(trial.alignment.mocap_origin_frame, 0);
    assert!(!trial.alignment.warnings.is_empty());
    assert_eq!(trial.imu.time_s[0], 0.0);
    assert_eq!(trial.mocap.markers["l_toe"][0], Some(Vector3::new(0.0, 1.0, 2.0)));
}

#[test]
fn test_metadata_sync_hints() {
    let mut subject = SubjectFiles::standard(SUBJECT);
    subject.meta["tests"]["slow_10"] =
        json!({"duration_s": 0.5, "imu_sync_sample": 40, "mocap_sync_frame": 60});
    let dataset = TestDataset::new(&[subject]);
    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();

    assert_eq!(trial.alignment.origin, OriginSource::Metadata);
    assert_eq!(trial.alignment.imu_origin_sample, 40);
    assert_eq!(trial.mocap.markers["l_toe"][0], Some(Vector3::new(60.0, 1.0, 2.0)));
    assert_eq!(trial.imu.len(), 51);
}

#[test]
fn test_corrupt_header() {
    let dataset = TestDataset::standard();
    let path = dataset.imu_path(SUBJECT, TEST, "bin");
    let mut bytes = fs::read(&path).unwrap();
    // first byte of the first sensor id; the header checksum no longer matches
    bytes[16] ^= 0x01;
    fs::write(&path, bytes).unwrap();

    let err = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap_err();
    assert!(matches!(err, DatasetError::CorruptRecording { .. }), "{err}");
    assert!(err.to_string().contains("slow_10.bin"), "{err}");
}

#[test]
fn test_unknown_subject_and_test() {
    let dataset = TestDataset::standard();
    let config = dataset.config();

    let err = load_trial(&config, "ffff", TEST, None).unwrap_err();
    assert!(err.is_not_found(), "{err}");

    let err = load_trial(&config, SUBJECT, TestName::Long, None).unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(err.to_string().contains("long"), "{err}");
}

#[test]
fn test_excluded_subject_still_loads() {
    let dataset = TestDataset::new(&[SubjectFiles::standard(contracts::WRONG_RECORDING_SUBJECT)]);
    let trial = load_trial(&dataset.config(), contracts::WRONG_RECORDING_SUBJECT, TEST, None);
    assert!(trial.is_ok());
}

#[test]
fn test_shared_loader_across_subjects() {
    let dataset = TestDataset::new(&[
        SubjectFiles::standard(SUBJECT),
        SubjectFiles::standard("c0ffee"),
    ]);
    let loader = TrialLoader::new(dataset.config());

    for subject in [SUBJECT, "c0ffee", SUBJECT] {
        let trial = loader.load_trial(subject, TEST, None).unwrap();
        assert_eq!(trial.subject, subject);
    }
    assert_eq!(loader.calibrations().len(), 2);
}

#[test]
fn test_foot_frame_alignment() {
    let dataset = TestDataset::standard();
    let mut config = dataset.config();
    config.load.align_coordinates = true;
    let trial = load_trial(&config, SUBJECT, TEST, None).unwrap();

    // the heel mount turns sensor x into foot z
    let heel = trial.imu.sensors["r_heel"].acc[0];
    assert!(approx(heel.z, 9.81) && approx(heel.x, 0.0));
    // the cavity mount keeps z
    assert!(approx(trial.imu.sensors["l_cavity"].acc[0].z, 9.81));
}
