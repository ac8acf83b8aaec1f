//! Binary IMU recordings (`.bin`)
//!
//! ```text
//! offset  field
//! 0       magic "SPDI"
//! 4       version u8 (1 legacy, 2 current)
//! 5       sensor_count u8
//! 6       header_len u16, including the checksum
//! 8       recording start i64, UTC ms
//! 16      descriptors (v1: 16 bytes, v2: 24 bytes each)
//! ..      checksum (v1: CRC-16/USB u16, v2: CRC-32/ISO-HDLC u32) over [0, header_len - size)
//! ```
//!
//! The data section follows the header: for each sensor in descriptor order,
//! `sample_count` records of `counter u32, acc i16x3, gyr i16x3, [mag i16x3], [sync u16]`.

use crc::{Crc, CRC_16_USB, CRC_32_ISO_HDLC};

use contracts::{ImuFormatRevision, Vector3};

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::imu::samples::{Sample, SensorSamples};
use crate::imu::ImuRecording;

pub const MAGIC: &[u8; 4] = b"SPDI";
pub const FIXED_HEADER_LEN: usize = 16;
pub const SENSOR_ID_LEN: usize = 8;

pub const FLAG_MAG: u8 = 0b01;
pub const FLAG_SYNC: u8 = 0b10;

/// Legacy firmware stores the rate as a divider of this base rate
pub const LEGACY_BASE_RATE_HZ: f64 = 1024.0;
pub const LEGACY_ACC_RANGE_G: u8 = 16;
pub const LEGACY_GYR_RANGE_DPS: u16 = 2000;

pub const GRAVITY: f64 = 9.81;
pub const FULL_SCALE: f64 = 32768.0;
pub const MAG_UT_PER_LSB: f64 = 0.1;
pub const SYNC_FULL_SCALE: f64 = 65535.0;

pub(crate) const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_USB);
pub(crate) const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Layout constants of one header revision
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeaderLayout {
    pub format: ImuFormatRevision,
    pub descriptor_len: usize,
    pub checksum_len: usize,
}

impl HeaderLayout {
    pub fn for_version(version: u8) -> Result<Self> {
        match version {
            1 => Ok(Self {
                format: ImuFormatRevision::LegacyBinary,
                descriptor_len: 16,
                checksum_len: 2,
            }),
            2 => Ok(Self {
                format: ImuFormatRevision::Binary,
                descriptor_len: 24,
                checksum_len: 4,
            }),
            other => Err(DecodeError::Unsupported {
                what: "IMU header version",
                value: i64::from(other),
            }),
        }
    }

    pub fn header_len(&self, sensor_count: usize) -> usize {
        FIXED_HEADER_LEN + sensor_count * self.descriptor_len + self.checksum_len
    }

    pub fn checksum(&self, bytes: &[u8]) -> u32 {
        match self.format {
            ImuFormatRevision::LegacyBinary => u32::from(CRC16.checksum(bytes)),
            _ => CRC32.checksum(bytes),
        }
    }
}

/// Sensor descriptor, common to both revisions
#[derive(Debug, Clone)]
struct Descriptor {
    sensor_id: String,
    rate_hz: f64,
    acc_range_g: f64,
    gyr_range_dps: f64,
    flags: u8,
    sample_count: usize,
}

impl Descriptor {
    fn has_mag(&self) -> bool {
        self.flags & FLAG_MAG != 0
    }

    fn has_sync(&self) -> bool {
        self.flags & FLAG_SYNC != 0
    }
}

/// Bytes per sample record for the given flags
pub fn record_len(flags: u8) -> usize {
    let mut len = 4 + 12;
    if flags & FLAG_MAG != 0 {
        len += 6;
    }
    if flags & FLAG_SYNC != 0 {
        len += 2;
    }
    len
}

/// Decode a complete binary recording
pub(crate) fn decode(data: &[u8]) -> Result<ImuRecording> {
    let mut cursor = ByteCursor::new(data, "IMU file header");
    let magic = cursor.bytes(4)?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic {
            expected: "SPDI",
            found: magic.to_vec(),
        });
    }

    let layout = HeaderLayout::for_version(cursor.u8()?)?;
    let sensor_count = usize::from(cursor.u8()?);
    let header_len = usize::from(cursor.u16()?);
    let start_unix_ms = cursor.i64()?;

    if sensor_count == 0 {
        return Err(DecodeError::invalid("recording declares no sensors"));
    }
    let expected_len = layout.header_len(sensor_count);
    if header_len != expected_len {
        return Err(DecodeError::invalid(format!(
            "header length {header_len} does not match {sensor_count} sensors (expected {expected_len})"
        )));
    }
    if data.len() < header_len {
        return Err(DecodeError::Truncated {
            section: "IMU header",
            needed: header_len,
            available: data.len(),
        });
    }

    verify_checksum(&layout, &data[..header_len])?;

    let mut descriptors = Vec::with_capacity(sensor_count);
    let mut cursor = ByteCursor::new(&data[FIXED_HEADER_LEN..header_len], "sensor descriptor");
    for _ in 0..sensor_count {
        let descriptor = match layout.format {
            ImuFormatRevision::LegacyBinary => read_legacy_descriptor(&mut cursor)?,
            _ => read_descriptor(&mut cursor)?,
        };
        if descriptors
            .iter()
            .any(|d: &Descriptor| d.sensor_id == descriptor.sensor_id)
        {
            return Err(DecodeError::invalid(format!(
                "sensor '{}' declared twice",
                descriptor.sensor_id
            )));
        }
        descriptors.push(descriptor);
    }

    let body = &data[header_len..];
    let declared: usize = descriptors
        .iter()
        .map(|d| d.sample_count * record_len(d.flags))
        .sum();
    if body.len() != declared {
        return Err(DecodeError::invalid(format!(
            "data section has {} bytes, header declares {declared}",
            body.len()
        )));
    }

    let mut cursor = ByteCursor::new(body, "sample record");
    let sensors = descriptors
        .iter()
        .map(|d| read_samples(&mut cursor, d))
        .collect::<Result<Vec<_>>>()?;

    Ok(ImuRecording {
        format: layout.format,
        start_unix_ms: Some(start_unix_ms),
        sensors,
    })
}

fn verify_checksum(layout: &HeaderLayout, header: &[u8]) -> Result<()> {
    let (covered, stored) = header.split_at(header.len() - layout.checksum_len);
    let stored = match stored {
        [a, b] => u32::from(u16::from_le_bytes([*a, *b])),
        [a, b, c, d] => u32::from_le_bytes([*a, *b, *c, *d]),
        _ => return Err(DecodeError::invalid("unexpected checksum size")),
    };
    let computed = layout.checksum(covered);
    if stored != computed {
        return Err(DecodeError::ChecksumMismatch { stored, computed });
    }
    Ok(())
}

fn read_sensor_id(cursor: &mut ByteCursor<'_>) -> Result<String> {
    let raw = cursor.bytes(SENSOR_ID_LEN)?;
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    let id = std::str::from_utf8(&raw[..end])
        .map_err(|_| DecodeError::invalid("sensor id is not ASCII"))?
        .trim();
    if id.is_empty() {
        return Err(DecodeError::invalid("empty sensor id"));
    }
    Ok(id.to_ascii_lowercase())
}

fn read_descriptor(cursor: &mut ByteCursor<'_>) -> Result<Descriptor> {
    let sensor_id = read_sensor_id(cursor)?;
    let rate_hz = f64::from(cursor.f32()?);
    let acc_range_g = cursor.u8()?;
    let gyr_range_dps = cursor.u16()?;
    let flags = cursor.u8()?;
    let sample_count = cursor.u32()? as usize;
    cursor.skip(4)?;

    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Err(DecodeError::invalid(format!(
            "sensor '{sensor_id}': invalid sample rate {rate_hz}"
        )));
    }
    if acc_range_g == 0 || gyr_range_dps == 0 {
        return Err(DecodeError::invalid(format!(
            "sensor '{sensor_id}': zero measurement range"
        )));
    }

    Ok(Descriptor {
        sensor_id,
        rate_hz,
        acc_range_g: f64::from(acc_range_g),
        gyr_range_dps: f64::from(gyr_range_dps),
        flags,
        sample_count,
    })
}

fn read_legacy_descriptor(cursor: &mut ByteCursor<'_>) -> Result<Descriptor> {
    let sensor_id = read_sensor_id(cursor)?;
    let divider = cursor.u8()?;
    let flags = cursor.u8()?;
    let sample_count = cursor.u32()? as usize;
    cursor.skip(2)?;

    if divider == 0 {
        return Err(DecodeError::invalid(format!(
            "sensor '{sensor_id}': zero rate divider"
        )));
    }

    Ok(Descriptor {
        sensor_id,
        rate_hz: LEGACY_BASE_RATE_HZ / f64::from(divider),
        acc_range_g: f64::from(LEGACY_ACC_RANGE_G),
        gyr_range_dps: f64::from(LEGACY_GYR_RANGE_DPS),
        flags,
        sample_count,
    })
}

fn scaled(raw: [i16; 3], factor: f64) -> Vector3 {
    Vector3::new(
        f64::from(raw[0]) * factor,
        f64::from(raw[1]) * factor,
        f64::from(raw[2]) * factor,
    )
}

fn read_samples(cursor: &mut ByteCursor<'_>, d: &Descriptor) -> Result<contracts::RawImuSensor> {
    let acc_factor = d.acc_range_g * GRAVITY / FULL_SCALE;
    let gyr_factor = d.gyr_range_dps / FULL_SCALE;
    let mut samples = SensorSamples::new(
        d.sensor_id.clone(),
        d.rate_hz,
        d.has_mag(),
        d.has_sync(),
        d.sample_count,
    );

    for _ in 0..d.sample_count {
        let counter = cursor.u32()?;
        let acc = scaled(cursor.i16x3()?, acc_factor);
        let gyr = scaled(cursor.i16x3()?, gyr_factor);
        let mag = if d.has_mag() {
            Some(scaled(cursor.i16x3()?, MAG_UT_PER_LSB))
        } else {
            None
        };
        let sync = if d.has_sync() {
            Some(f64::from(cursor.u16()?) / SYNC_FULL_SCALE)
        } else {
            None
        };
        samples.push(Sample {
            counter,
            acc,
            gyr,
            mag,
            sync,
        });
    }

    Ok(samples.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{encode_imu_v1, encode_imu_v2, ImuSensorFixture};

    fn sensor() -> ImuSensorFixture {
        ImuSensorFixture::new("9E82", 204.8, 4)
            .with_acc(|i| [0, 0, 2048 * (i as i16 + 1)])
            .with_gyr(|_| [16384, 0, -16384])
            .with_sync(|i| if i >= 2 { 65535 } else { 0 })
    }

    #[test]
    fn test_decode_v2() {
        let data = encode_imu_v2(1_556_791_200_000, &[sensor()]);
        let recording = decode(&data).unwrap();

        assert_eq!(recording.format, ImuFormatRevision::Binary);
        assert_eq!(recording.start_unix_ms, Some(1_556_791_200_000));
        let s = &recording.sensors[0];
        assert_eq!(s.sensor_id, "9e82");
        assert!((s.sampling_rate_hz - 204.8).abs() < 1e-4);
        assert_eq!(s.counter, [0, 1, 2, 3]);
        // 2048 / 32768 * 16 g
        assert!((s.acc[0].z - 9.81).abs() < 1e-12);
        assert!((s.gyr[0].x - 1000.0).abs() < 1e-12);
        assert_eq!(s.sync.as_ref().unwrap(), &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_decode_v1_divider_rate() {
        let data = encode_imu_v1(0, &[sensor()]);
        let recording = decode(&data).unwrap();
        assert_eq!(recording.format, ImuFormatRevision::LegacyBinary);
        // divider 5 -> 1024 / 5
        assert_eq!(recording.sensors[0].sampling_rate_hz, 204.8);
    }

    #[test]
    fn test_every_header_byte_is_protected() {
        let data = encode_imu_v2(0, &[sensor(), ImuSensorFixture::new("c41a", 204.8, 4)]);
        let header_len = u16::from_le_bytes([data[6], data[7]]) as usize;
        for offset in 0..header_len {
            let mut corrupted = data.clone();
            corrupted[offset] ^= 0x10;
            assert!(
                decode(&corrupted).is_err(),
                "corruption at byte {offset} went unnoticed"
            );
        }
    }

    #[test]
    fn test_rate_byte_corruption_is_checksum_error() {
        let mut data = encode_imu_v2(0, &[sensor()]);
        // first byte of the f32 rate of sensor 0
        data[FIXED_HEADER_LEN + SENSOR_ID_LEN] ^= 0x01;
        assert!(matches!(
            decode(&data),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = encode_imu_v2(0, &[sensor()]);
        data[0] = b'X';
        assert!(matches!(decode(&data), Err(DecodeError::BadMagic { .. })));
    }

    #[test]
    fn test_truncated_data_section() {
        let mut data = encode_imu_v2(0, &[sensor()]);
        data.truncate(data.len() - 3);
        let err = decode(&data).unwrap_err();
        assert!(err.to_string().contains("data section"));
    }

    #[test]
    fn test_short_file() {
        assert!(matches!(
            decode(b"SPDI\x02"),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_duplicate_counters_are_quirks() {
        let data = encode_imu_v2(0, &[sensor().with_counters(vec![0, 1, 1, 2])]);
        let recording = decode(&data).unwrap();
        let s = &recording.sensors[0];
        assert_eq!(s.counter, [0, 1, 2]);
        assert_eq!(s.quirks.duplicates, 1);
    }

    #[test]
    fn test_magnetometer_channel() {
        let data = encode_imu_v2(0, &[ImuSensorFixture::new("9e82", 100.0, 2).with_mag(|_| [100, -50, 0])]);
        let recording = decode(&data).unwrap();
        let mag = recording.sensors[0].mag.as_ref().unwrap();
        assert!((mag[1].x - 10.0).abs() < 1e-12);
        assert!((mag[1].y + 5.0).abs() < 1e-12);
        assert!(recording.sensors[0].sync.is_none());
    }
}
