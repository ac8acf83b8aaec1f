//! CSV IMU exports (`.csv`)
//!
//! ```text
//! # sensor 9e82 rate=204.8 sync
//! # sensor c41a rate=204.8 mag
//! # start_unix_ms=1556791200000
//! sensor,counter,acc_x,acc_y,acc_z,gyr_x,gyr_y,gyr_z,mag_x,mag_y,mag_z,sync
//! 9e82,0,0.1,0.0,9.81,0.0,0.0,0.0,,,,0.0
//! ```
//!
//! Values are already in physical units.

use std::collections::HashMap;

use contracts::{ImuFormatRevision, Vector3};

use crate::error::{DecodeError, Result};
use crate::imu::samples::{Sample, SensorSamples};
use crate::imu::ImuRecording;

const REQUIRED_COLUMNS: [&str; 8] = [
    "sensor", "counter", "acc_x", "acc_y", "acc_z", "gyr_x", "gyr_y", "gyr_z",
];
const MAG_COLUMNS: [&str; 3] = ["mag_x", "mag_y", "mag_z"];
const SYNC_COLUMN: &str = "sync";

/// `# sensor <id> rate=<hz> [mag] [sync]`
#[derive(Debug)]
struct SensorDeclaration {
    id: String,
    rate_hz: f64,
    mag: bool,
    sync: bool,
}

fn parse_declaration(line: &str) -> Result<Option<SensorDeclaration>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("sensor") {
        return Ok(None);
    }
    let id = tokens
        .next()
        .ok_or_else(|| DecodeError::invalid(format!("sensor line without id: '{line}'")))?
        .to_ascii_lowercase();

    let mut declaration = SensorDeclaration {
        id,
        rate_hz: f64::NAN,
        mag: false,
        sync: false,
    };
    for token in tokens {
        match token {
            "mag" => declaration.mag = true,
            "sync" => declaration.sync = true,
            _ => {
                if let Some(rate) = token.strip_prefix("rate=") {
                    declaration.rate_hz = rate.parse().map_err(|_| {
                        DecodeError::invalid(format!(
                            "sensor '{}': bad rate '{rate}'",
                            declaration.id
                        ))
                    })?;
                }
            }
        }
    }

    if !declaration.rate_hz.is_finite() || declaration.rate_hz <= 0.0 {
        return Err(DecodeError::invalid(format!(
            "sensor '{}': missing or invalid rate",
            declaration.id
        )));
    }
    Ok(Some(declaration))
}

fn parse_start(line: &str) -> Result<Option<i64>> {
    match line.trim().strip_prefix("start_unix_ms=") {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DecodeError::invalid(format!("bad start_unix_ms '{value}'"))),
        None => Ok(None),
    }
}

/// Column positions in the table header
struct Columns {
    required: [usize; 8],
    mag: Option<[usize; 3]>,
    sync: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);

        let mut required = [0; 8];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = find(name)
                .ok_or_else(|| DecodeError::invalid(format!("missing column '{name}'")))?;
        }
        let mag = match MAG_COLUMNS.map(find) {
            [Some(x), Some(y), Some(z)] => Some([x, y, z]),
            _ => None,
        };
        Ok(Self {
            required,
            mag,
            sync: find(SYNC_COLUMN),
        })
    }
}

fn cell<'r>(record: &'r csv::StringRecord, idx: usize, row: usize) -> Result<&'r str> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| DecodeError::invalid(format!("row {row}: missing column {idx}")))
}

fn number<T: std::str::FromStr>(record: &csv::StringRecord, idx: usize, row: usize) -> Result<T> {
    let text = cell(record, idx, row)?;
    text.parse()
        .map_err(|_| DecodeError::invalid(format!("row {row}: cannot parse '{text}'")))
}

fn vector(record: &csv::StringRecord, idx: [usize; 3], row: usize) -> Result<Vector3> {
    Ok(Vector3::new(
        number(record, idx[0], row)?,
        number(record, idx[1], row)?,
        number(record, idx[2], row)?,
    ))
}

/// Decode a complete CSV export
pub(crate) fn decode(data: &[u8]) -> Result<ImuRecording> {
    let text = std::str::from_utf8(data).map_err(|_| DecodeError::invalid("file is not UTF-8"))?;

    let mut declarations = Vec::new();
    let mut start_unix_ms = None;
    for line in text.lines().filter_map(|l| l.trim_start().strip_prefix('#')) {
        if let Some(declaration) = parse_declaration(line)? {
            declarations.push(declaration);
        } else if let Some(start) = parse_start(line)? {
            start_unix_ms = Some(start);
        }
    }
    if declarations.is_empty() {
        return Err(DecodeError::invalid("no '# sensor' declarations"));
    }

    let mut sensors: Vec<SensorSamples> = Vec::with_capacity(declarations.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for d in &declarations {
        if index.insert(d.id.clone(), sensors.len()).is_some() {
            return Err(DecodeError::invalid(format!("sensor '{}' declared twice", d.id)));
        }
        sensors.push(SensorSamples::new(d.id.clone(), d.rate_hz, d.mag, d.sync, 0));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(data);
    let columns = Columns::from_header(reader.headers()?)?;

    let [sensor_col, counter_col, ax, ay, az, gx, gy, gz] = columns.required;
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let id = cell(&record, sensor_col, row)?.to_ascii_lowercase();
        let slot = *index.get(&id).ok_or_else(|| {
            DecodeError::invalid(format!("row {row}: undeclared sensor '{id}'"))
        })?;
        let samples = &mut sensors[slot];

        let mag = if samples.has_mag() {
            let idx = columns.mag.ok_or_else(|| {
                DecodeError::invalid(format!("sensor '{id}' declares mag but mag columns are missing"))
            })?;
            Some(vector(&record, idx, row)?)
        } else {
            None
        };
        let sync = if samples.has_sync() {
            let idx = columns.sync.ok_or_else(|| {
                DecodeError::invalid(format!("sensor '{id}' declares sync but the sync column is missing"))
            })?;
            Some(number(&record, idx, row)?)
        } else {
            None
        };

        samples.push(Sample {
            counter: number(&record, counter_col, row)?,
            acc: vector(&record, [ax, ay, az], row)?,
            gyr: vector(&record, [gx, gy, gz], row)?,
            mag,
            sync,
        });
    }

    let sensors = sensors.into_iter().map(SensorSamples::finish).collect();

    Ok(ImuRecording {
        format: ImuFormatRevision::Csv,
        start_unix_ms,
        sensors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
# sensor 9E82 rate=204.8 sync
# sensor c41a rate=204.8 mag
# start_unix_ms=1556791200000
sensor,counter,acc_x,acc_y,acc_z,gyr_x,gyr_y,gyr_z,mag_x,mag_y,mag_z,sync
9e82,0,0.1,0.0,9.81,1.0,2.0,3.0,,,,0.0
c41a,0,0.0,0.0,9.81,0.0,0.0,0.0,20.0,-4.0,40.5,
9e82,1,0.2,0.0,9.81,1.0,2.0,3.0,,,,1.0
9e82,1,0.2,0.0,9.81,1.0,2.0,3.0,,,,1.0
c41a,1,0.0,0.0,9.81,0.0,0.0,0.0,20.0,-4.0,40.5,
";

    #[test]
    fn test_decode_export() {
        let recording = decode(EXPORT.as_bytes()).unwrap();
        assert_eq!(recording.format, ImuFormatRevision::Csv);
        assert_eq!(recording.start_unix_ms, Some(1_556_791_200_000));
        assert_eq!(recording.sensors.len(), 2);

        let a = &recording.sensors[0];
        assert_eq!(a.sensor_id, "9e82");
        assert_eq!(a.sampling_rate_hz, 204.8);
        assert_eq!(a.counter, [0, 1]);
        assert_eq!(a.quirks.duplicates, 1);
        assert_eq!(a.sync.as_ref().unwrap(), &[0.0, 1.0]);
        assert_eq!(a.gyr[1], Vector3::new(1.0, 2.0, 3.0));

        let b = &recording.sensors[1];
        assert_eq!(b.mag.as_ref().unwrap()[0], Vector3::new(20.0, -4.0, 40.5));
        assert!(b.sync.is_none());
    }

    #[test]
    fn test_no_declarations() {
        let err = decode(b"sensor,counter\n").unwrap_err();
        assert!(err.to_string().contains("declarations"));
    }

    #[test]
    fn test_undeclared_sensor_row() {
        let data = EXPORT.replace("c41a,1,", "ffff,1,");
        let err = decode(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("undeclared sensor 'ffff'"));
    }

    #[test]
    fn test_bad_number() {
        let data = EXPORT.replace("9e82,0,0.1", "9e82,0,abc");
        let err = decode(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("cannot parse 'abc'"));
    }

    #[test]
    fn test_bad_rate() {
        let data = EXPORT.replace("rate=204.8 sync", "rate=-1 sync");
        assert!(decode(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_column() {
        let data = EXPORT.replace("gyr_z", "gyro_z");
        let err = decode(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("missing column 'gyr_z'"));
    }
}
