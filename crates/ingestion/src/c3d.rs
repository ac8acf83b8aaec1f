//! Motion-capture recordings (`.c3d`)
//!
//! Intel-ordered subset of the C3D format: a 512-byte header block, a parameter section
//! of groups and typed multi-dimensional parameters, and a data section holding per-frame
//! point records (`x, y, z, residual`) followed by analog samples.
//!
//! A point with a negative residual, or with all three coordinates exactly zero, is a gap.

use std::collections::HashMap;
use std::path::Path;

use contracts::{AnalogChannel, MarkerTrajectory, RawMocapStream, Vector3};

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};

pub const BLOCK_LEN: usize = 512;
pub const C3D_KEY: u8 = 0x50;
pub const PROCESSOR_INTEL: u8 = 84;

/// Parameter data types as stored in the file
pub const TYPE_CHAR: i8 = -1;
pub const TYPE_BYTE: i8 = 1;
pub const TYPE_INT: i8 = 2;
pub const TYPE_FLOAT: i8 = 4;

#[derive(Debug, Clone, Copy)]
struct Header {
    param_block: usize,
    point_count: usize,
    analog_values_per_frame: usize,
    first_frame: usize,
    last_frame: usize,
    scale: f32,
    data_block: usize,
    analog_samples_per_frame: usize,
    frame_rate: f32,
}

fn read_header(data: &[u8]) -> Result<Header> {
    let block = ByteCursor::new(data, "C3D header").bytes(BLOCK_LEN)?;
    let mut c = ByteCursor::new(block, "C3D header");

    let param_block = usize::from(c.u8()?);
    let key = c.u8()?;
    if key != C3D_KEY {
        return Err(DecodeError::BadMagic {
            expected: "C3D key 0x50",
            found: vec![key],
        });
    }
    let point_count = usize::from(c.u16()?);
    let analog_values_per_frame = usize::from(c.u16()?);
    let first_frame = usize::from(c.u16()?);
    let last_frame = usize::from(c.u16()?);
    c.skip(2)?; // max interpolation gap
    let scale = c.f32()?;
    let data_block = usize::from(c.u16()?);
    let analog_samples_per_frame = usize::from(c.u16()?);
    let frame_rate = c.f32()?;

    if param_block == 0 || data_block == 0 {
        return Err(DecodeError::invalid("block pointers must be 1-based"));
    }

    Ok(Header {
        param_block,
        point_count,
        analog_values_per_frame,
        first_frame,
        last_frame,
        scale,
        data_block,
        analog_samples_per_frame,
        frame_rate,
    })
}

/// One parameter with its raw payload
#[derive(Debug, Clone)]
struct Parameter {
    kind: i8,
    dims: Vec<usize>,
    data: Vec<u8>,
}

impl Parameter {
    /// Strings of a char parameter; the first dimension is the string length
    fn strings(&self) -> Vec<String> {
        if self.kind != TYPE_CHAR || self.dims.is_empty() {
            return Vec::new();
        }
        let len = self.dims[0];
        if len == 0 {
            return Vec::new();
        }
        self.data
            .chunks(len)
            .map(|chunk| String::from_utf8_lossy(chunk).trim().to_string())
            .collect()
    }

    /// Numeric values, whatever the stored type
    fn numbers(&self) -> Vec<f64> {
        match self.kind {
            TYPE_FLOAT => self
                .data
                .chunks_exact(4)
                .map(|b| f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]])))
                .collect(),
            TYPE_INT => self
                .data
                .chunks_exact(2)
                .map(|b| f64::from(i16::from_le_bytes([b[0], b[1]])))
                .collect(),
            TYPE_BYTE => self.data.iter().map(|b| f64::from(*b)).collect(),
            _ => Vec::new(),
        }
    }

    fn first_number(&self) -> Option<f64> {
        self.numbers().first().copied()
    }
}

/// Parameters keyed by upper-case `(group, name)`
#[derive(Debug, Default)]
struct Parameters {
    entries: HashMap<(String, String), Parameter>,
}

impl Parameters {
    fn get(&self, group: &str, name: &str) -> Option<&Parameter> {
        self.entries.get(&(group.to_string(), name.to_string()))
    }
}

fn read_parameters(data: &[u8], header: &Header) -> Result<Parameters> {
    let start = (header.param_block - 1) * BLOCK_LEN;
    let mut c = ByteCursor::new(data.get(start..).unwrap_or_default(), "C3D parameter section");
    c.skip(2)?;
    let block_count = usize::from(c.u8()?);
    let processor = c.u8()?;
    if processor != PROCESSOR_INTEL {
        return Err(DecodeError::Unsupported {
            what: "C3D processor type",
            value: i64::from(processor),
        });
    }

    let section_len = block_count.max(1) * BLOCK_LEN;
    let section = ByteCursor::new(&data[start..], "C3D parameter section").bytes(section_len)?;

    let mut groups: HashMap<i8, String> = HashMap::new();
    let mut raw: Vec<(i8, String, Parameter)> = Vec::new();
    let mut pos = 4;

    while pos + 2 <= section.len() {
        let name_len = section[pos] as i8;
        let id = section[pos + 1] as i8;
        if name_len == 0 || id == 0 {
            break;
        }

        let mut c = ByteCursor::new(&section[pos + 2..], "C3D parameter");
        let name_bytes = c.bytes(usize::from(name_len.unsigned_abs()))?;
        let name = String::from_utf8_lossy(name_bytes).trim().to_ascii_uppercase();
        let offset_pos = pos + 2 + name_bytes.len();
        let offset = c.i16()?;

        if id < 0 {
            groups.insert(-id, name);
        } else {
            let kind = c.i8()?;
            let dim_count = usize::from(c.u8()?);
            let mut dims = Vec::with_capacity(dim_count);
            for _ in 0..dim_count {
                dims.push(usize::from(c.u8()?));
            }
            let elements: usize = dims.iter().product();
            let size = usize::from(kind.unsigned_abs()) * elements;
            let payload = c.bytes(size)?.to_vec();
            raw.push((
                id,
                name,
                Parameter {
                    kind,
                    dims,
                    data: payload,
                },
            ));
        }

        if offset <= 0 {
            break;
        }
        pos = offset_pos + offset as usize;
    }

    let mut parameters = Parameters::default();
    for (group_id, name, parameter) in raw {
        let group = groups
            .get(&group_id)
            .cloned()
            .unwrap_or_else(|| format!("GROUP{group_id}"));
        parameters.entries.insert((group, name), parameter);
    }
    Ok(parameters)
}

/// Per-channel analog conversion
struct AnalogScaling {
    scale: Vec<f64>,
    offset: Vec<f64>,
    general: f64,
}

impl AnalogScaling {
    fn from_parameters(parameters: &Parameters) -> Self {
        Self {
            scale: parameters
                .get("ANALOG", "SCALE")
                .map(Parameter::numbers)
                .unwrap_or_default(),
            offset: parameters
                .get("ANALOG", "OFFSET")
                .map(Parameter::numbers)
                .unwrap_or_default(),
            general: parameters
                .get("ANALOG", "GEN_SCALE")
                .and_then(Parameter::first_number)
                .unwrap_or(1.0),
        }
    }

    fn apply(&self, channel: usize, raw: f64) -> f64 {
        let scale = self.scale.get(channel).copied().unwrap_or(1.0);
        let offset = self.offset.get(channel).copied().unwrap_or(0.0);
        (raw - offset) * scale * self.general
    }
}

/// Decode a complete C3D file
pub(crate) fn decode(data: &[u8], source: &Path) -> Result<RawMocapStream> {
    let header = read_header(data)?;
    let parameters = read_parameters(data, &header)?;

    let frame_rate = parameters
        .get("POINT", "RATE")
        .and_then(Parameter::first_number)
        .unwrap_or(f64::from(header.frame_rate));
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        return Err(DecodeError::invalid(format!("invalid frame rate {frame_rate}")));
    }

    let labels = point_labels(&parameters, header.point_count)?;

    let (channels, samples_per_frame) = analog_layout(&header)?;
    let analog_labels: Vec<String> = {
        let mut labels: Vec<String> = parameters
            .get("ANALOG", "LABELS")
            .map(Parameter::strings)
            .unwrap_or_default()
            .into_iter()
            .map(|l| l.to_lowercase())
            .collect();
        labels.resize_with(channels.max(labels.len()), String::new);
        labels
            .into_iter()
            .take(channels)
            .enumerate()
            .map(|(i, l)| if l.is_empty() { format!("channel_{}", i + 1) } else { l })
            .collect()
    };
    let analog_rate = parameters
        .get("ANALOG", "RATE")
        .and_then(Parameter::first_number)
        .unwrap_or(frame_rate * samples_per_frame as f64);
    let scaling = AnalogScaling::from_parameters(&parameters);

    if header.last_frame < header.first_frame {
        return Err(DecodeError::invalid(format!(
            "last frame {} before first frame {}",
            header.last_frame, header.first_frame
        )));
    }
    let frame_count = header.last_frame - header.first_frame + 1;
    let float_storage = header.scale < 0.0;
    let point_scale = f64::from(header.scale.abs());

    let start = (header.data_block - 1) * BLOCK_LEN;
    let mut c = ByteCursor::new(data.get(start..).unwrap_or_default(), "C3D data section");

    let mut positions: Vec<Vec<Option<Vector3>>> =
        vec![Vec::with_capacity(frame_count); header.point_count];
    let mut analog: Vec<Vec<f64>> =
        vec![Vec::with_capacity(frame_count * samples_per_frame); channels];

    for _ in 0..frame_count {
        for trajectory in positions.iter_mut() {
            let (x, y, z, residual) = if float_storage {
                (
                    f64::from(c.f32()?),
                    f64::from(c.f32()?),
                    f64::from(c.f32()?),
                    f64::from(c.f32()?),
                )
            } else {
                (
                    f64::from(c.i16()?) * point_scale,
                    f64::from(c.i16()?) * point_scale,
                    f64::from(c.i16()?) * point_scale,
                    f64::from(c.i16()?),
                )
            };
            let gap = residual < 0.0 || (x == 0.0 && y == 0.0 && z == 0.0);
            trajectory.push((!gap).then(|| Vector3::new(x, y, z)));
        }

        for _ in 0..samples_per_frame {
            for (channel, samples) in analog.iter_mut().enumerate() {
                let raw = if float_storage {
                    f64::from(c.f32()?)
                } else {
                    f64::from(c.i16()?)
                };
                samples.push(scaling.apply(channel, raw));
            }
        }
    }

    Ok(RawMocapStream {
        source: source.to_path_buf(),
        frame_rate_hz: frame_rate,
        analog_rate_hz: analog_rate,
        markers: labels
            .into_iter()
            .zip(positions)
            .map(|(label, positions)| MarkerTrajectory { label, positions })
            .collect(),
        analog: analog_labels
            .into_iter()
            .zip(analog)
            .map(|(label, samples)| AnalogChannel { label, samples })
            .collect(),
        frame_count,
    })
}

fn point_labels(parameters: &Parameters, point_count: usize) -> Result<Vec<String>> {
    if point_count == 0 {
        return Err(DecodeError::invalid("recording has no marker points"));
    }
    let labels = parameters
        .get("POINT", "LABELS")
        .map(Parameter::strings)
        .unwrap_or_default();
    if labels.is_empty() {
        return Err(DecodeError::invalid("missing POINT:LABELS"));
    }
    if labels.len() < point_count {
        return Err(DecodeError::invalid(format!(
            "{} point labels for {point_count} points",
            labels.len()
        )));
    }
    Ok(labels
        .into_iter()
        .take(point_count)
        .map(|l| l.to_lowercase())
        .collect())
}

/// (channels, samples per frame)
fn analog_layout(header: &Header) -> Result<(usize, usize)> {
    if header.analog_values_per_frame == 0 {
        return Ok((0, 0));
    }
    let per_frame = header.analog_samples_per_frame.max(1);
    if header.analog_values_per_frame % per_frame != 0 {
        return Err(DecodeError::invalid(format!(
            "{} analog values per frame is not a multiple of {per_frame} samples",
            header.analog_values_per_frame
        )));
    }
    Ok((header.analog_values_per_frame / per_frame, per_frame))
}
