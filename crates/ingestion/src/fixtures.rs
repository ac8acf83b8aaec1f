//! Recording builders for tests
//!
//! Produce byte-exact files in every supported format so decoders, the trial loader
//! and end-to-end tests share one source of synthetic recordings.

use bytes::BufMut;

use crate::c3d::{BLOCK_LEN, C3D_KEY, PROCESSOR_INTEL, TYPE_CHAR, TYPE_FLOAT, TYPE_INT};
use crate::imu::binary::{
    FLAG_MAG, FLAG_SYNC, FULL_SCALE, GRAVITY, LEGACY_ACC_RANGE_G, LEGACY_BASE_RATE_HZ,
    LEGACY_GYR_RANGE_DPS, MAG_UT_PER_LSB, MAGIC, SENSOR_ID_LEN, SYNC_FULL_SCALE, CRC16, CRC32,
};

/// Raw sample values of one IMU sensor
#[derive(Debug, Clone)]
pub struct ImuSensorFixture {
    pub sensor_id: String,
    pub rate_hz: f64,
    pub acc_range_g: u8,
    pub gyr_range_dps: u16,
    counters: Vec<u32>,
    acc: Vec<[i16; 3]>,
    gyr: Vec<[i16; 3]>,
    mag: Option<Vec<[i16; 3]>>,
    sync: Option<Vec<u16>>,
}

impl ImuSensorFixture {
    /// `samples` zero-valued samples with counters `0..samples`
    pub fn new(sensor_id: &str, rate_hz: f64, samples: usize) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            rate_hz,
            acc_range_g: LEGACY_ACC_RANGE_G,
            gyr_range_dps: LEGACY_GYR_RANGE_DPS,
            counters: (0..samples as u32).collect(),
            acc: vec![[0; 3]; samples],
            gyr: vec![[0; 3]; samples],
            mag: None,
            sync: None,
        }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn with_acc(mut self, f: impl Fn(usize) -> [i16; 3]) -> Self {
        self.acc = (0..self.len()).map(f).collect();
        self
    }

    pub fn with_gyr(mut self, f: impl Fn(usize) -> [i16; 3]) -> Self {
        self.gyr = (0..self.len()).map(f).collect();
        self
    }

    pub fn with_mag(mut self, f: impl Fn(usize) -> [i16; 3]) -> Self {
        self.mag = Some((0..self.len()).map(f).collect());
        self
    }

    pub fn with_sync(mut self, f: impl Fn(usize) -> u16) -> Self {
        self.sync = Some((0..self.len()).map(f).collect());
        self
    }

    /// Replace the counters; channels are resized to match
    pub fn with_counters(mut self, counters: Vec<u32>) -> Self {
        let n = counters.len();
        self.counters = counters;
        self.acc.resize(n, [0; 3]);
        self.gyr.resize(n, [0; 3]);
        if let Some(mag) = &mut self.mag {
            mag.resize(n, [0; 3]);
        }
        if let Some(sync) = &mut self.sync {
            sync.resize(n, 0);
        }
        self
    }

    pub fn with_ranges(mut self, acc_range_g: u8, gyr_range_dps: u16) -> Self {
        self.acc_range_g = acc_range_g;
        self.gyr_range_dps = gyr_range_dps;
        self
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.mag.is_some() {
            flags |= FLAG_MAG;
        }
        if self.sync.is_some() {
            flags |= FLAG_SYNC;
        }
        flags
    }

    fn put_id(&self, buf: &mut Vec<u8>) {
        let mut id = [0u8; SENSOR_ID_LEN];
        for (slot, b) in id.iter_mut().zip(self.sensor_id.bytes()) {
            *slot = b;
        }
        buf.put_slice(&id);
    }

    fn put_samples(&self, buf: &mut Vec<u8>) {
        for i in 0..self.len() {
            buf.put_u32_le(self.counters[i]);
            self.acc[i].iter().for_each(|v| buf.put_i16_le(*v));
            self.gyr[i].iter().for_each(|v| buf.put_i16_le(*v));
            if let Some(mag) = &self.mag {
                mag[i].iter().for_each(|v| buf.put_i16_le(*v));
            }
            if let Some(sync) = &self.sync {
                buf.put_u16_le(sync[i]);
            }
        }
    }
}

/// Current binary revision
pub fn encode_imu_v2(start_unix_ms: i64, sensors: &[ImuSensorFixture]) -> Vec<u8> {
    let header_len = 16 + sensors.len() * 24 + 4;
    let mut buf = Vec::with_capacity(header_len);
    buf.put_slice(MAGIC);
    buf.put_u8(2);
    buf.put_u8(sensors.len() as u8);
    buf.put_u16_le(header_len as u16);
    buf.put_i64_le(start_unix_ms);
    for s in sensors {
        s.put_id(&mut buf);
        buf.put_f32_le(s.rate_hz as f32);
        buf.put_u8(s.acc_range_g);
        buf.put_u16_le(s.gyr_range_dps);
        buf.put_u8(s.flags());
        buf.put_u32_le(s.len() as u32);
        buf.put_bytes(0, 4);
    }
    let crc = CRC32.checksum(&buf);
    buf.put_u32_le(crc);

    sensors.iter().for_each(|s| s.put_samples(&mut buf));
    buf
}

/// Legacy binary revision; the rate is stored as a divider of the base rate
pub fn encode_imu_v1(start_unix_ms: i64, sensors: &[ImuSensorFixture]) -> Vec<u8> {
    let header_len = 16 + sensors.len() * 16 + 2;
    let mut buf = Vec::with_capacity(header_len);
    buf.put_slice(MAGIC);
    buf.put_u8(1);
    buf.put_u8(sensors.len() as u8);
    buf.put_u16_le(header_len as u16);
    buf.put_i64_le(start_unix_ms);
    for s in sensors {
        s.put_id(&mut buf);
        buf.put_u8((LEGACY_BASE_RATE_HZ / s.rate_hz).round() as u8);
        buf.put_u8(s.flags());
        buf.put_u32_le(s.len() as u32);
        buf.put_bytes(0, 2);
    }
    let crc = CRC16.checksum(&buf);
    buf.put_u16_le(crc);

    sensors.iter().for_each(|s| s.put_samples(&mut buf));
    buf
}

/// CSV export carrying the same physical values as the binary encoders
pub fn encode_imu_csv(start_unix_ms: Option<i64>, sensors: &[ImuSensorFixture]) -> Vec<u8> {
    let mut out = String::new();
    for s in sensors {
        out.push_str(&format!("# sensor {} rate={}", s.sensor_id, s.rate_hz));
        if s.mag.is_some() {
            out.push_str(" mag");
        }
        if s.sync.is_some() {
            out.push_str(" sync");
        }
        out.push('\n');
    }
    if let Some(start) = start_unix_ms {
        out.push_str(&format!("# start_unix_ms={start}\n"));
    }
    out.push_str("sensor,counter,acc_x,acc_y,acc_z,gyr_x,gyr_y,gyr_z,mag_x,mag_y,mag_z,sync\n");

    let physical = |raw: [i16; 3], factor: f64| -> String {
        raw.iter()
            .map(|v| (f64::from(*v) * factor).to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    for s in sensors {
        let acc_factor = f64::from(s.acc_range_g) * GRAVITY / FULL_SCALE;
        let gyr_factor = f64::from(s.gyr_range_dps) / FULL_SCALE;
        for i in 0..s.len() {
            let mag = s
                .mag
                .as_ref()
                .map(|m| physical(m[i], MAG_UT_PER_LSB))
                .unwrap_or_else(|| ",,".to_string());
            let sync = s
                .sync
                .as_ref()
                .map(|v| (f64::from(v[i]) / SYNC_FULL_SCALE).to_string())
                .unwrap_or_default();
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                s.sensor_id,
                s.counters[i],
                physical(s.acc[i], acc_factor),
                physical(s.gyr[i], gyr_factor),
                mag,
                sync
            ));
        }
    }
    out.into_bytes()
}

/// Synthetic motion-capture recording
#[derive(Debug, Clone)]
pub struct C3dFixture {
    frame_rate_hz: f32,
    frames: usize,
    markers: Vec<(String, Vec<Option<[f32; 3]>>)>,
    analog: Vec<(String, Vec<f32>)>,
    analog_per_frame: usize,
    integer_scale: Option<f32>,
    point_labels: bool,
}

impl C3dFixture {
    pub fn new(frame_rate_hz: f32, frames: usize) -> Self {
        Self {
            frame_rate_hz,
            frames,
            markers: Vec::new(),
            analog: Vec::new(),
            analog_per_frame: 1,
            integer_scale: None,
            point_labels: true,
        }
    }

    pub fn with_marker(mut self, label: &str, f: impl Fn(usize) -> Option<[f32; 3]>) -> Self {
        self.markers
            .push((label.to_string(), (0..self.frames).map(f).collect()));
        self
    }

    /// Analog channel sampled `per_frame` times per frame; `f` gets the sample index
    pub fn with_analog(mut self, label: &str, per_frame: usize, f: impl Fn(usize) -> f32) -> Self {
        self.analog_per_frame = per_frame.max(1);
        let samples = (0..self.frames * self.analog_per_frame).map(f).collect();
        self.analog.push((label.to_string(), samples));
        self
    }

    /// Store points as scaled integers instead of floats
    pub fn with_integer_scale(mut self, scale: f32) -> Self {
        self.integer_scale = Some(scale);
        self
    }

    pub fn without_point_labels(mut self) -> Self {
        self.point_labels = false;
        self
    }

    fn header_scale(&self) -> f32 {
        self.integer_scale.unwrap_or(-1.0)
    }

    pub fn encode(&self) -> Vec<u8> {
        let params = self.parameter_section();
        let param_blocks = params.len() / BLOCK_LEN;
        let channels = self.analog.len();

        let mut buf = Vec::new();
        buf.put_u8(2);
        buf.put_u8(C3D_KEY);
        buf.put_u16_le(self.markers.len() as u16);
        buf.put_u16_le((channels * self.analog_per_frame) as u16);
        buf.put_u16_le(1);
        buf.put_u16_le(self.frames as u16);
        buf.put_u16_le(0);
        buf.put_f32_le(self.header_scale());
        buf.put_u16_le((2 + param_blocks) as u16);
        buf.put_u16_le(if channels == 0 { 0 } else { self.analog_per_frame as u16 });
        buf.put_f32_le(self.frame_rate_hz);
        buf.resize(BLOCK_LEN, 0);

        buf.extend_from_slice(&params);

        for frame in 0..self.frames {
            for (_, positions) in &self.markers {
                let (point, residual) = match positions[frame] {
                    Some(p) => (p, 0.0),
                    None => ([0.0; 3], -1.0),
                };
                match self.integer_scale {
                    Some(scale) => {
                        point
                            .iter()
                            .for_each(|v| buf.put_i16_le((v / scale).round() as i16));
                        buf.put_i16_le(residual as i16);
                    }
                    None => {
                        point.iter().for_each(|v| buf.put_f32_le(*v));
                        buf.put_f32_le(residual);
                    }
                }
            }
            if channels > 0 {
                for sub in 0..self.analog_per_frame {
                    let s = frame * self.analog_per_frame + sub;
                    for (_, samples) in &self.analog {
                        match self.integer_scale {
                            Some(_) => buf.put_i16_le(samples[s].round() as i16),
                            None => buf.put_f32_le(samples[s]),
                        }
                    }
                }
            }
        }
        buf
    }

    fn parameter_section(&self) -> Vec<u8> {
        let mut items: Vec<(i8, &str, Vec<u8>)> = vec![
            (-1, "POINT", vec![0]),
            (1, "USED", int_param(&[self.markers.len() as i16])),
            (1, "RATE", float_param(&[self.frame_rate_hz])),
            (1, "SCALE", float_param(&[self.header_scale()])),
        ];
        if self.point_labels && !self.markers.is_empty() {
            let labels: Vec<&str> = self.markers.iter().map(|(l, _)| l.as_str()).collect();
            items.push((1, "LABELS", char_param(&labels)));
        }

        let channels = self.analog.len();
        items.push((-2, "ANALOG", vec![0]));
        items.push((2, "USED", int_param(&[channels as i16])));
        if channels > 0 {
            let labels: Vec<&str> = self.analog.iter().map(|(l, _)| l.as_str()).collect();
            items.push((2, "LABELS", char_param(&labels)));
            items.push((2, "SCALE", float_param(&vec![1.0; channels])));
            items.push((2, "OFFSET", int_param(&vec![0; channels])));
            items.push((2, "GEN_SCALE", float_param(&[1.0])));
            items.push((
                2,
                "RATE",
                float_param(&[self.frame_rate_hz * self.analog_per_frame as f32]),
            ));
        }

        let mut section = vec![1, C3D_KEY, 0, PROCESSOR_INTEL];
        let last = items.len() - 1;
        for (i, (id, name, body)) in items.iter().enumerate() {
            section.put_i8(name.len() as i8);
            section.put_i8(*id);
            section.put_slice(name.as_bytes());
            let offset = if i == last { 0 } else { 2 + body.len() as i16 };
            section.put_i16_le(offset);
            section.put_slice(body);
        }

        let blocks = section.len().div_ceil(BLOCK_LEN);
        section[2] = blocks as u8;
        section.resize(blocks * BLOCK_LEN, 0);
        section
    }
}

fn param_body(kind: i8, dims: &[usize], data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(3 + dims.len() + data.len());
    body.put_i8(kind);
    body.put_u8(dims.len() as u8);
    dims.iter().for_each(|d| body.put_u8(*d as u8));
    body.put_slice(data);
    body.put_u8(0); // description length
    body
}

fn int_param(values: &[i16]) -> Vec<u8> {
    let mut data = Vec::new();
    values.iter().for_each(|v| data.put_i16_le(*v));
    let dims: &[usize] = if values.len() == 1 { &[] } else { &[values.len()] };
    param_body(TYPE_INT, dims, &data)
}

fn float_param(values: &[f32]) -> Vec<u8> {
    let mut data = Vec::new();
    values.iter().for_each(|v| data.put_f32_le(*v));
    let dims: &[usize] = if values.len() == 1 { &[] } else { &[values.len()] };
    param_body(TYPE_FLOAT, dims, &data)
}

fn char_param(values: &[&str]) -> Vec<u8> {
    let width = values.iter().map(|v| v.len()).max().unwrap_or(1).max(1);
    let mut data = Vec::with_capacity(width * values.len());
    for v in values {
        data.put_slice(v.as_bytes());
        data.put_bytes(b' ', width - v.len());
    }
    param_body(TYPE_CHAR, &[width, values.len()], &data)
}
