use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

/// Soil moisture voltage at or below which the probe is considered submerged.
pub const WET_VOLTAGE_MAX: f64 = 0.77;

/// Soil moisture voltage above which the soil is considered dry.
pub const OK_VOLTAGE_MAX: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoistureCategory {
    Wet,
    Ok,
    Dry,
}

impl MoistureCategory {
    pub fn from_voltage(voltage: f64) -> Self {
        if voltage <= WET_VOLTAGE_MAX {
            MoistureCategory::Wet
        } else if voltage <= OK_VOLTAGE_MAX {
            MoistureCategory::Ok
        } else {
            MoistureCategory::Dry
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoistureCategory::Wet => "wet",
            MoistureCategory::Ok => "ok",
            MoistureCategory::Dry => "dry",
        }
    }
}

impl fmt::Display for MoistureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields a single sensor contributes to a [`Reading`].
///
/// Each variant only carries the fields owned by one kind of sensor, so a
/// sensor cannot fill in another sensor's columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Light {
        visible: u16,
        infrared: u16,
        uv_index: f64,
    },
    Temperature {
        celsius: f64,
    },
    Moisture {
        raw: u16,
        voltage: f64,
        category: MoistureCategory,
    },
    Lumen {
        lux: f64,
    },
}

/// One merged record per tick.
///
/// Serializes with the camelCase field names the collector expects. Absent
/// measurements serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub sensor_id: String,

    pub temp_c: Option<f64>,

    pub vis_light: Option<u16>,

    pub ir_light: Option<u16>,

    pub uv_ix: Option<f64>,

    pub raw_moisture: Option<u16>,

    pub volt_moisture: Option<f64>,

    pub rel_moisture: Option<MoistureCategory>,

    pub lumen: Option<f64>,

    #[serde(serialize_with = "serialize_rfc3339")]
    pub measurement_ts: DateTime<Tz>,
}

impl Reading {
    pub fn new(sensor_id: impl Into<String>, measurement_ts: DateTime<Tz>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            temp_c: None,
            vis_light: None,
            ir_light: None,
            uv_ix: None,
            raw_moisture: None,
            volt_moisture: None,
            rel_moisture: None,
            lumen: None,
            measurement_ts,
        }
    }

    pub fn apply(&mut self, metric: Metric) {
        match metric {
            Metric::Light {
                visible,
                infrared,
                uv_index,
            } => self.set_light(visible, infrared, uv_index),
            Metric::Temperature { celsius } => self.set_temperature(celsius),
            Metric::Moisture {
                raw,
                voltage,
                category,
            } => self.set_moisture(raw, voltage, category),
            Metric::Lumen { lux } => self.set_lumen(lux),
        }
    }

    pub fn set_light(&mut self, visible: u16, infrared: u16, uv_index: f64) {
        self.vis_light = Some(visible);
        self.ir_light = Some(infrared);
        self.uv_ix = Some(uv_index);
    }

    pub fn set_temperature(&mut self, celsius: f64) {
        self.temp_c = Some(celsius);
    }

    pub fn set_moisture(&mut self, raw: u16, voltage: f64, category: MoistureCategory) {
        self.raw_moisture = Some(raw);
        self.volt_moisture = Some(voltage);
        self.rel_moisture = Some(category);
    }

    pub fn set_lumen(&mut self, lux: f64) {
        self.lumen = Some(lux);
    }
}

fn serialize_rfc3339<S: Serializer>(ts: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339())
}
