use anyhow::{Context as _, Result};

use crate::driver::{I2cBus, LinuxI2cBus, Si1145, address};
use crate::reading::Metric;
use crate::sensor::{Sensor, SensorKind, SensorParams};

/// Visible, infrared and UV index from an SI1145.
pub struct LightSensor<B = LinuxI2cBus> {
    driver: Si1145<B>,
}

impl LightSensor {
    pub fn open(params: &SensorParams) -> Result<Self> {
        let bus = LinuxI2cBus::open(&params.i2c_bus, address::SI1145)?;
        let driver = Si1145::new(bus).context("SI1145 not found")?;
        Ok(Self::new(driver))
    }
}

impl<B: I2cBus> LightSensor<B> {
    pub fn new(driver: Si1145<B>) -> Self {
        Self { driver }
    }
}

impl<B: I2cBus> Sensor for LightSensor<B> {
    fn kind(&self) -> SensorKind {
        SensorKind::Light
    }

    fn read_metric(&mut self) -> Result<Option<Metric>> {
        let sample = self.driver.read()?;

        // The chip reports zero on both ALS channels when a measurement did
        // not complete; that is not a real reading even in the dark.
        if sample.visible == 0 && sample.infrared == 0 {
            return Ok(None);
        }

        Ok(Some(Metric::Light {
            visible: sample.visible,
            infrared: sample.infrared,
            uv_index: sample.uv_index,
        }))
    }
}
