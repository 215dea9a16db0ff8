use anyhow::{Context as _, Result};

use crate::driver::{I2cBus, LinuxI2cBus, Mcp9808, address};
use crate::reading::Metric;
use crate::sensor::{Sensor, SensorKind, SensorParams};

pub struct TemperatureSensor<B = LinuxI2cBus> {
    driver: Mcp9808<B>,
}

impl TemperatureSensor {
    pub fn open(params: &SensorParams) -> Result<Self> {
        let bus = LinuxI2cBus::open(&params.i2c_bus, address::MCP9808)?;
        let driver = Mcp9808::new(bus).context("MCP9808 not found")?;
        Ok(Self::new(driver))
    }
}

impl<B: I2cBus> TemperatureSensor<B> {
    pub fn new(driver: Mcp9808<B>) -> Self {
        Self { driver }
    }
}

impl<B: I2cBus> Sensor for TemperatureSensor<B> {
    fn kind(&self) -> SensorKind {
        SensorKind::Temperature
    }

    fn read_metric(&mut self) -> Result<Option<Metric>> {
        let celsius = self.driver.read_celsius()?;
        Ok(Some(Metric::Temperature { celsius }))
    }
}
