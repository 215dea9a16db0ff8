use anyhow::Result;

use crate::driver::{LinuxSpiBus, Mcp3008, SpiBus};
use crate::reading::{Metric, MoistureCategory};
use crate::sensor::{Sensor, SensorKind, SensorParams};

const SPI_SPEED_HZ: u32 = 1_000_000;

/// Resistive soil probe on one MCP3008 input.
pub struct MoistureSensor<S = LinuxSpiBus> {
    adc: Mcp3008<S>,
}

impl MoistureSensor {
    pub fn open(params: &SensorParams) -> Result<Self> {
        let spi = LinuxSpiBus::open(&params.spi_device, SPI_SPEED_HZ)?;
        let adc = Mcp3008::new(spi, params.adc_channel)?;
        Ok(Self::new(adc))
    }
}

impl<S: SpiBus> MoistureSensor<S> {
    pub fn new(adc: Mcp3008<S>) -> Self {
        Self { adc }
    }
}

impl<S: SpiBus> Sensor for MoistureSensor<S> {
    fn kind(&self) -> SensorKind {
        SensorKind::Moisture
    }

    fn read_metric(&mut self) -> Result<Option<Metric>> {
        let sample = self.adc.read()?;

        Ok(Some(Metric::Moisture {
            raw: sample.raw,
            voltage: sample.voltage,
            category: MoistureCategory::from_voltage(sample.voltage),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::bus::fake::FakeSpiBus;

    fn sensor(count: u16) -> MoistureSensor<FakeSpiBus> {
        let spi = FakeSpiBus {
            response: vec![0x00, (count >> 8) as u8, count as u8],
            ..Default::default()
        };
        MoistureSensor::new(Mcp3008::new(spi, 0).unwrap())
    }

    #[test]
    fn categorizes_from_voltage() {
        // 0x0c0 -> 12288 -> ~0.62 V
        let Some(Metric::Moisture { category, .. }) = sensor(0x0c0).read_metric().unwrap() else {
            panic!("expected moisture");
        };
        assert_eq!(category, MoistureCategory::Wet);

        // 0x200 -> ~1.65 V
        let Some(Metric::Moisture { category, .. }) = sensor(0x200).read_metric().unwrap() else {
            panic!("expected moisture");
        };
        assert_eq!(category, MoistureCategory::Dry);

        // 0x100 -> ~0.83 V
        let Some(Metric::Moisture { raw, category, .. }) = sensor(0x100).read_metric().unwrap()
        else {
            panic!("expected moisture");
        };
        assert_eq!(raw, 0x4000);
        assert_eq!(category, MoistureCategory::Ok);
    }

    #[test]
    fn spi_failure_is_an_error() {
        let mut s = MoistureSensor::new(
            Mcp3008::new(
                FakeSpiBus {
                    fail: true,
                    ..Default::default()
                },
                0,
            )
            .unwrap(),
        );
        assert!(s.read_metric().is_err());
    }
}
