use anyhow::Result;

use crate::driver::{I2cBus, LinuxI2cBus, LumenAddress, Max44009};
use crate::reading::Metric;
use crate::sensor::{Sensor, SensorKind, SensorParams};

pub struct LumenSensor<B = LinuxI2cBus> {
    driver: Max44009<B>,
}

impl LumenSensor {
    /// Fails only if the bus itself cannot be opened; the chip may answer on
    /// either address later.
    pub fn open(params: &SensorParams) -> Result<Self> {
        let bus = LinuxI2cBus::open(&params.i2c_bus, LumenAddress::Primary.address())?;
        Ok(Self::new(Max44009::new(bus)))
    }
}

impl<B: I2cBus> LumenSensor<B> {
    pub fn new(driver: Max44009<B>) -> Self {
        Self { driver }
    }
}

impl<B: I2cBus> Sensor for LumenSensor<B> {
    fn kind(&self) -> SensorKind {
        SensorKind::Lumen
    }

    fn read_metric(&mut self) -> Result<Option<Metric>> {
        let lux = self.driver.read_lumen_with_retry()?;
        Ok(Some(Metric::Lumen { lux }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::bus::fake::FakeI2cBus;

    const PRIMARY: u16 = 0x4a;
    const SECONDARY: u16 = 0x4b;

    #[test]
    fn reports_lux() {
        let bus = FakeI2cBus::with_registers(PRIMARY, &[(0x03, 0x71), (0x04, 0x0a)]);
        let mut s = LumenSensor::new(Max44009::new(bus));

        let Some(Metric::Lumen { lux }) = s.read_metric().unwrap() else {
            panic!("expected a lumen metric");
        };
        assert!((lux - 149.76).abs() < 1e-9);
    }

    #[test]
    fn reports_lux_from_secondary_address() {
        let mut bus = FakeI2cBus::with_registers(SECONDARY, &[(0x03, 0x00), (0x04, 0x01)]);
        bus.failing.insert(PRIMARY);
        let mut s = LumenSensor::new(Max44009::new(bus));

        let Some(Metric::Lumen { lux }) = s.read_metric().unwrap() else {
            panic!("expected a lumen metric");
        };
        assert!((lux - 0.045).abs() < 1e-12);
    }

    #[test]
    fn neither_address_answering_is_an_error() {
        let bus = FakeI2cBus::with_registers(PRIMARY, &[(0x03, 0x71), (0x04, 0x0a)]);
        let mut s = LumenSensor::new(Max44009::new(bus));
        assert!(s.read_metric().is_ok());

        s.driver.bus_mut().failing.extend([PRIMARY, SECONDARY]);
        assert!(s.read_metric().is_err());
    }
}
