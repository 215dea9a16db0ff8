use anyhow::{Context as _, Result, bail};

use crate::driver::I2cBus;

pub const ADDRESS: u16 = 0x18;

const REG_AMBIENT_TEMP: u8 = 0x05;
const REG_MANUFACTURER_ID: u8 = 0x06;
const REG_DEVICE_ID: u8 = 0x07;

const MANUFACTURER_ID: u16 = 0x0054;
const DEVICE_ID: u8 = 0x04;

/// MCP9808 precision temperature sensor.
pub struct Mcp9808<B> {
    bus: B,
}

impl<B: I2cBus> Mcp9808<B> {
    pub fn new(mut bus: B) -> Result<Self> {
        let manufacturer_id = u16::from_be_bytes(
            read_register(&mut bus, REG_MANUFACTURER_ID)
                .context("failed to read MCP9808 manufacturer id")?,
        );
        if manufacturer_id != MANUFACTURER_ID {
            bail!(
                "unexpected MCP9808 manufacturer id: expected 0x{MANUFACTURER_ID:04x}, got 0x{manufacturer_id:04x}"
            );
        }

        let [device_id, _revision] =
            read_register(&mut bus, REG_DEVICE_ID).context("failed to read MCP9808 device id")?;
        if device_id != DEVICE_ID {
            bail!("unexpected MCP9808 device id: expected 0x{DEVICE_ID:02x}, got 0x{device_id:02x}");
        }

        Ok(Self { bus })
    }

    pub fn read_celsius(&mut self) -> Result<f64> {
        let [upper, lower] = read_register(&mut self.bus, REG_AMBIENT_TEMP)
            .context("failed to read ambient temperature")?;

        Ok(decode_temperature(upper, lower))
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

fn read_register<B: I2cBus>(bus: &mut B, register: u8) -> Result<[u8; 2]> {
    let mut raw = [0u8; 2];
    bus.read_block_data(ADDRESS, register, &mut raw)?;
    Ok(raw)
}

/// Ambient temperature register: 13-bit two's complement in 1/16 °C, the top
/// three bits of the upper byte are alert flags.
pub fn decode_temperature(upper: u8, lower: u8) -> f64 {
    let magnitude = f64::from(upper & 0x0f) * 16.0 + f64::from(lower) / 16.0;

    if upper & 0x10 != 0 {
        magnitude - 256.0
    } else {
        magnitude
    }
}
