use anyhow::{Context as _, Result};
use tracing::warn;

use crate::driver::I2cBus;

const REG_CONFIGURATION: u8 = 0x02;
const REG_LUX_HIGH_BYTE: u8 = 0x03;

// Manual mode, 800ms integration, undivided current.
const CONFIG_MANUAL_ON: u8 = 0x40;

const LUX_PER_COUNT: f64 = 0.045;

/// The two addresses the MAX44009 answers on, depending on how A0 settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LumenAddress {
    Primary,
    Secondary,
}

impl LumenAddress {
    pub fn address(&self) -> u16 {
        match self {
            LumenAddress::Primary => 0x4a,
            LumenAddress::Secondary => 0x4b,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            LumenAddress::Primary => LumenAddress::Secondary,
            LumenAddress::Secondary => LumenAddress::Primary,
        }
    }
}

/// Ambient light sensor with address failover.
///
/// The active address survives between reads: a read that had to fail over
/// leaves the driver on the address that answered.
pub struct Max44009<B> {
    bus: B,
    address: LumenAddress,
}

impl<B: I2cBus> Max44009<B> {
    /// Starts on the primary address. A failed configuration write is logged
    /// and otherwise ignored; the first read decides which address is live.
    pub fn new(bus: B) -> Self {
        let mut sensor = Self {
            bus,
            address: LumenAddress::Primary,
        };
        sensor.configure();
        sensor
    }

    pub fn address(&self) -> LumenAddress {
        self.address
    }

    fn configure(&mut self) {
        let address = self.address.address();
        if let Err(err) = self
            .bus
            .write_byte_data(address, REG_CONFIGURATION, CONFIG_MANUAL_ON)
        {
            warn!(address, "failed to configure MAX44009: {err:#}");
        }
    }

    /// Reads the lux registers at the current address, without failover.
    pub fn read_lumen(&mut self) -> Result<f64> {
        let address = self.address.address();
        let mut raw = [0u8; 2];
        self.bus
            .read_block_data(address, REG_LUX_HIGH_BYTE, &mut raw)
            .with_context(|| format!("failed to read lux at 0x{address:02x}"))?;

        Ok(decode_lux(raw[0], raw[1]))
    }

    /// Reads lux, switching to the other address and retrying once if the
    /// current one does not answer.
    pub fn read_lumen_with_retry(&mut self) -> Result<f64> {
        match self.read_lumen() {
            Ok(lux) => return Ok(lux),
            Err(err) => warn!(
                address = self.address.address(),
                "lux read failed, switching address: {err:#}"
            ),
        }

        self.address = self.address.toggled();
        self.configure();

        self.read_lumen()
            .context("MAX44009 did not answer on either address")
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

/// `2^exponent * mantissa * 0.045`, exponent in the high nibble of the high
/// byte, mantissa from the low nibbles of both bytes.
pub fn decode_lux(high: u8, low: u8) -> f64 {
    let exponent = (high & 0xf0) >> 4;
    let mantissa = ((high & 0x0f) << 4) | (low & 0x0f);

    f64::from(1u32 << exponent) * f64::from(mantissa) * LUX_PER_COUNT
}
