use anyhow::{Context as _, Result, bail};

use crate::driver::SpiBus;

pub const CHANNELS: u8 = 8;

const REFERENCE_VOLTAGE: f64 = 3.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcSample {
    /// Conversion result scaled to 16 bits.
    pub raw: u16,
    pub voltage: f64,
}

/// One single-ended input of an MCP3008 10-bit ADC.
pub struct Mcp3008<S> {
    spi: S,
    channel: u8,
}

impl<S: SpiBus> Mcp3008<S> {
    pub fn new(spi: S, channel: u8) -> Result<Self> {
        if channel >= CHANNELS {
            bail!("MCP3008 channel out of range: expected 0-7, got {channel}");
        }

        Ok(Self { spi, channel })
    }

    pub fn read(&mut self) -> Result<AdcSample> {
        let tx = [0x01, (0x08 | self.channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&tx, &mut rx)
            .with_context(|| format!("failed to read MCP3008 channel {}", self.channel))?;

        let count = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);

        Ok(scale(count))
    }
}

fn scale(count: u16) -> AdcSample {
    let raw = count << 6;

    AdcSample {
        raw,
        voltage: f64::from(raw) * REFERENCE_VOLTAGE / f64::from(u16::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::bus::fake::FakeSpiBus;

    #[test]
    fn rejects_channel_out_of_range() {
        assert!(Mcp3008::new(FakeSpiBus::default(), 8).is_err());
    }

    #[test]
    fn sends_single_ended_command() {
        let spi = FakeSpiBus {
            response: vec![0x00, 0x00, 0x00],
            ..Default::default()
        };
        let mut adc = Mcp3008::new(spi, 3).unwrap();

        adc.read().unwrap();

        assert_eq!(adc.spi.sent, [vec![0x01, 0xb0, 0x00]]);
    }

    #[test]
    fn scales_to_sixteen_bits() {
        let spi = FakeSpiBus {
            response: vec![0xff, 0xfe, 0x00],
            ..Default::default()
        };
        let mut adc = Mcp3008::new(spi, 0).unwrap();

        let sample = adc.read().unwrap();

        assert_eq!(sample.raw, 512 << 6);
        assert!((sample.voltage - 32768.0 * 3.3 / 65535.0).abs() < 1e-9);
    }

    #[test]
    fn full_scale_stays_below_reference() {
        let sample = scale(0x3ff);
        assert_eq!(sample.raw, 0xffc0);
        assert!(sample.voltage < REFERENCE_VOLTAGE);
    }
}
