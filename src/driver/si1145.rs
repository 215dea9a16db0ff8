use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};

use crate::driver::I2cBus;

pub const ADDRESS: u16 = 0x60;

const REG_PART_ID: u8 = 0x00;
const REG_INT_CFG: u8 = 0x03;
const REG_IRQ_ENABLE: u8 = 0x04;
const REG_HW_KEY: u8 = 0x07;
const REG_MEAS_RATE0: u8 = 0x08;
const REG_MEAS_RATE1: u8 = 0x09;
const REG_UCOEF0: u8 = 0x13;
const REG_PARAM_WR: u8 = 0x17;
const REG_COMMAND: u8 = 0x18;
const REG_ALS_VIS_DATA0: u8 = 0x22;
const REG_ALS_IR_DATA0: u8 = 0x24;
const REG_UV_INDEX0: u8 = 0x2c;

const PART_ID: u8 = 0x45;
const HW_KEY: u8 = 0x17;

const CMD_RESET: u8 = 0x01;
const CMD_PSALS_AUTO: u8 = 0x0f;
const CMD_PARAM_SET: u8 = 0xa0;

const PARAM_CHLIST: u8 = 0x01;
const PARAM_ALS_IR_ADC_MUX: u8 = 0x0e;
const PARAM_ALS_VIS_ADC_GAIN: u8 = 0x11;
const PARAM_ALS_VIS_ADC_MISC: u8 = 0x12;
const PARAM_ALS_IR_ADC_GAIN: u8 = 0x1e;
const PARAM_ALS_IR_ADC_MISC: u8 = 0x1f;

const CHLIST_EN_UV: u8 = 0x80;
const CHLIST_EN_ALS_IR: u8 = 0x20;
const CHLIST_EN_ALS_VIS: u8 = 0x10;

const ADC_MUX_SMALL_IR: u8 = 0x00;
const ADC_MISC_HIGH_RANGE: u8 = 0x20;

// Default UV coefficients from the datasheet.
const UCOEF: [u8; 4] = [0x29, 0x89, 0x02, 0x00];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub visible: u16,
    pub infrared: u16,
    pub uv_index: f64,
}

/// SI1145 visible/IR/UV sensor in autonomous measurement mode.
pub struct Si1145<B> {
    bus: B,
}

impl<B: I2cBus> Si1145<B> {
    pub fn new(bus: B) -> Result<Self> {
        let mut sensor = Self { bus };

        let part_id = sensor
            .bus
            .read_byte_data(ADDRESS, REG_PART_ID)
            .context("failed to read SI1145 part id")?;
        if part_id != PART_ID {
            bail!("unexpected SI1145 part id: expected 0x{PART_ID:02x}, got 0x{part_id:02x}");
        }

        sensor.reset().context("failed to reset SI1145")?;
        sensor.calibrate().context("failed to configure SI1145")?;

        Ok(sensor)
    }

    fn reset(&mut self) -> Result<()> {
        self.write(REG_MEAS_RATE0, 0x00)?;
        self.write(REG_MEAS_RATE1, 0x00)?;
        self.write(REG_IRQ_ENABLE, 0x00)?;
        self.write(REG_INT_CFG, 0x00)?;
        self.write(REG_COMMAND, CMD_RESET)?;
        sleep(Duration::from_millis(10));
        self.write(REG_HW_KEY, HW_KEY)?;
        sleep(Duration::from_millis(10));
        Ok(())
    }

    fn calibrate(&mut self) -> Result<()> {
        for (offset, coef) in UCOEF.into_iter().enumerate() {
            self.write(REG_UCOEF0 + offset as u8, coef)?;
        }

        self.set_param(
            PARAM_CHLIST,
            CHLIST_EN_UV | CHLIST_EN_ALS_IR | CHLIST_EN_ALS_VIS,
        )?;
        self.set_param(PARAM_ALS_IR_ADC_MUX, ADC_MUX_SMALL_IR)?;
        self.set_param(PARAM_ALS_IR_ADC_GAIN, 0)?;
        self.set_param(PARAM_ALS_IR_ADC_MISC, ADC_MISC_HIGH_RANGE)?;
        self.set_param(PARAM_ALS_VIS_ADC_GAIN, 0)?;
        self.set_param(PARAM_ALS_VIS_ADC_MISC, ADC_MISC_HIGH_RANGE)?;

        // Measure every 255 * 31.25us.
        self.write(REG_MEAS_RATE0, 0xff)?;
        self.write(REG_COMMAND, CMD_PSALS_AUTO)?;
        Ok(())
    }

    fn set_param(&mut self, param: u8, value: u8) -> Result<()> {
        self.write(REG_PARAM_WR, value)?;
        self.write(REG_COMMAND, CMD_PARAM_SET | param)
    }

    fn write(&mut self, register: u8, value: u8) -> Result<()> {
        self.bus.write_byte_data(ADDRESS, register, value)
    }

    fn read_u16(&mut self, register: u8) -> Result<u16> {
        let mut raw = [0u8; 2];
        self.bus.read_block_data(ADDRESS, register, &mut raw)?;
        Ok(u16::from_le_bytes(raw))
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn read(&mut self) -> Result<LightSample> {
        let visible = self
            .read_u16(REG_ALS_VIS_DATA0)
            .context("failed to read visible light")?;
        let infrared = self
            .read_u16(REG_ALS_IR_DATA0)
            .context("failed to read infrared light")?;
        let uv = self
            .read_u16(REG_UV_INDEX0)
            .context("failed to read UV index")?;

        Ok(LightSample {
            visible,
            infrared,
            uv_index: f64::from(uv) / 100.0,
        })
    }
}
