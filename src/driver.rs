//! Register-level drivers for the attached chips, generic over the bus so they
//! can run against the Linux character devices or an in-memory fake.

pub(crate) mod bus;
mod lcd1602;
mod max44009;
mod mcp3008;
mod mcp9808;
mod si1145;

pub use bus::{I2cBus, LinuxI2cBus, LinuxSpiBus, SpiBus};
pub use lcd1602::{COLUMNS, Lcd1602, fit_line};
pub use max44009::{LumenAddress, Max44009, decode_lux};
pub use mcp3008::{AdcSample, Mcp3008};
pub use mcp9808::{Mcp9808, decode_temperature};
pub use si1145::{LightSample, Si1145};

pub mod address {
    pub use super::lcd1602::ADDRESS as LCD1602;
    pub use super::mcp9808::ADDRESS as MCP9808;
    pub use super::si1145::ADDRESS as SI1145;
}
