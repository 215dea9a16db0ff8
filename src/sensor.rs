mod display;
mod kind;
mod light;
mod lumen;
mod moisture;
mod temperature;

use std::path::PathBuf;

use anyhow::Result;

use crate::reading::{Metric, Reading};

pub use display::*;
pub use kind::*;
pub use light::*;
pub use lumen::*;
pub use moisture::*;
pub use temperature::*;

/// A measurement source polled once per tick.
pub trait Sensor {
    fn kind(&self) -> SensorKind;

    /// `Ok(None)` means the sensor answered but had nothing usable this tick.
    fn read_metric(&mut self) -> Result<Option<Metric>>;
}

/// A write-only output fed with the merged reading after every tick.
pub trait Presenter {
    fn present(&mut self, reading: &Reading) -> Result<()>;
}

/// What a constructor hands back to the registry.
pub enum Variant {
    Measurement(Box<dyn Sensor>),
    Display(Box<dyn Presenter>),
}

/// Hardware locations the constructors open.
#[derive(Debug, Clone)]
pub struct SensorParams {
    pub i2c_bus: PathBuf,

    pub spi_device: PathBuf,

    pub adc_channel: u8,
}
