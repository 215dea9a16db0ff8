use std::fmt;
use std::str::FromStr;

use anyhow::{Error, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Light,
    Temperature,
    Moisture,
    Lumen,
    Display,
}

impl SensorKind {
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Light,
        SensorKind::Temperature,
        SensorKind::Moisture,
        SensorKind::Lumen,
        SensorKind::Display,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Light => "light",
            SensorKind::Temperature => "temp",
            SensorKind::Moisture => "moisture",
            SensorKind::Lumen => "lumen",
            SensorKind::Display => "display",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" | "uv" => Ok(SensorKind::Light),
            "temp" | "temperature" => Ok(SensorKind::Temperature),
            "moisture" => Ok(SensorKind::Moisture),
            "lumen" => Ok(SensorKind::Lumen),
            "display" | "lcd" => Ok(SensorKind::Display),
            _ => bail!("unknown sensor: {}", s),
        }
    }
}
