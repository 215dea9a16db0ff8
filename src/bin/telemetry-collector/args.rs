use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;
use reqwest::Url;
use soil_telemetry::delivery::FlushPolicy;

#[derive(Debug, Parser)]
#[command(about = "Poll attached sensors and ship readings to a collector")]
pub struct Args {
    /// Collector URL readings are POSTed to.
    #[arg(long, env = "TELEMETRY_ENDPOINT", required_unless_present = "disable_delivery")]
    pub endpoint: Option<Url>,

    /// Seconds to sleep between ticks.
    #[arg(
        long,
        env = "TELEMETRY_INTERVAL_SECS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Readings collected before a batch is sent.
    #[arg(long, env = "TELEMETRY_BUFFER_SIZE", default_value_t = 10)]
    pub buffer_size: usize,

    /// MCP3008 input the moisture probe is wired to.
    #[arg(
        long,
        env = "TELEMETRY_ADC_CHANNEL",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..8)
    )]
    pub adc_channel: u8,

    /// Only log readings, never send them.
    #[arg(long, env = "TELEMETRY_DISABLE_DELIVERY")]
    pub disable_delivery: bool,

    /// With delivery disabled, also print readings as CSV on stdout.
    #[arg(long, env = "TELEMETRY_CSV")]
    pub csv: bool,

    /// Show readings on the 16x2 LCD.
    #[arg(long, env = "TELEMETRY_DISPLAY")]
    pub display: bool,

    #[arg(
        long,
        env = "TELEMETRY_SENSORS",
        value_delimiter = ',',
        default_value = "light,temp,moisture,lumen"
    )]
    pub sensors: Vec<String>,

    /// `retain` keeps a failed batch for the next flush, `discard` drops it.
    #[arg(long, env = "TELEMETRY_ON_FLUSH_FAILURE", default_value = "retain")]
    pub on_flush_failure: FlushPolicy,

    #[arg(long, env = "TELEMETRY_I2C_BUS", default_value = "/dev/i2c-1")]
    pub i2c_bus: PathBuf,

    #[arg(long, env = "TELEMETRY_SPI_DEVICE", default_value = "/dev/spidev0.0")]
    pub spi_device: PathBuf,

    /// Defaults to `{hostname}-{mac}`.
    #[arg(long, env = "TELEMETRY_SENSOR_ID")]
    pub sensor_id: Option<String>,

    #[arg(long, env = "TZ", default_value = "UTC")]
    pub timezone: Tz,
}
