use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, warn};

use crate::reading::Reading;
use crate::sensor::Sensor;

/// Builds one [`Reading`] per tick out of whatever the sensors managed to
/// report.
#[derive(Debug, Clone)]
pub struct Assembler {
    sensor_id: String,
    timezone: Tz,
}

impl Assembler {
    pub fn new(sensor_id: impl Into<String>, timezone: Tz) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timezone,
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn assemble<'a, I>(&self, sensors: I) -> Reading
    where
        I: IntoIterator<Item = &'a mut Box<dyn Sensor>>,
    {
        self.assemble_at(sensors, Utc::now().with_timezone(&self.timezone))
    }

    /// Every sensor is read exactly once; a sensor that fails or has no data
    /// leaves its fields empty and does not affect the others.
    pub fn assemble_at<'a, I>(&self, sensors: I, measured_at: DateTime<Tz>) -> Reading
    where
        I: IntoIterator<Item = &'a mut Box<dyn Sensor>>,
    {
        let mut reading = Reading::new(self.sensor_id.clone(), measured_at);

        for sensor in sensors {
            let kind = sensor.kind();
            match sensor.read_metric() {
                Ok(Some(metric)) => {
                    debug!(sensor = %kind, ?metric, "sensor read");
                    reading.apply(metric);
                }
                Ok(None) => warn!(sensor = %kind, "no data from sensor"),
                Err(err) => error!(sensor = %kind, "failed to read sensor: {err:#}"),
            }
        }

        reading
    }
}
