use anyhow::{Context as _, Result};

use crate::driver::{I2cBus, Lcd1602, LinuxI2cBus, address};
use crate::reading::Reading;
use crate::sensor::{Presenter, SensorParams};

/// Shows temperature and soil state on a 16x2 character display.
pub struct DisplayPresenter<B = LinuxI2cBus> {
    lcd: Lcd1602<B>,
}

impl DisplayPresenter {
    pub fn open(params: &SensorParams) -> Result<Self> {
        let bus = LinuxI2cBus::open(&params.i2c_bus, address::LCD1602)?;
        let lcd = Lcd1602::new(bus).context("LCD not found")?;
        Ok(Self::new(lcd))
    }
}

impl<B: I2cBus> DisplayPresenter<B> {
    pub fn new(lcd: Lcd1602<B>) -> Self {
        Self { lcd }
    }
}

impl<B: I2cBus> Presenter for DisplayPresenter<B> {
    fn present(&mut self, reading: &Reading) -> Result<()> {
        let [top, bottom] = render(reading);
        self.lcd.print_line(0, &top)?;
        self.lcd.print_line(1, &bottom)?;
        Ok(())
    }
}

pub fn render(reading: &Reading) -> [String; 2] {
    let temperature = match reading.temp_c {
        Some(celsius) => format!("Temp: {celsius:.1}C"),
        None => "Temp: --".to_string(),
    };
    let moisture = match reading.rel_moisture {
        Some(category) => format!("Soil: {category}"),
        None => "Soil: --".to_string(),
    };

    [temperature, moisture]
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use chrono_tz::UTC;

    use super::*;
    use crate::driver::COLUMNS;
    use crate::driver::bus::fake::FakeI2cBus;
    use crate::reading::MoistureCategory;

    fn reading() -> Reading {
        Reading::new("pi", Utc::now().with_timezone(&UTC))
    }

    #[test]
    fn renders_missing_fields_as_dashes() {
        assert_eq!(render(&reading()), ["Temp: --", "Soil: --"]);
    }

    #[test]
    fn renders_temperature_and_category() {
        let mut r = reading();
        r.set_temperature(21.46);
        r.set_moisture(50000, 2.5, MoistureCategory::Dry);

        assert_eq!(render(&r), ["Temp: 21.5C", "Soil: dry"]);
    }

    #[test]
    fn present_writes_both_lines() {
        let bus = FakeI2cBus::with_registers(address::LCD1602, &[]);
        let mut display = DisplayPresenter::new(Lcd1602::new(bus).unwrap());
        display.lcd.bus_mut().writes.clear();

        display.present(&reading()).unwrap();

        let bytes: Vec<u8> = display
            .lcd
            .bus_mut()
            .writes
            .iter()
            .map(|&(_, _, v)| v)
            .collect();
        // Each line: DDRAM address (4 strobed writes), then 16 characters.
        let line = 4 + COLUMNS * 4;
        assert_eq!(bytes.len(), 2 * line);
        // Line 0 at 0x80, first character 'T' with RS set.
        assert_eq!(&bytes[..6], [0x8c, 0x88, 0x0c, 0x08, 0x5d, 0x59]);
        // Line 1 at 0xc0, first character 'S' with RS set.
        assert_eq!(&bytes[line..line + 6], [0xcc, 0xc8, 0x0c, 0x08, 0x5d, 0x59]);
    }

    #[test]
    fn present_fails_when_display_is_gone() {
        let bus = FakeI2cBus::with_registers(address::LCD1602, &[]);
        let mut display = DisplayPresenter::new(Lcd1602::new(bus).unwrap());
        display.lcd.bus_mut().failing.insert(address::LCD1602);

        assert!(display.present(&reading()).is_err());
    }
}
