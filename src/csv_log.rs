use std::io::Write;

use anyhow::{Context as _, Result};
use csv::Writer;

use crate::reading::Reading;

/// Writes readings as CSV rows, header first, flushing after every row.
pub struct CsvLog<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> CsvLog<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Writer::from_writer(inner),
        }
    }

    pub fn write(&mut self, reading: &Reading) -> Result<()> {
        self.writer
            .serialize(reading)
            .context("failed to write CSV row")?;
        self.writer.flush().context("failed to flush CSV output")?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("failed to finish CSV output")
    }
}
