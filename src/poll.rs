use std::any::Any;
use std::future::Future;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::assembler::Assembler;
use crate::csv_log::CsvLog;
use crate::delivery::{DeliveryBuffer, Transport};
use crate::reading::Reading;
use crate::registry::Registry;

/// The single control loop: read, show, buffer, sleep.
pub struct PollLoop<T> {
    registry: Registry,
    assembler: Assembler,
    interval: Duration,
    delivery: Option<DeliveryBuffer<T>>,
    csv_log: Option<CsvLog<Box<dyn Write>>>,
}

impl<T: Transport> PollLoop<T> {
    pub fn new(registry: Registry, assembler: Assembler, interval: Duration) -> Self {
        Self {
            registry,
            assembler,
            interval,
            delivery: None,
            csv_log: None,
        }
    }

    pub fn with_delivery(mut self, buffer: DeliveryBuffer<T>) -> Self {
        self.delivery = Some(buffer);
        self
    }

    /// Only used when delivery is off.
    pub fn with_csv_log(mut self, log: CsvLog<Box<dyn Write>>) -> Self {
        self.csv_log = Some(log);
        self
    }

    pub fn delivery(&self) -> Option<&DeliveryBuffer<T>> {
        self.delivery.as_ref()
    }

    /// Runs ticks until `shutdown` resolves, then makes one last attempt to
    /// deliver whatever is still buffered.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        info!(
            sensors = self.registry.len(),
            interval_secs = self.interval.as_secs_f64(),
            delivery = self.delivery.is_some(),
            "starting poll loop"
        );

        loop {
            if let Err(err) = self.tick().await {
                error!("tick failed: {err:#}");
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        if let Some(buffer) = &mut self.delivery
            && !buffer.is_empty()
            && let Err(err) = buffer.flush().await
        {
            error!("final flush failed: {err:#}");
        }
    }

    /// One pass over every sensor. Display failures are logged here; a
    /// delivery failure or a panic while reading is returned.
    pub async fn tick(&mut self) -> Result<Reading> {
        let reading = panic::catch_unwind(AssertUnwindSafe(|| self.read_and_present()))
            .map_err(|payload| anyhow!("tick panicked: {}", panic_message(&*payload)))?;

        match &mut self.delivery {
            Some(buffer) => {
                buffer
                    .submit(reading.clone())
                    .await
                    .context("failed to deliver readings")?;
            }
            None => {
                info!(reading = ?reading, "reading");
                if let Some(log) = &mut self.csv_log {
                    log.write(&reading)?;
                }
            }
        }

        Ok(reading)
    }

    fn read_and_present(&mut self) -> Reading {
        let reading = self.assembler.assemble(self.registry.sensors_mut());

        if let Some(presenter) = self.registry.presenter_mut()
            && let Err(err) = presenter.present(&reading)
        {
            warn!("failed to update display: {err:#}");
        }

        reading
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
