mod args;

use std::{io, process::ExitCode, time::Duration};

use anyhow::{Context as _, Result, anyhow};
use args::Args;
use clap::Parser as _;
use soil_telemetry::{
    assembler::Assembler,
    csv_log::CsvLog,
    delivery::{DeliveryBuffer, HttpTransport},
    identity::resolve_sensor_id,
    poll::PollLoop,
    registry::Registry,
    sensor::{SensorKind, SensorParams},
};
use tokio::signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let sensor_id = match args.sensor_id {
        Some(id) => id,
        None => resolve_sensor_id().context("failed to derive sensor id")?,
    };
    info!(sensor_id = %sensor_id, "starting");

    let mut names = args.sensors;
    if args.display {
        names.push(SensorKind::Display.as_str().to_string());
    }

    let params = SensorParams {
        i2c_bus: args.i2c_bus,
        spi_device: args.spi_device,
        adc_channel: args.adc_channel,
    };
    let registry = Registry::select(&names, &params).context("failed to set up sensors")?;

    let assembler = Assembler::new(sensor_id, args.timezone);
    let poll = PollLoop::new(registry, assembler, Duration::from_secs(args.interval));

    let poll = if args.disable_delivery {
        info!("delivery disabled, logging readings only");
        if args.csv {
            poll.with_csv_log(CsvLog::new(Box::new(io::stdout())))
        } else {
            poll
        }
    } else {
        let endpoint = args
            .endpoint
            .ok_or_else(|| anyhow!("no collector endpoint configured"))?;
        info!(
            endpoint = %endpoint,
            buffer_size = args.buffer_size,
            policy = %args.on_flush_failure,
            "delivering readings"
        );

        let buffer = DeliveryBuffer::new(
            HttpTransport::new(endpoint),
            args.buffer_size,
            args.on_flush_failure,
        )
        .context("failed to create delivery buffer")?;
        poll.with_delivery(buffer)
    };

    poll.run(shutdown_signal()).await;

    Ok(())
}

async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            warn!("failed to listen for SIGTERM: {err:#}");
            let _ = ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
