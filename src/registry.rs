use anyhow::{Result, bail};
use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::sensor::{
    DisplayPresenter, LightSensor, LumenSensor, MoistureSensor, Presenter, Sensor, SensorKind,
    SensorParams, TemperatureSensor, Variant,
};

type Constructor = fn(&SensorParams) -> Result<Variant>;

/// Static name-to-constructor table.
pub fn constructor(kind: SensorKind) -> Constructor {
    match kind {
        SensorKind::Light => open_light,
        SensorKind::Temperature => open_temperature,
        SensorKind::Moisture => open_moisture,
        SensorKind::Lumen => open_lumen,
        SensorKind::Display => open_display,
    }
}

fn open_light(params: &SensorParams) -> Result<Variant> {
    Ok(Variant::Measurement(Box::new(LightSensor::open(params)?)))
}

fn open_temperature(params: &SensorParams) -> Result<Variant> {
    Ok(Variant::Measurement(Box::new(TemperatureSensor::open(params)?)))
}

fn open_moisture(params: &SensorParams) -> Result<Variant> {
    Ok(Variant::Measurement(Box::new(MoistureSensor::open(params)?)))
}

fn open_lumen(params: &SensorParams) -> Result<Variant> {
    Ok(Variant::Measurement(Box::new(LumenSensor::open(params)?)))
}

fn open_display(params: &SensorParams) -> Result<Variant> {
    Ok(Variant::Display(Box::new(DisplayPresenter::open(params)?)))
}

/// The sensors that could actually be brought up, in selection order.
pub struct Registry {
    sensors: IndexMap<SensorKind, Box<dyn Sensor>>,
    presenter: Option<Box<dyn Presenter>>,
}

impl Registry {
    pub fn select<I, S>(names: I, params: &SensorParams) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::select_with(names, |kind| constructor(kind)(params))
    }

    /// Unknown names and sensors that fail to construct are skipped. Fails
    /// only when no measurement sensor is left.
    pub fn select_with<I, S, F>(names: I, mut construct: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(SensorKind) -> Result<Variant>,
    {
        let mut kinds: Vec<SensorKind> = Vec::new();
        for name in names {
            let name = name.as_ref();
            match name.parse::<SensorKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(err) => warn!(name, "skipping sensor: {err:#}"),
            }
        }

        let mut sensors: IndexMap<SensorKind, Box<dyn Sensor>> = IndexMap::new();
        let mut presenter = None;

        for kind in kinds {
            match construct(kind) {
                Ok(Variant::Measurement(sensor)) => {
                    info!(sensor = %kind, "sensor ready");
                    sensors.insert(kind, sensor);
                }
                Ok(Variant::Display(display)) => {
                    info!(sensor = %kind, "display ready");
                    presenter = Some(display);
                }
                Err(err) => error!(sensor = %kind, "failed to create sensor: {err:#}"),
            }
        }

        if sensors.is_empty() {
            bail!("no sensors available");
        }

        Ok(Self { sensors, presenter })
    }

    pub fn kinds(&self) -> impl Iterator<Item = SensorKind> + '_ {
        self.sensors.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn sensors_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Sensor>> {
        self.sensors.values_mut()
    }

    pub fn presenter_mut(&mut self) -> Option<&mut (dyn Presenter + 'static)> {
        self.presenter.as_deref_mut()
    }
}
