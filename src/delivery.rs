use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::str::FromStr;

use anyhow::{Context as _, Error, Result, bail};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::reading::Reading;

/// Ships one batch of readings somewhere.
pub trait Transport {
    fn send(&mut self, readings: &[Reading]) -> impl Future<Output = Result<()>>;
}

/// POSTs the batch as a JSON array.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&mut self, readings: &[Reading]) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(readings)
            .send()
            .await
            .with_context(|| format!("failed to POST to {}", self.endpoint))?;

        response
            .error_for_status()
            .with_context(|| format!("collector at {} rejected batch", self.endpoint))?;

        Ok(())
    }
}

/// What happens to buffered readings when a flush fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Keep them for the next attempt.
    Retain,
    /// Drop them, as if the send had succeeded.
    Discard,
}

impl FlushPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushPolicy::Retain => "retain",
            FlushPolicy::Discard => "discard",
        }
    }
}

impl fmt::Display for FlushPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlushPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retain" => Ok(FlushPolicy::Retain),
            "discard" => Ok(FlushPolicy::Discard),
            _ => bail!("unknown flush policy: {}", s),
        }
    }
}

/// Readings waiting to be sent, never more than `capacity` of them.
pub struct DeliveryBuffer<T> {
    transport: T,
    records: VecDeque<Reading>,
    capacity: usize,
    policy: FlushPolicy,
}

impl<T: Transport> DeliveryBuffer<T> {
    pub fn new(transport: T, capacity: usize, policy: FlushPolicy) -> Result<Self> {
        if capacity == 0 {
            bail!("delivery buffer capacity must be at least 1");
        }

        Ok(Self {
            transport,
            records: VecDeque::with_capacity(capacity),
            capacity,
            policy,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Appends a reading. If earlier flushes failed and the buffer is still
    /// full, the oldest reading is evicted and returned.
    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        let evicted = if self.is_full() {
            self.records.pop_front()
        } else {
            None
        };
        if let Some(dropped) = &evicted {
            warn!(
                measurement_ts = %dropped.measurement_ts.to_rfc3339(),
                "delivery buffer full, dropping oldest reading"
            );
        }

        self.records.push_back(reading);
        evicted
    }

    /// Sends everything buffered as one batch.
    pub async fn flush(&mut self) -> Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }

        let count = self.records.len();
        let result = self
            .transport
            .send(self.records.make_contiguous())
            .await
            .with_context(|| format!("failed to deliver {count} readings"));

        match (&result, self.policy) {
            (Ok(()), _) => {
                info!(count, "delivered readings");
                self.records.clear();
            }
            (Err(_), FlushPolicy::Discard) => {
                warn!(count, "discarding undelivered readings");
                self.records.clear();
            }
            (Err(_), FlushPolicy::Retain) => {
                debug!(count, "keeping undelivered readings for the next flush");
            }
        }

        result
    }

    /// Pushes a reading and flushes once the buffer is full.
    pub async fn submit(&mut self, reading: Reading) -> Result<()> {
        self.push(reading);

        if self.is_full() {
            self.flush().await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};
    use chrono_tz::UTC;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        batches: Vec<Vec<Reading>>,
        fail: bool,
    }

    impl Transport for RecordingTransport {
        async fn send(&mut self, readings: &[Reading]) -> Result<()> {
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            self.batches.push(readings.to_vec());
            Ok(())
        }
    }

    fn reading(minute: u32) -> Reading {
        let ts = Utc
            .with_ymd_and_hms(2021, 7, 1, 10, minute, 0)
            .unwrap()
            .with_timezone(&UTC);
        Reading::new("garden-pi", ts)
    }

    fn buffer(capacity: usize, policy: FlushPolicy) -> DeliveryBuffer<RecordingTransport> {
        DeliveryBuffer::new(RecordingTransport::default(), capacity, policy).unwrap()
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(DeliveryBuffer::new(RecordingTransport::default(), 0, FlushPolicy::Retain).is_err());
    }

    #[test]
    fn parses_policy() {
        assert_eq!("retain".parse::<FlushPolicy>().unwrap(), FlushPolicy::Retain);
        assert_eq!("discard".parse::<FlushPolicy>().unwrap(), FlushPolicy::Discard);
        assert!("keep".parse::<FlushPolicy>().is_err());
    }

    #[tokio::test]
    async fn flushes_exactly_once_when_full() {
        let mut buffer = buffer(3, FlushPolicy::Retain);

        for minute in 0..3 {
            buffer.submit(reading(minute)).await.unwrap();
        }

        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.transport().batches.len(), 1);
        assert_eq!(
            buffer.transport().batches[0],
            [reading(0), reading(1), reading(2)]
        );
    }

    #[tokio::test]
    async fn does_not_flush_before_full() {
        let mut buffer = buffer(3, FlushPolicy::Retain);

        buffer.submit(reading(0)).await.unwrap();
        buffer.submit(reading(1)).await.unwrap();

        assert_eq!(buffer.len(), 2);
        assert!(buffer.transport().batches.is_empty());
    }

    #[tokio::test]
    async fn empty_flush_sends_nothing() {
        let mut buffer = buffer(3, FlushPolicy::Retain);
        buffer.flush().await.unwrap();
        assert!(buffer.transport().batches.is_empty());
    }

    #[tokio::test]
    async fn retains_on_failure_and_stays_bounded() {
        let mut buffer = buffer(2, FlushPolicy::Retain);
        buffer.transport.fail = true;

        buffer.submit(reading(0)).await.unwrap();
        assert!(buffer.submit(reading(1)).await.is_err());
        assert_eq!(buffer.len(), 2);

        // Still failing: the oldest reading makes room for the newest.
        assert!(buffer.submit(reading(2)).await.is_err());
        assert_eq!(buffer.len(), 2);

        buffer.transport.fail = false;
        buffer.flush().await.unwrap();

        assert!(buffer.is_empty());
        assert_eq!(buffer.transport().batches, [vec![reading(1), reading(2)]]);
    }

    #[tokio::test]
    async fn discards_on_failure() {
        let mut buffer = buffer(2, FlushPolicy::Discard);
        buffer.transport.fail = true;

        buffer.submit(reading(0)).await.unwrap();
        assert!(buffer.submit(reading(1)).await.is_err());

        assert!(buffer.is_empty());
    }

    #[test]
    fn push_evicts_oldest_only_when_full() {
        let mut buffer = buffer(2, FlushPolicy::Retain);

        assert_eq!(buffer.push(reading(0)), None);
        assert_eq!(buffer.push(reading(1)), None);
        assert_eq!(buffer.push(reading(2)), Some(reading(0)));
        assert_eq!(buffer.len(), 2);
    }
}
