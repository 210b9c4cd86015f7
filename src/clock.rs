use chrono::{DateTime, FixedOffset, Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";
const TIMESTAMP_SECONDS_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const DATE_KEY_FORMAT: &str = "%d/%m/%Y";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock, either pinned to a configured offset or following the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    pub fn new(offset: Option<FixedOffset>) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => Local::now().fixed_offset(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

pub fn format_timestamp(at: &DateTime<FixedOffset>, include_seconds: bool) -> String {
    let format = if include_seconds {
        TIMESTAMP_SECONDS_FORMAT
    } else {
        TIMESTAMP_FORMAT
    };
    at.format(format).to_string()
}

/// Day-granularity key used for history entries.
pub fn date_key(at: &DateTime<FixedOffset>) -> String {
    at.format(DATE_KEY_FORMAT).to_string()
}

/// Periodic clock display. The background task stops on `cancel` or when the ticker is dropped.
pub struct ClockTicker {
    display: watch::Receiver<String>,
    handle: JoinHandle<()>,
}

impl ClockTicker {
    pub fn spawn(clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (tx, display) = watch::channel(format_timestamp(&clock.now(), true));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(format_timestamp(&clock.now(), true)).is_err() {
                    break;
                }
            }
        });

        Self { display, handle }
    }

    pub fn display(&self) -> watch::Receiver<String> {
        self.display.clone()
    }

    pub fn cancel(self) {
        debug!("stopping clock ticker");
        self.handle.abort();
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
