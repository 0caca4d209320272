//! Connection supervisor
//!
//! Runs on its own fixed period, independent of the main loop. A tick that
//! finds the connection faulted tears the session down and sets it up again
//! while holding the link, so the main loop never observes a half-recovered
//! session. Too many faulted ticks in a row mean the device restarts.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Ticker};
use log::{debug, error, warn};

use crate::config::LinkTimings;
use crate::error::FatalError;
use crate::link::SharedLink;
use crate::ports::{BrokerSession, Indicator, SystemControl, WifiStation};

/// Result of one watchdog tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No fault, the counter was reset
    Healthy,
    /// Fault found, reconnect attempted
    Recovering { faults: u32 },
    /// Another tick was still running
    Skipped,
}

pub struct Watchdog<'l, 'a, S, W, I> {
    link: &'l SharedLink<'a, S, W, I>,
    period: Duration,
    fault_threshold: u32,
    running: Mutex<CriticalSectionRawMutex, ()>,
}

impl<'l, 'a, S, W, I> Watchdog<'l, 'a, S, W, I>
where
    S: BrokerSession,
    W: WifiStation,
    I: Indicator,
{
    pub const fn new(link: &'l SharedLink<'a, S, W, I>, timings: &LinkTimings) -> Self {
        Self {
            link,
            period: timings.watchdog_period,
            fault_threshold: timings.fault_threshold,
            running: Mutex::new(()),
        }
    }

    /// Check the connection once.
    ///
    /// Returns a fatal error when the fault counter is above the threshold,
    /// whatever the current state of the connection.
    pub async fn tick(&self) -> Result<Verdict, FatalError> {
        let Ok(_running) = self.running.try_lock() else {
            debug!("watchdog: previous tick still running, skipped");
            return Ok(Verdict::Skipped);
        };
        let mut link = self.link.lock().await;

        let faults = link.state().consecutive_fault_count;
        if faults > self.fault_threshold {
            error!("watchdog: connection lost for {} ticks", faults);
            return Err(FatalError::WatchdogThresholdExceeded { faults });
        }

        if !link.connection_fault() {
            link.clear_faults();
            return Ok(Verdict::Healthy);
        }

        let faults = link.record_fault();
        warn!("watchdog: connection fault, count {}", faults);
        if let Err(e) = link.recover().await {
            warn!("watchdog: recovery failed: {}", e);
        }
        Ok(Verdict::Recovering { faults })
    }

    /// Tick forever, restarting the device on a fatal verdict
    pub async fn run<C: SystemControl>(&self, system: &mut C) -> ! {
        let mut ticker = Ticker::every(self.period);
        loop {
            ticker.next().await;
            match self.tick().await {
                Ok(Verdict::Recovering { .. }) => ticker.reset(),
                Ok(_) => {}
                Err(fatal) => {
                    error!("watchdog: {}, restarting", fatal);
                    system.restart(fatal);
                }
            }
        }
    }
}
