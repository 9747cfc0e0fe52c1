/*!
 * Quantum Timer
 *
 * POSIX interval timer on CLOCK_MONOTONIC that raises SIGALRM once per base
 * quantum. The kernel keeps at most one SIGALRM pending and counts the rest
 * as overruns, so deliveries never overlap.
 */

use crate::core::errors::KernelError;
use crate::core::types::KernelResult;
use nix::sys::signal::{SigEvent, SigevNotify, Signal};
use nix::sys::time::TimeSpec;
use nix::sys::timer::{Expiration, Timer, TimerSetTimeFlags};
use nix::time::ClockId;
use std::time::Duration;
use tracing::{debug, info};

pub struct QuantumTimer {
    timer: Timer,
    period: Duration,
    armed: bool,
}

impl QuantumTimer {
    /// Create a disarmed timer delivering SIGALRM every `period`
    pub fn new(period: Duration) -> KernelResult<Self> {
        let event = SigEvent::new(SigevNotify::SigevSignal {
            signal: Signal::SIGALRM,
            si_value: 0,
        });
        let timer = Timer::new(ClockId::CLOCK_MONOTONIC, event)
            .map_err(|e| KernelError::SignalInstall(format!("timer_create failed: {}", e)))?;

        Ok(Self {
            timer,
            period,
            armed: false,
        })
    }

    /// Arm the timer, or restart the current period if already armed
    pub fn arm(&mut self) -> KernelResult<()> {
        let interval = TimeSpec::from_duration(self.period);
        self.timer
            .set(Expiration::Interval(interval), TimerSetTimeFlags::empty())
            .map_err(|e| KernelError::SignalInstall(format!("timer_settime failed: {}", e)))?;

        if self.armed {
            debug!(period_ms = self.period.as_millis() as u64, "Quantum timer re-armed");
        } else {
            info!(period_ms = self.period.as_millis() as u64, "Quantum timer armed");
        }
        self.armed = true;
        Ok(())
    }

    /// Ticks coalesced into the last delivery
    pub fn overruns(&self) -> i32 {
        self.timer.overruns()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
