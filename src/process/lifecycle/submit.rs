/*!
 * Job Submission
 * Park a new job, register it, queue it at its tier and wake the scheduler
 */

use super::spawn::{resolve_executable, JobLauncher};
use super::supervisor::wake_scheduler;
use crate::core::clock::monotonic_ns;
use crate::core::errors::SchedulerError;
use crate::core::limits::MAX_JOBS;
use crate::core::types::{KernelResult, Pid, Tier};
use crate::process::coordination::Coordination;
use crate::process::core::types::ProcessControlRecord;
use tracing::{info, warn};

/// Shell-side submission path
pub struct JobController<L> {
    coordination: Coordination,
    launcher: L,
}

impl<L: JobLauncher> JobController<L> {
    pub fn new(coordination: Coordination, launcher: L) -> Self {
        Self {
            coordination,
            launcher,
        }
    }

    pub fn coordination(&self) -> &Coordination {
        &self.coordination
    }

    /// Submit `program` at `tier` (tier 1 when omitted); returns the job pid
    ///
    /// Capacity exhaustion and process creation failures abort this
    /// submission only. A job whose admission fails after it was forked is
    /// killed and reaped, so nothing half-registered is left behind.
    pub fn submit(&self, program: &str, tier: Option<Tier>) -> KernelResult<Pid> {
        let tier = tier.unwrap_or_default();
        let path = resolve_executable(program)?;

        // Cheap early rejection; admit() below re-checks under the same lock
        if self.coordination.tables.lock().registry.is_full() {
            return Err(SchedulerError::RegistryFull { capacity: MAX_JOBS }.into());
        }

        let pid = self.launcher.launch(&path)?;
        let record = ProcessControlRecord::new(pid, program, tier, monotonic_ns());

        let admitted = self.coordination.tables.lock().admit(record);
        let slot = match admitted {
            Ok(slot) => slot,
            Err(e) => {
                warn!(pid, error = %e, "Job rejected, discarding process");
                self.launcher.discard(pid);
                return Err(e.into());
            }
        };

        self.coordination.stats.inc_submitted();
        info!(pid, slot, tier = tier.level(), program, "Job submitted");
        wake_scheduler(&self.coordination);
        Ok(pid)
    }
}
