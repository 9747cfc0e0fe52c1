/*!
 * Scheduler Task
 *
 * Body of the scheduler process. It runs a single-threaded runtime that
 * waits on two signal streams: SIGUSR1 (the shell has news: a submission, a
 * completion or `run`) and SIGALRM (a quantum tick). Ticks preempt and
 * refill the running set; wake-ups only refill it.
 *
 * The process starts by stopping itself once its handlers are installed, so
 * the shell can confirm it is parked before accepting input. From then on
 * the shell stops and continues it at will; it only does so while holding
 * the table lock, so the scheduler is never frozen inside a critical section.
 */

use super::dispatch::Dispatcher;
use super::machine::SchedulerState;
use super::policy::FeedbackPolicy;
use crate::core::clock::monotonic_ns;
use crate::core::config::SchedulerConfig;
use crate::core::errors::KernelError;
use crate::core::types::KernelResult;
use crate::process::coordination::{Coordination, CoordinationBlock};
use crate::process::execution::{ProcessControl, QuantumTimer, SignalControl};
use crate::signals::SchedulerSignals;
use nix::sys::signal::{raise, signal as set_disposition, SigHandler, Signal};
use tracing::{debug, info, trace};

/// Entry point of the forked scheduler process
///
/// Returns only on a fatal error; the shell kills the process otherwise.
pub fn run_scheduler_process(coordination: Coordination, config: SchedulerConfig) -> KernelResult<()> {
    nix::sys::prctl::set_pdeathsig(Signal::SIGKILL)
        .map_err(|e| KernelError::SignalInstall(format!("PR_SET_PDEATHSIG: {}", e)))?;

    // Ctrl-C reaches the whole foreground group; only the shell reacts to it
    // SAFETY: SIG_IGN installs no handler code
    unsafe { set_disposition(Signal::SIGINT, SigHandler::SigIgn) }
        .map_err(|e| KernelError::SignalInstall(format!("SIGINT: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| KernelError::Internal(format!("scheduler runtime: {}", e)))?;

    runtime.block_on(async move {
        let signals = SchedulerSignals::install()?;
        let dispatcher = Dispatcher::new(FeedbackPolicy::from_config(&config), SignalControl::new());

        // Parked until the shell continues us
        raise(Signal::SIGSTOP)
            .map_err(|e| KernelError::SignalInstall(format!("SIGSTOP: {}", e)))?;

        run_scheduler_loop(&coordination, dispatcher, signals).await
    })
}

/// Core scheduler loop
pub async fn run_scheduler_loop<C: ProcessControl>(
    block: &CoordinationBlock,
    dispatcher: Dispatcher<C>,
    mut signals: SchedulerSignals,
) -> KernelResult<()> {
    let mut timer = QuantumTimer::new(dispatcher.policy().tick())?;
    let mut armed_generation = 0;

    info!(
        parallelism = dispatcher.policy().parallelism(),
        tick_ms = timer.period().as_millis() as u64,
        "Scheduler loop started"
    );

    loop {
        tokio::select! {
            tick = signals.alarm.recv() => {
                if tick.is_none() {
                    break;
                }
                if !timer.is_armed() {
                    debug!("Alarm before the quantum timer was armed, ignored");
                    continue;
                }
                resume_if_suspended(block);

                let (preempted, dispatched) = dispatcher.on_tick(block, monotonic_ns());
                trace!(
                    preempted = preempted.len(),
                    dispatched = dispatched.len(),
                    overruns = timer.overruns(),
                    "Quantum tick"
                );
            }

            wake = signals.wake.recv() => {
                if wake.is_none() {
                    break;
                }
                resume_if_suspended(block);

                let generation = block.run_generation();
                if generation != armed_generation {
                    timer.arm()?;
                    armed_generation = generation;
                }

                let dispatched = dispatcher.dispatch_ready(block, monotonic_ns());
                if !dispatched.is_empty() {
                    debug!(count = dispatched.len(), "Dispatched on wake-up");
                }
            }
        }
    }

    info!("Scheduler signal streams closed, loop exiting");
    Ok(())
}

/// Suspended -> Idle once the shell has continued the process
fn resume_if_suspended(block: &CoordinationBlock) {
    if block.state.get() == SchedulerState::Suspended
        && block.state.transition(SchedulerState::Idle)
    {
        info!("Scheduler resumed");
    }
}
