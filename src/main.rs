/*!
 * Tiered Scheduler - Main Entry Point
 *
 * Maps the coordination block, forks the scheduler process (parked), then
 * runs the interactive shell on a single-threaded runtime.
 */

use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use tiered_sched::{
    init_tracing, Coordination, KernelResult, SchedulerConfig, SchedulerHandle, Shell,
};
use tracing::{error, info};

/// Interactive shell with a four-tier feedback scheduler for submitted jobs
#[derive(Parser, Debug)]
#[command(name = "tiered-sched", version)]
struct Cli {
    /// Maximum number of jobs running at the same time
    ncpu: u32,
    /// Base time slice in milliseconds (tier 1 quantum)
    tslice: u64,
}

fn usage() {
    eprintln!("Usage: tiered-sched <NCPU> <TSLICE>");
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            usage();
            return ExitCode::from(1);
        }
    };

    let config = match SchedulerConfig::new(cli.ncpu, cli.tslice) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            usage();
            return ExitCode::from(1);
        }
    };

    init_tracing();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal error");
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::from(1)
        }
    }
}

fn run(config: SchedulerConfig) -> KernelResult<()> {
    info!(
        cpus = config.cpus.get(),
        time_slice_ms = config.time_slice.as_millis() as u64,
        "Starting tiered scheduler shell"
    );

    let coordination = Coordination::create()?;

    // Fork while still single-threaded: no runtime exists yet
    let scheduler = SchedulerHandle::launch(coordination.clone(), config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(Shell::new(coordination, scheduler).run())
}
