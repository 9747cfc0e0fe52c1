/*!
 * Reports
 * Job completion summary and the `jobs` table
 */

use super::history::History;
use crate::process::core::types::{JobReport, ProcessControlRecord};
use crate::process::scheduler::{SchedulerState, SchedulerStats};
use std::fmt::Write;
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;

const RULE: &str = "--------------------------------";

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    at.format(&format).unwrap_or_else(|_| at.to_string())
}

fn outcome(record: &ProcessControlRecord) -> String {
    match (record.is_finished(), record.exit_status) {
        (false, _) => "unfinished".to_string(),
        (true, status) if status < 0 => format!("killed by signal {}", -status),
        (true, status) => format!("exited {}", status),
    }
}

/// Summary printed on interrupt or `exit`
pub fn render_summary(records: &[ProcessControlRecord], history: &History) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\nJob Completion Summary:");
    let _ = writeln!(out, "{}", RULE);
    for record in records {
        let _ = writeln!(out, "Name: {}", record.name);
        let _ = writeln!(out, "PID: {}", record.pid);
        let _ = writeln!(out, "Tier: {}", record.tier);
        let _ = writeln!(out, "Execution Time: {:.2} ms", millis(record.execution_time()));
        match record.wait_time() {
            Some(wait) => {
                let _ = writeln!(out, "Wait Time: {:.2} ms", millis(wait));
            }
            None => {
                let _ = writeln!(out, "Wait Time: n/a");
            }
        }
        let _ = writeln!(out, "Dispatches: {}", record.dispatches);
        let _ = writeln!(out, "Preemptions: {}", record.preemptions);
        let _ = writeln!(out, "Status: {}", outcome(record));
        let _ = writeln!(out, "{}", RULE);
    }

    let _ = writeln!(out, "History of Commands:");
    let _ = writeln!(out, "{}", RULE);
    for entry in history.iter() {
        let _ = writeln!(out, "{}", entry.command);
        let _ = writeln!(out, "Process PID: {}", entry.pid);
        let _ = writeln!(out, "Start time: {}", timestamp(entry.started_at));
        match (entry.finished_at, entry.duration()) {
            (Some(end), Some(duration)) => {
                let _ = writeln!(out, "End Time: {}", timestamp(end));
                let _ = writeln!(out, "Process Duration: {:.3} s", duration.as_secs_f64());
            }
            _ => {
                let _ = writeln!(out, "End Time: pending");
            }
        }
        let _ = writeln!(out, "{}", RULE);
    }
    if history.dropped() > 0 {
        let _ = writeln!(out, "({} commands not recorded)", history.dropped());
    }

    out
}

/// Table printed by `jobs`
pub fn render_jobs(
    records: &[ProcessControlRecord],
    state: SchedulerState,
    stats: &SchedulerStats,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "scheduler: {} (submitted {}, dispatched {}, preempted {}, completed {})",
        state, stats.submitted, stats.dispatched, stats.preemptions, stats.completed
    );
    let _ = writeln!(
        out,
        "{:>7}  {:>4}  {:<10}  {:>10}  {}",
        "PID", "TIER", "STATE", "EXEC(ms)", "NAME"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:>7}  {:>4}  {:<10}  {:>10.2}  {}",
            record.pid,
            record.tier.to_string(),
            record.state.as_str(),
            millis(record.execution_time()),
            record.name
        );
    }
    out
}

/// `jobs --json`: one report object per registered job
pub fn render_jobs_json(records: &[ProcessControlRecord]) -> serde_json::Result<String> {
    let reports: Vec<JobReport> = records.iter().map(JobReport::from).collect();
    serde_json::to_string_pretty(&reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Tier;
    use time::macros::datetime;

    const MS: u64 = 1_000_000;

    fn finished_record() -> ProcessControlRecord {
        let mut record = ProcessControlRecord::new(321, "./fib", Tier::new(2).unwrap(), 0);
        record.execution_ns = 200 * MS;
        record.dispatches = 3;
        record.preemptions = 1;
        record.retire(250 * MS, 0);
        record
    }

    #[test]
    fn test_summary_lists_jobs_and_history() {
        let mut history = History::new(4);
        let index = history.begin("submit ./fib 2", datetime!(2024-05-01 12:00:00 UTC));
        history.set_pid(index, 321);
        history.stamp_exit(321, datetime!(2024-05-01 12:00:02 UTC));

        let summary = render_summary(&[finished_record()], &history);
        assert!(summary.contains("Name: ./fib"));
        assert!(summary.contains("Execution Time: 200.00 ms"));
        assert!(summary.contains("Wait Time: 50.00 ms"));
        assert!(summary.contains("Status: exited 0"));
        assert!(summary.contains("Start time: 2024-05-01 12:00:00"));
        assert!(summary.contains("Process Duration: 2.000 s"));
    }

    #[test]
    fn test_unfinished_job_reported() {
        let record = ProcessControlRecord::new(9, "sleep", Tier::HIGHEST, 0);
        let summary = render_summary(&[record], &History::new(1));
        assert!(summary.contains("Wait Time: n/a"));
        assert!(summary.contains("Status: unfinished"));
    }

    #[test]
    fn test_jobs_table() {
        let table = render_jobs(
            &[finished_record()],
            SchedulerState::Idle,
            &SchedulerStats::default(),
        );
        assert!(table.starts_with("scheduler: idle"));
        assert!(table.contains("finished"));
        assert!(table.contains("./fib"));
    }

    #[test]
    fn test_jobs_json() {
        let json = render_jobs_json(&[finished_record()]).unwrap();
        let reports: Vec<JobReport> = serde_json::from_str(&json).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].pid, 321);
        assert_eq!(reports[0].execution_ms, 200);
        assert_eq!(reports[0].wait_ms, Some(50));
        assert_eq!(reports[0].exit_status, Some(0));
        assert!(json.contains("\"tier\": 2"));
    }
}
