/*!
 * Shell Front-End
 * Command parsing, history, reports and the interactive loop
 */

pub mod command;
pub mod history;
pub mod repl;
pub mod summary;

pub use command::ShellCommand;
pub use history::{History, HistoryEntry};
pub use repl::Shell;
pub use summary::{render_jobs, render_jobs_json, render_summary};
