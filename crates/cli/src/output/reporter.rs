//! Console and log-file rendering of a run.
//!
//! Every text line goes to the log file uncoloured. The console gets the same
//! lines, coloured, in text mode, and only the final JSON report in json mode.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use zvm::{BatchReport, ProgressEvent, ProgressSink, RowOutcome, RowStatus, RunConfig};

use super::OutputFormat;

/// Width of the banner and closing separator.
const SEPARATOR_WIDTH: usize = 78;

/// Run parameters shown at the top of the report.
#[derive(Debug, Clone)]
pub struct Banner<'a> {
	pub version: &'a str,
	pub endpoint: &'a str,
	pub config: &'a RunConfig,
	pub csv: &'a Path,
}

#[derive(Clone, Copy)]
enum Tone {
	Plain,
	Heading,
	Success,
	Failure,
	Muted,
}

/// Per-run log file named after the local start time.
pub struct LogFile {
	path: PathBuf,
	writer: BufWriter<File>,
}

impl LogFile {
	/// Creates `dir` if needed and opens `<dir>/<yyyy-MM-dd-HH-mm-ss>.txt`.
	pub fn create(dir: &Path) -> io::Result<Self> {
		std::fs::create_dir_all(dir)?;
		let name = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string();
		let path = dir.join(format!("{name}.txt"));
		let writer = BufWriter::new(File::create(&path)?);
		Ok(Self { path, writer })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

/// Renders progress events and the final report.
pub struct Reporter<W> {
	console: W,
	log: Option<LogFile>,
	format: OutputFormat,
	color: bool,
	line_open: bool,
}

impl<W: Write + Send> Reporter<W> {
	pub fn new(console: W, log: Option<LogFile>, format: OutputFormat) -> Self {
		Self {
			console,
			log,
			format,
			color: false,
			line_open: false,
		}
	}

	pub fn with_color(mut self, color: bool) -> Self {
		self.color = color;
		self
	}

	pub fn console(&self) -> &W {
		&self.console
	}

	pub fn log_path(&self) -> Option<&Path> {
		self.log.as_ref().map(LogFile::path)
	}

	pub fn banner(&mut self, banner: &Banner<'_>) {
		self.line(&format!("ZVM Failover v{}", banner.version), Tone::Heading);
		self.line(&format!("ZVM:           {}", banner.endpoint), Tone::Plain);
		self.line(&format!("Mode:          {}", banner.config.mode), Tone::Plain);
		self.line(&format!("Type:          {}", banner.config.failover_type), Tone::Plain);
		if banner.config.failover_type == zvm::FailoverType::Live {
			self.line(&format!("Commit Policy: {}", banner.config.commit_policy), Tone::Plain);
			self.line(&format!("Wait Time (s): {}", banner.config.wait_before_commit_secs), Tone::Plain);
		}
		self.line(&format!("CSV File:      {}", banner.csv.display()), Tone::Plain);
		self.line(&"-".repeat(SEPARATOR_WIDTH), Tone::Muted);
	}

	/// Reports a condition that stopped the run.
	pub fn fatal(&mut self, message: &str) {
		self.close_line();
		self.line("ERROR", Tone::Failure);
		self.line(message, Tone::Failure);
	}

	/// Writes the closing summary: failed rows, duration and, in json mode, the report.
	pub fn finish(&mut self, report: Option<&BatchReport>, elapsed: Duration) {
		self.close_line();
		if let Some(report) = report {
			let failures: Vec<&RowOutcome> = report.failures().collect();
			if !failures.is_empty() {
				self.line("", Tone::Plain);
				self.line(&format!("{} of {} groups were not confirmed complete:", failures.len(), report.outcomes.len()), Tone::Failure);
				for outcome in failures {
					self.line(&format!("  {}", detail(outcome)), Tone::Failure);
				}
			}
			if report.cancelled {
				self.line("Run cancelled; remaining groups were not started", Tone::Failure);
			}
		}
		self.line("", Tone::Plain);
		self.line(&format!("Duration: {}", format_duration(elapsed)), Tone::Plain);
		self.line(&"-".repeat(SEPARATOR_WIDTH), Tone::Muted);

		if self.format == OutputFormat::Json {
			if let Some(report) = report {
				if let Ok(json) = serde_json::to_string_pretty(report) {
					let _ = writeln!(self.console, "{json}");
				}
			}
		}
		let _ = self.console.flush();
		if let Some(log) = self.log.as_mut() {
			let _ = log.writer.flush();
		}
	}

	fn line(&mut self, text: &str, tone: Tone) {
		self.write(&format!("{text}\n"), tone);
		self.line_open = false;
	}

	fn write(&mut self, text: &str, tone: Tone) {
		if let Some(log) = self.log.as_mut() {
			let _ = log.writer.write_all(text.as_bytes());
		}
		if self.format == OutputFormat::Text {
			let painted = self.paint(text, tone);
			let _ = self.console.write_all(painted.as_bytes());
			let _ = self.console.flush();
		}
		self.line_open = !text.ends_with('\n');
	}

	/// Ends a line left open by a start marker or progress dots.
	fn close_line(&mut self) {
		if self.line_open {
			self.line("", Tone::Plain);
		}
	}

	fn paint(&self, text: &str, tone: Tone) -> String {
		if !self.color {
			return text.to_string();
		}
		match tone {
			Tone::Plain => text.to_string(),
			Tone::Heading => text.bold().to_string(),
			Tone::Success => text.green().to_string(),
			Tone::Failure => text.red().to_string(),
			Tone::Muted => text.dimmed().to_string(),
		}
	}
}

impl<W: Write + Send> ProgressSink for Reporter<W> {
	fn emit(&mut self, event: ProgressEvent) {
		match event {
			ProgressEvent::RowStarted { vpg_name, action, .. } => {
				self.close_line();
				self.line("", Tone::Plain);
				self.write(&action.start_marker(&vpg_name), Tone::Heading);
			}
			ProgressEvent::Tick => self.write(".", Tone::Muted),
			ProgressEvent::Pausing { secs } => {
				self.close_line();
				self.line(&format!("Pausing for {secs} seconds"), Tone::Plain);
			}
			ProgressEvent::RowFinished(outcome) => {
				if outcome.status == RowStatus::Rejected {
					self.close_line();
					self.line("", Tone::Plain);
				}
				self.close_line();
				let tone = if outcome.status.is_success() { Tone::Success } else { Tone::Failure };
				self.line(&outcome.to_string(), tone);
			}
		}
	}
}

/// Formats `elapsed` as `hh:mm:ss`.
pub fn format_duration(elapsed: Duration) -> String {
	let secs = elapsed.as_secs();
	format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn detail(outcome: &RowOutcome) -> String {
	match &outcome.status {
		RowStatus::NotCompleted { reason } => format!("{outcome} ({reason})"),
		status if status.is_unconfirmed() => format!("{outcome} (task status unavailable)"),
		_ => outcome.to_string(),
	}
}
