//! Output rendering and formatting

use std::io::{self, Write};

use codeagent_ops::{ExportSummary, OperationResult, WatchSummary};
use codeagent_types::{
    HealthResponse, Job, JobAck, JobStatus, ReportList, ReportSource, ReportSummary, Severity,
};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    colors: bool,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, colors: bool) -> Self {
        Self {
            json_output,
            colors,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        // An export printed with --stdout already owns stdout.
        if matches!(result, OperationResult::Export(summary) if summary.path.is_none()) {
            eprintln!("{json}");
            return Ok(());
        }
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Job(job) => self.render_job(job),
            OperationResult::JobAck(ack) => self.render_ack(ack),
            OperationResult::ReportSummary(summary) => self.render_report_summary(summary),
            OperationResult::Reports(list) => self.render_reports(list),
            OperationResult::Health(health) => self.render_health(health),
            OperationResult::Export(summary) => self.render_export(summary),
            OperationResult::Watch(summary) => self.render_watch(summary),
            OperationResult::Success(message) => self.term.write_line(message),
        }
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.colors {
            table.force_no_tty();
        }
        table
    }

    fn status_cell(&self, status: JobStatus) -> Cell {
        let cell = Cell::new(status.to_string());
        if !self.colors {
            return cell;
        }
        match status {
            JobStatus::Completed => cell.fg(Color::Green),
            JobStatus::Failed => cell.fg(Color::Red),
            JobStatus::Canceled | JobStatus::Expired => cell.fg(Color::Yellow),
            JobStatus::Queued | JobStatus::Running => cell.fg(Color::Cyan),
        }
    }

    fn render_job(&self, job: &Job) -> io::Result<()> {
        let mut table = self.new_table();
        table.set_header(vec![
            Cell::new("Field").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![Cell::new("Job"), Cell::new(&job.job_id)]);
        table.add_row(vec![Cell::new("Status"), self.status_cell(job.status)]);
        if let Some(progress) = &job.progress {
            table.add_row(vec![
                Cell::new("Phase"),
                Cell::new(format!("{} ({:.0}%)", progress.phase, progress.percent)),
            ]);
        }
        for (label, value) in [
            ("Submitted", &job.submitted_at),
            ("Started", &job.started_at),
            ("Finished", &job.finished_at),
            ("Error", &job.error),
        ] {
            if let Some(value) = value {
                table.add_row(vec![Cell::new(label), Cell::new(value)]);
            }
        }
        self.term.write_line(&table.to_string())
    }

    fn render_ack(&self, ack: &JobAck) -> io::Result<()> {
        let status = ack.status.as_deref().unwrap_or("accepted");
        self.term
            .write_line(&format!("Job {}: {status}", ack.job_id))
    }

    fn render_report_summary(&self, summary: &ReportSummary) -> io::Result<()> {
        let mut table = self.new_table();
        table.set_header(vec![
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new("Issues").add_attribute(Attribute::Bold),
        ]);
        for severity in Severity::ALL {
            let count = Cell::new(summary.summary.count(severity));
            let count = match (self.colors, severity) {
                (true, Severity::Critical) => count.fg(Color::Red),
                (true, Severity::High) => count.fg(Color::Yellow),
                _ => count,
            };
            table.add_row(vec![Cell::new(severity.label()), count]);
        }
        table.add_row(vec![
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new(summary.summary.total()).add_attribute(Attribute::Bold),
        ]);
        self.term
            .write_line(&format!("Report {}", summary.job_id))?;
        self.term.write_line(&table.to_string())
    }

    fn render_reports(&self, list: &ReportList) -> io::Result<()> {
        if list.items.is_empty() {
            return self.term.write_line("No reports found.");
        }
        let mut table = self.new_table();
        let mut header = vec![
            Cell::new("Job").add_attribute(Attribute::Bold),
            Cell::new("Generated").add_attribute(Attribute::Bold),
            Cell::new("Repository").add_attribute(Attribute::Bold),
        ];
        header.extend(
            Severity::ALL
                .into_iter()
                .map(|severity| Cell::new(severity.label()).add_attribute(Attribute::Bold)),
        );
        header.push(Cell::new("Total").add_attribute(Attribute::Bold));
        table.set_header(header);

        for item in &list.items {
            let mut row = vec![
                Cell::new(&item.job_id),
                Cell::new(&item.generated_at),
                Cell::new(item.repo_url.as_deref().unwrap_or("-")),
            ];
            for severity in Severity::ALL {
                let count = item.summary.count(severity);
                let cell = Cell::new(count);
                row.push(match (self.colors && count > 0, severity) {
                    (true, Severity::Critical) => cell.fg(Color::Red),
                    (true, Severity::High) => cell.fg(Color::Yellow),
                    _ => cell,
                });
            }
            row.push(Cell::new(item.summary.total()));
            table.add_row(row);
        }
        self.term.write_line(&table.to_string())?;
        self.term.write_line(&format!(
            "Page {} of {} ({} reports)",
            list.page,
            list.page_count().max(1),
            list.total
        ))
    }

    fn render_health(&self, health: &HealthResponse) -> io::Result<()> {
        let style = self.style(Style::new().green());
        self.term.write_line(&format!(
            "Scanner API: {} (version {})",
            style.apply_to(&health.status),
            if health.version.is_empty() {
                "unknown"
            } else {
                health.version.as_str()
            }
        ))
    }

    fn render_export(&self, summary: &ExportSummary) -> io::Result<()> {
        let mut err = io::stderr();
        match &summary.path {
            Some(path) => self.term.write_line(&format!(
                "Exported {} ({} bytes) to {}",
                summary.filename,
                summary.bytes,
                path.display()
            ))?,
            None => writeln!(err, "Exported {} ({} bytes)", summary.filename, summary.bytes)?,
        }

        let source = match summary.source {
            ReportSource::Enhanced => self
                .style(Style::new().green())
                .apply_to("AI-enhanced report")
                .to_string(),
            ReportSource::Baseline => "standard report".to_string(),
        };
        writeln!(err, "Source: {source}")?;

        if let Some(fallback) = &summary.fallback {
            let warn = self.style(Style::new().yellow());
            writeln!(
                err,
                "{}",
                warn.apply_to(format!("AI analysis not included: {}", fallback.message))
            )?;
            if let Some(hint) = &fallback.hint {
                writeln!(err, "  Hint: {hint}")?;
            }
        }
        Ok(())
    }

    fn render_watch(&self, summary: &WatchSummary) -> io::Result<()> {
        let status = summary
            .status
            .map_or_else(|| "unknown".to_string(), |status| status.to_string());
        let line = match summary.stream.as_str() {
            "lost" => format!(
                "Lost the job stream while {} was {status}; run `codeagent job {} --refresh` to check on it",
                summary.job_id, summary.job_id
            ),
            "failed" => format!("Could not follow job {}", summary.job_id),
            _ => format!("Job {} is {status}", summary.job_id),
        };
        let style = match summary.status {
            Some(JobStatus::Completed) => self.style(Style::new().green()),
            Some(JobStatus::Failed) => self.style(Style::new().red()),
            _ => self.style(Style::new().yellow()),
        };
        let mut err = io::stderr();
        writeln!(err, "{}", style.apply_to(line))
    }

    fn style(&self, style: Style) -> Style {
        if self.colors {
            style
        } else {
            Style::new()
        }
    }
}
