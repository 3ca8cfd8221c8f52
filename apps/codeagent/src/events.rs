//! Event handling and live terminal feedback

use codeagent_events::{AppEvent, EventMessage, ExportEvent, GeneralEvent, JobEvent};
use codeagent_types::{ExportFormat, TriggerStatus};
use console::{Style, Term};

use crate::logging::log_event_with_tracing;

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Job log lines go here so they can be piped
    out: Term,
    /// Status, warnings and errors
    err: Term,
    colors: bool,
    debug: bool,
    /// `--json` mode keeps the terminal clean for the final document
    quiet: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors: bool, debug: bool, quiet: bool) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            colors,
            debug,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        let message = EventMessage::from_event(event);
        log_event_with_tracing(&message);
        if self.quiet {
            return;
        }

        match message.event {
            AppEvent::Job(event) => self.handle_job_event(event),
            AppEvent::Export(event) => self.handle_export_event(event),
            AppEvent::General(event) => self.handle_general_event(event),
        }
    }

    fn handle_job_event(&self, event: JobEvent) {
        match event {
            JobEvent::LogAppended { line, .. } => self.show_log_line(&line),
            JobEvent::StreamOpened { url, .. } if self.debug => {
                self.show_status(&format!("Connected to {url}"));
            }
            JobEvent::StatusChanged { status, .. } if self.debug => {
                self.show_status(&format!("Status: {status}"));
            }
            // The tracker already logged why the stream broke.
            _ => {}
        }
    }

    fn handle_export_event(&self, event: ExportEvent) {
        match event {
            ExportEvent::Started {
                job_id,
                format,
                include_enhanced,
            } => {
                let variant = if include_enhanced { " with AI analysis" } else { "" };
                self.show_status(&format!(
                    "Exporting {job_id} as {}{variant}",
                    format_label(format)
                ));
            }
            ExportEvent::EnhancedTriggered { status, .. } => match status {
                TriggerStatus::Processing => {
                    self.show_status("AI analysis started, waiting briefly for results");
                }
                TriggerStatus::Complete => self.show_status("AI analysis ready"),
                TriggerStatus::Skipped => {}
            },
            ExportEvent::EnhancedFallback { failure, .. } => {
                self.show_warning(&format!("Using the standard report: {}", failure.message));
                if let Some(hint) = failure.hint {
                    self.show_warning(&format!("  {hint}"));
                }
            }
            ExportEvent::Failed { failure, .. } => {
                self.show_error(&format!("Export failed: {}", failure.message));
            }
            ExportEvent::Completed { .. } => {}
        }
    }

    fn handle_general_event(&self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => self.show_warning(&format!("{message} ({context})")),
                None => self.show_warning(&message),
            },
            GeneralEvent::Error { message, details } => match details {
                Some(details) => self.show_error(&format!("{message}: {details}")),
                None => self.show_error(&message),
            },
            GeneralEvent::DebugLog { message, .. } if self.debug => {
                self.show_status(&message);
            }
            GeneralEvent::OperationStarted { operation } if self.debug => {
                self.show_status(&format!("{operation}..."));
            }
            // Failures reach the user through the command's error.
            _ => {}
        }
    }

    fn style_for_line(&self, line: &str) -> Style {
        if !self.colors {
            return Style::new();
        }
        if line.starts_with("[ERROR]") {
            Style::new().red()
        } else if line.starts_with("[WARN]") {
            Style::new().yellow()
        } else if line.starts_with("[SUCCESS]") {
            Style::new().green().bold()
        } else {
            Style::new().dim()
        }
    }

    fn show_log_line(&self, line: &str) {
        let style = self.style_for_line(line);
        let _ = self.out.write_line(&style.apply_to(line).to_string());
    }

    /// Show status message
    fn show_status(&self, message: &str) {
        let _ = self.err.write_line(message);
    }

    fn show_warning(&self, message: &str) {
        let style = if self.colors {
            Style::new().yellow()
        } else {
            Style::new()
        };
        let _ = self.err.write_line(&style.apply_to(message).to_string());
    }

    /// Show error message
    fn show_error(&self, message: &str) {
        let style = if self.colors {
            Style::new().red()
        } else {
            Style::new()
        };
        let _ = self.err.write_line(&style.apply_to(message).to_string());
    }
}

fn format_label(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Html => "HTML",
        ExportFormat::Csv => "CSV",
        ExportFormat::Markdown => "Markdown",
        ExportFormat::Json => "JSON",
    }
}
