//! Command line interface definition

use clap::{Parser, Subcommand};
use codeagent_types::Severity;
use std::path::PathBuf;

/// codeagent - client for the CodeAgent security scanner
#[derive(Parser)]
#[command(name = "codeagent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watch security scan jobs and export their reports")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write debug logs to a file in the codeagent log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Scanner API base URL (overrides config and CODEAGENT_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the current status of a job
    #[command(alias = "status")]
    Job {
        /// Job identifier
        job_id: String,

        /// Bypass the cached snapshot
        #[arg(long)]
        refresh: bool,
    },

    /// Follow a job's live log until it finishes or Ctrl-C
    Watch {
        /// Job identifier
        job_id: String,
    },

    /// Export a job's report
    Export {
        /// Job identifier
        job_id: String,

        /// html, csv, markdown (md) or json; anything else exports json
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<String>,

        /// Include AI analysis when the scanner has it ready
        #[arg(long)]
        enhanced: bool,

        /// Directory to write the export into
        #[arg(short, long, value_name = "DIR", conflicts_with = "stdout")]
        output_dir: Option<PathBuf>,

        /// Print the export instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// List stored reports, newest first
    Reports {
        /// Page number, starting at 1
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page: Option<u32>,

        /// Reports per page
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,

        /// Only reports with findings of this severity
        #[arg(long, value_parser = parse_severity)]
        severity: Option<Severity>,

        /// Only reports produced by this tool, e.g. semgrep
        #[arg(long)]
        tool: Option<String>,

        /// Only reports of this repository
        #[arg(long)]
        repo: Option<String>,

        /// Generated at or after this timestamp
        #[arg(long, value_name = "TIMESTAMP")]
        since: Option<String>,

        /// Generated at or before this timestamp
        #[arg(long, value_name = "TIMESTAMP")]
        until: Option<String>,

        /// Only reports carrying this label
        #[arg(long)]
        label: Option<String>,
    },

    /// Show severity counts of a finished job
    Summary {
        /// Job identifier
        job_id: String,
    },

    /// Cancel a queued or running job
    Cancel {
        /// Job identifier
        job_id: String,
    },

    /// Run a job again with its original parameters
    Rerun {
        /// Job identifier
        job_id: String,
    },

    /// Check that the scanner API is reachable
    Health,
}

fn parse_severity(value: &str) -> Result<Severity, String> {
    Severity::ALL
        .into_iter()
        .find(|severity| severity.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| format!("expected one of critical, high, medium, low; got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_flags() {
        let cli = Cli::try_parse_from([
            "codeagent",
            "--api-url",
            "http://scanner:8000",
            "export",
            "job-1",
            "--format",
            "md",
            "--enhanced",
        ])
        .unwrap();
        assert_eq!(cli.global.api_url.as_deref(), Some("http://scanner:8000"));
        match cli.command {
            Commands::Export {
                job_id,
                format,
                enhanced,
                stdout,
                ..
            } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(format.as_deref(), Some("md"));
                assert!(enhanced);
                assert!(!stdout);
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_stdout_conflicts_with_output_dir() {
        let result = Cli::try_parse_from([
            "codeagent", "export", "job-1", "--stdout", "--output-dir", "/tmp",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_reports_filters() {
        let cli = Cli::try_parse_from([
            "codeagent", "reports", "--severity", "HIGH", "--page", "2", "--label", "nightly",
        ])
        .unwrap();
        match cli.command {
            Commands::Reports {
                page,
                severity,
                label,
                limit,
                ..
            } => {
                assert_eq!(page, Some(2));
                assert_eq!(severity, Some(Severity::High));
                assert_eq!(label.as_deref(), Some("nightly"));
                assert_eq!(limit, None);
            }
            _ => panic!("expected reports command"),
        }

        assert!(Cli::try_parse_from(["codeagent", "reports", "--page", "0"]).is_err());
        assert!(Cli::try_parse_from(["codeagent", "reports", "--severity", "info"]).is_err());
    }
}
