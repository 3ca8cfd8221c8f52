//! Markdown encoders

use std::fmt::{self, Write};

use codeagent_types::{EnhancedReport, Issue, Report, ReportMeta, Severity, SeveritySummary};

use crate::escape::{escape_markdown_cell, escape_markdown_inline, markdown_fence};

fn write_summary(out: &mut String, summary: &SeveritySummary) -> fmt::Result {
    writeln!(out, "## Summary\n")?;
    writeln!(out, "| Metric | Count |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| Total Issues | {} |", summary.total())?;
    for severity in Severity::ALL {
        writeln!(out, "| {} | {} |", severity.label(), summary.count(severity))?;
    }
    writeln!(out)
}

fn write_meta(out: &mut String, meta: &ReportMeta) -> fmt::Result {
    writeln!(
        out,
        "- **Repository:** {}",
        escape_markdown_cell(&meta.repo.display_name())
    )?;
    if !meta.generated_at.is_empty() {
        writeln!(out, "- **Generated:** {}", meta.generated_at)?;
    }
    if !meta.tools.is_empty() {
        writeln!(out, "- **Tools:** {}", meta.tools.join(", "))?;
    }
    if meta.duration_ms > 0 {
        #[allow(clippy::cast_precision_loss)]
        let seconds = meta.duration_ms as f64 / 1000.0;
        writeln!(out, "- **Duration:** {seconds:.1}s")?;
    }
    writeln!(out)
}

fn write_issue_table<'a>(
    out: &mut String,
    issues: impl IntoIterator<Item = &'a Issue>,
) -> fmt::Result {
    writeln!(out, "| Line | Severity | Tool | Rule | Message | Suggestion |")?;
    writeln!(out, "|------|----------|------|------|---------|------------|")?;
    for issue in issues {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            issue.line,
            issue.severity.label(),
            escape_markdown_cell(&issue.tool),
            escape_markdown_cell(&issue.rule_id),
            escape_markdown_cell(&issue.message),
            escape_markdown_cell(issue.suggestion.as_deref().unwrap_or("")),
        )?;
    }
    writeln!(out)
}

pub(crate) fn report(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "# Security Report: {}\n", report.job_id)?;
    write_meta(&mut out, &report.meta)?;
    write_summary(&mut out, &report.summary)?;

    writeln!(out, "## Findings\n")?;
    if report.files.iter().all(|file| file.issues.is_empty()) {
        writeln!(out, "_No issues found._")?;
        return Ok(out);
    }
    for file in report.files.iter().filter(|file| !file.issues.is_empty()) {
        writeln!(out, "### {}\n", escape_markdown_cell(&file.path))?;
        write_issue_table(&mut out, &file.issues)?;
    }
    Ok(out)
}

pub(crate) fn enhanced(report: &EnhancedReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let summary = &report.summary;
    writeln!(out, "# AI-Enhanced Security Report: {}\n", report.job_id)?;
    if let Some(model) = &report.meta.ai_model_used {
        writeln!(out, "- **AI Model:** {}", escape_markdown_inline(model))?;
    }
    if let Some(min) = &report.meta.min_severity_analyzed {
        writeln!(out, "- **Minimum Severity Analyzed:** {min}")?;
    }
    if let Some(generated) = &report.meta.generated_at {
        writeln!(out, "- **Generated:** {generated}")?;
    }
    writeln!(out, "- **Files Analyzed by AI:** {}", summary.files_analyzed_by_ai)?;
    writeln!(out, "- **Issues Analyzed by AI:** {}", summary.issues_analyzed_by_ai)?;
    writeln!(out, "- **AI Fixes Generated:** {}\n", summary.ai_fixes_generated)?;
    write_summary(&mut out, &summary.severity_breakdown)?;

    writeln!(out, "## Findings\n")?;
    if report.enhanced_issues.is_empty() {
        writeln!(out, "_No issues were analyzed._")?;
        return Ok(out);
    }
    for group in &report.enhanced_issues {
        let ai = &group.ai_analysis;
        writeln!(out, "### {}\n", escape_markdown_cell(&group.file))?;
        if let Some(error) = &ai.error {
            writeln!(out, "> AI analysis failed: {}\n", escape_markdown_inline(error))?;
        }
        if !ai.root_cause.is_empty() {
            writeln!(out, "**Root Cause:** {}\n", escape_markdown_inline(&ai.root_cause))?;
        }
        if !ai.explanation.is_empty() {
            writeln!(out, "**Explanation:** {}\n", escape_markdown_inline(&ai.explanation))?;
        }
        if !ai.security_impact.is_empty() {
            writeln!(
                out,
                "**Security Impact:** {}\n",
                escape_markdown_inline(&ai.security_impact)
            )?;
        }
        if ai.has_fix() {
            let fence = markdown_fence(&ai.suggested_fix);
            writeln!(
                out,
                "**Suggested Fix:**\n\n{fence}\n{}\n{fence}\n",
                ai.suggested_fix.trim_end()
            )?;
        }
        if !ai.best_practices.is_empty() {
            writeln!(out, "**Best Practices:**\n")?;
            for practice in &ai.best_practices {
                writeln!(out, "- {}", escape_markdown_inline(practice))?;
            }
            writeln!(out)?;
        }
        write_issue_table(&mut out, &group.original_issues)?;
    }
    Ok(out)
}
