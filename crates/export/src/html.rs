//! Standalone HTML encoders

use std::fmt::{self, Write};

use codeagent_types::{AiAnalysis, EnhancedReport, Issue, Report, ReportMeta, Severity, SeveritySummary};

use crate::escape::escape_html;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;color:#1f2328}\
table{border-collapse:collapse;width:100%;margin-bottom:1.5rem}\
th,td{border:1px solid #d0d7de;padding:.4rem .6rem;text-align:left;vertical-align:top}\
th{background:#f6f8fa}\
.severity-critical{color:#a40e26;font-weight:600}\
.severity-high{color:#bc4c00;font-weight:600}\
.severity-medium{color:#9a6700}\
.severity-low{color:#57606a}\
.ai{background:#f6f8fa;border-left:4px solid #8250df;padding:.75rem 1rem;margin-bottom:1rem}\
pre{white-space:pre-wrap}";

fn write_head(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{}</title>", escape_html(title))?;
    writeln!(out, "<style>{STYLE}</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>{}</h1>", escape_html(title))
}

fn write_tail(out: &mut String) -> fmt::Result {
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn write_summary(out: &mut String, summary: &SeveritySummary) -> fmt::Result {
    writeln!(out, "<section class=\"summary\">")?;
    writeln!(out, "<h2>Summary</h2>")?;
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>Total Issues</th><td data-count=\"total\">{}</td></tr>",
        summary.total()
    )?;
    for severity in Severity::ALL {
        writeln!(
            out,
            "<tr><th class=\"severity-{}\">{}</th><td data-count=\"{}\">{}</td></tr>",
            severity.as_str(),
            severity.label(),
            severity.as_str(),
            summary.count(severity)
        )?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

fn write_meta(out: &mut String, job_id: &str, meta: &ReportMeta) -> fmt::Result {
    writeln!(out, "<section class=\"meta\">")?;
    writeln!(out, "<p><strong>Job:</strong> {}</p>", escape_html(job_id))?;
    writeln!(
        out,
        "<p><strong>Repository:</strong> {}</p>",
        escape_html(&meta.repo.display_name())
    )?;
    if !meta.generated_at.is_empty() {
        writeln!(
            out,
            "<p><strong>Generated:</strong> {}</p>",
            escape_html(&meta.generated_at)
        )?;
    }
    if !meta.tools.is_empty() {
        writeln!(
            out,
            "<p><strong>Tools:</strong> {}</p>",
            escape_html(&meta.tools.join(", "))
        )?;
    }
    writeln!(out, "</section>")
}

fn write_issue_table<'a>(
    out: &mut String,
    issues: impl IntoIterator<Item = &'a Issue>,
) -> fmt::Result {
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<thead><tr><th>Line</th><th>Severity</th><th>Tool</th><th>Rule</th>\
         <th>Message</th><th>Suggestion</th></tr></thead>"
    )?;
    writeln!(out, "<tbody>")?;
    for issue in issues {
        writeln!(
            out,
            "<tr class=\"issue severity-{sev}\"><td>{line}</td><td>{label}</td><td>{tool}</td>\
             <td>{rule}</td><td>{message}</td><td>{suggestion}</td></tr>",
            sev = issue.severity.as_str(),
            line = issue.line,
            label = issue.severity.label(),
            tool = escape_html(&issue.tool),
            rule = escape_html(&issue.rule_id),
            message = escape_html(&issue.message),
            suggestion = escape_html(issue.suggestion.as_deref().unwrap_or("")),
        )?;
    }
    writeln!(out, "</tbody>")?;
    writeln!(out, "</table>")
}

pub(crate) fn report(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_head(&mut out, &format!("Security Report {}", report.job_id))?;
    write_meta(&mut out, &report.job_id, &report.meta)?;
    write_summary(&mut out, &report.summary)?;

    writeln!(out, "<section class=\"files\">")?;
    for file in report.files.iter().filter(|file| !file.issues.is_empty()) {
        writeln!(out, "<h2>{}</h2>", escape_html(&file.path))?;
        write_issue_table(&mut out, &file.issues)?;
    }
    if report.issue_count() == 0 {
        writeln!(out, "<p>No issues found.</p>")?;
    }
    writeln!(out, "</section>")?;

    write_tail(&mut out)?;
    Ok(out)
}

fn write_analysis(out: &mut String, ai: &AiAnalysis) -> fmt::Result {
    writeln!(out, "<div class=\"ai\">")?;
    if let Some(error) = &ai.error {
        writeln!(
            out,
            "<p><strong>AI analysis failed:</strong> {}</p>",
            escape_html(error)
        )?;
    }
    let sections = [
        ("Root Cause", &ai.root_cause),
        ("Explanation", &ai.explanation),
        ("Security Impact", &ai.security_impact),
    ];
    for (title, text) in sections {
        if !text.is_empty() {
            writeln!(
                out,
                "<p><strong>{title}:</strong> {}</p>",
                escape_html(text)
            )?;
        }
    }
    if ai.has_fix() {
        writeln!(
            out,
            "<p><strong>Suggested Fix:</strong></p><pre>{}</pre>",
            escape_html(&ai.suggested_fix)
        )?;
    }
    if !ai.best_practices.is_empty() {
        writeln!(out, "<p><strong>Best Practices:</strong></p>")?;
        writeln!(out, "<ul>")?;
        for practice in &ai.best_practices {
            writeln!(out, "<li>{}</li>", escape_html(practice))?;
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "</div>")
}

pub(crate) fn enhanced(report: &EnhancedReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let summary = &report.summary;
    write_head(
        &mut out,
        &format!("AI-Enhanced Security Report {}", report.job_id),
    )?;

    writeln!(out, "<section class=\"meta\">")?;
    writeln!(out, "<p><strong>Job:</strong> {}</p>", escape_html(&report.job_id))?;
    if let Some(model) = &report.meta.ai_model_used {
        writeln!(out, "<p><strong>AI Model:</strong> {}</p>", escape_html(model))?;
    }
    if let Some(generated) = &report.meta.generated_at {
        writeln!(
            out,
            "<p><strong>Generated:</strong> {}</p>",
            escape_html(generated)
        )?;
    }
    writeln!(
        out,
        "<p><strong>Files analyzed by AI:</strong> {} &middot; \
         <strong>Issues analyzed:</strong> {} &middot; \
         <strong>Fixes generated:</strong> {}</p>",
        summary.files_analyzed_by_ai, summary.issues_analyzed_by_ai, summary.ai_fixes_generated
    )?;
    writeln!(out, "</section>")?;
    write_summary(&mut out, &summary.severity_breakdown)?;

    writeln!(out, "<section class=\"files\">")?;
    for group in &report.enhanced_issues {
        writeln!(out, "<h2>{}</h2>", escape_html(&group.file))?;
        write_analysis(&mut out, &group.ai_analysis)?;
        write_issue_table(&mut out, &group.original_issues)?;
    }
    if report.enhanced_issues.is_empty() {
        writeln!(out, "<p>No issues were analyzed.</p>")?;
    }
    writeln!(out, "</section>")?;

    write_tail(&mut out)?;
    Ok(out)
}
