//! CSV encoders: one data row per issue

use std::fmt::{self, Write};

use codeagent_types::{AiAnalysis, EnhancedReport, Issue, Report};

use crate::escape::escape_csv_field;

const HEADER: [&str; 7] = [
    "File",
    "Line",
    "Severity",
    "Tool",
    "Rule ID",
    "Message",
    "Suggestion",
];

const AI_HEADER: [&str; 4] = [
    "AI Root Cause",
    "AI Suggested Fix",
    "AI Security Impact",
    "AI Best Practices",
];

fn write_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) -> fmt::Result {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write!(out, "{}", escape_csv_field(field))?;
    }
    out.push('\n');
    Ok(())
}

fn issue_fields(issue: &Issue) -> [String; 7] {
    [
        issue.file.clone(),
        issue.line.to_string(),
        issue.severity.as_str().to_string(),
        issue.tool.clone(),
        issue.rule_id.clone(),
        issue.message.clone(),
        issue.suggestion.clone().unwrap_or_default(),
    ]
}

pub(crate) fn report(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_row(&mut out, HEADER)?;
    for issue in report.issues() {
        let fields = issue_fields(issue);
        write_row(&mut out, fields.iter().map(String::as_str))?;
    }
    Ok(out)
}

fn ai_fields(analysis: &AiAnalysis) -> [String; 4] {
    [
        analysis.root_cause.clone(),
        analysis.suggested_fix.clone(),
        analysis.security_impact.clone(),
        analysis.best_practices.join("; "),
    ]
}

pub(crate) fn enhanced(report: &EnhancedReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_row(&mut out, HEADER.into_iter().chain(AI_HEADER))?;
    for group in &report.enhanced_issues {
        let ai = ai_fields(&group.ai_analysis);
        for issue in &group.original_issues {
            let fields = issue_fields(issue);
            write_row(
                &mut out,
                fields.iter().chain(ai.iter()).map(String::as_str),
            )?;
        }
    }
    Ok(out)
}
