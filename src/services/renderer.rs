//! Notification document rendering.
//!
//! Rendering is a pure function of its input: renderers borrow reports
//! immutably and return a fresh document.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::error::RenderError;
use crate::models::{AggregateResult, ProjectReport, ReportStats, RunStatus};

/// A rendered notification, HTML plus a plain-text alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub text: String,
}

/// Turns report data into a displayable document.
pub trait Renderer: Send + Sync {
    /// Document for a single test run.
    fn render_report(
        &self,
        report: &ReportStats,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedDocument, RenderError>;

    /// Document for an aggregate of several projects.
    fn render_projects(
        &self,
        aggregate: &AggregateResult,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedDocument, RenderError>;
}

const PAGE_STYLE: &str = "background-color:#f8fafc;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;margin:0;padding:0";
const CONTAINER_STYLE: &str = "max-width:800px;margin:0 auto;background-color:#ffffff;border-radius:8px;overflow:hidden";
const CARD_STYLE: &str = "background-color:#f1f5f9;padding:16px;border-radius:8px;text-align:center";
const LABEL_STYLE: &str = "font-size:12px;color:#64748b;margin:0;text-transform:uppercase";
const VALUE_STYLE: &str = "font-size:24px;font-weight:bold;margin:4px 0 0 0";
const DETAIL_STYLE: &str = "font-size:13px;color:#475569;line-height:1.6";

/// Inline-styled HTML email renderer.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    /// Optional "view dashboard" link
    dashboard_url: Option<String>,
}

impl HtmlRenderer {
    pub fn new(dashboard_url: Option<String>) -> Self {
        Self { dashboard_url }
    }

    fn open_document(
        &self,
        html: &mut String,
        title: &str,
        status_color: &str,
        heading: &str,
        lines: &[String],
    ) -> Result<(), RenderError> {
        write!(
            html,
            "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title></head>\
             <body style=\"{}\"><div style=\"{}\">",
            escape_html(title),
            PAGE_STYLE,
            CONTAINER_STYLE
        )?;
        write!(
            html,
            "<div style=\"background-color:{};padding:24px;text-align:center\">\
             <p style=\"color:#ffffff;font-size:28px;font-weight:bold;margin:0\">{}</p>",
            status_color,
            escape_html(heading)
        )?;
        for line in lines {
            write!(
                html,
                "<p style=\"color:#ffffff;font-size:15px;margin:8px 0 0 0\">{}</p>",
                escape_html(line)
            )?;
        }
        html.push_str("</div>");
        Ok(())
    }

    fn close_document(&self, html: &mut String, text: &mut String) -> Result<(), RenderError> {
        if let Some(ref url) = self.dashboard_url {
            write!(
                html,
                "<div style=\"padding:24px;text-align:center\">\
                 <a href=\"{}\" style=\"background-color:#2563eb;color:#ffffff;padding:12px 24px;\
                 border-radius:6px;text-decoration:none;font-weight:bold\">View Dashboard</a></div>",
                escape_html(url)
            )?;
            writeln!(text, "\nView dashboard: {}", url)?;
        }
        html.push_str(
            "<p style=\"font-size:12px;color:#94a3b8;text-align:center;padding:0 24px 24px 24px\">\
             This is an automated test report.</p></div></body></html>",
        );
        Ok(())
    }
}

impl Renderer for HtmlRenderer {
    fn render_report(
        &self,
        report: &ReportStats,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedDocument, RenderError> {
        let status = report.status();
        let generated = format_timestamp(Some(generated_at));
        let mut html = String::new();
        let mut text = String::new();

        self.open_document(
            &mut html,
            &format!("Test Report - {}", generated),
            status.color(),
            "Test Execution Report",
            &[status.label().to_string(), generated.clone()],
        )?;

        html.push_str("<div style=\"padding:24px\">");
        write_stat_cards(
            &mut html,
            &[
                ("Total Tests", report.tests.to_string()),
                ("Passed", report.passes.to_string()),
                ("Failed", report.failures.to_string()),
                ("Duration", format_duration(report.duration)),
            ],
        )?;
        write!(
            html,
            "<div style=\"{}\"><div>Start: {}</div><div>End: {}</div><div>Suites: {}</div>\
             <div>Pending: {}</div><div>Skipped: {}</div><div>Pass Rate: {}%</div></div></div>",
            DETAIL_STYLE,
            format_timestamp(report.start),
            format_timestamp(report.end),
            report.suites,
            report.pending,
            report.skipped,
            format_percent(report.pass_rate())
        )?;

        writeln!(text, "Test Execution Report - {}", status.label())?;
        writeln!(text, "Generated: {}", generated)?;
        writeln!(text)?;
        write_text_stats(&mut text, report)?;

        self.close_document(&mut html, &mut text)?;
        Ok(RenderedDocument { html, text })
    }

    fn render_projects(
        &self,
        aggregate: &AggregateResult,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedDocument, RenderError> {
        let summary = aggregate.summary();
        let status = summary.status();
        let generated = format_timestamp(Some(generated_at));
        let mut html = String::new();
        let mut text = String::new();

        self.open_document(
            &mut html,
            &format!("Multi-Project Test Report - {}", generated),
            status.color(),
            "Smoke Test Report",
            &[
                overall_label(status).to_string(),
                format!("{} Projects \u{2022} {}", summary.total_projects, generated),
            ],
        )?;

        html.push_str("<div style=\"padding:24px\">");
        write_stat_cards(
            &mut html,
            &[
                ("Projects", summary.total_projects.to_string()),
                ("Total Tests", summary.total_tests.to_string()),
                ("Passed", summary.total_passes.to_string()),
                ("Failed", summary.total_failures.to_string()),
            ],
        )?;
        html.push_str("</div><div style=\"padding:0 24px 24px 24px\">");

        writeln!(text, "Smoke Test Report - {}", overall_label(status))?;
        writeln!(
            text,
            "{} projects, generated {}",
            summary.total_projects, generated
        )?;
        writeln!(
            text,
            "Totals: {} tests, {} passed, {} failed ({}% pass rate)",
            summary.total_tests,
            summary.total_passes,
            summary.total_failures,
            format_percent(summary.pass_rate)
        )?;

        for (index, project) in aggregate.projects().iter().enumerate() {
            write_project_card(&mut html, project, index)?;
            writeln!(text)?;
            writeln!(
                text,
                "== {} ({}) ==",
                project.display_name(index),
                project.report.status().label()
            )?;
            writeln!(text, "Created: {}", format_timestamp(project.created_at))?;
            write_text_stats(&mut text, &project.report)?;
        }
        html.push_str("</div>");

        self.close_document(&mut html, &mut text)?;
        Ok(RenderedDocument { html, text })
    }
}

/// Header line for an aggregate status.
pub fn overall_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Failed => "Some Projects Have Failures",
        RunStatus::Passed => "All Projects Passed",
        RunStatus::NoTests => "No Tests Run",
    }
}

fn write_stat_cards(html: &mut String, cards: &[(&str, String)]) -> Result<(), RenderError> {
    html.push_str("<table role=\"presentation\" width=\"100%\" cellspacing=\"8\"><tr>");
    for (label, value) in cards {
        write!(
            html,
            "<td style=\"{}\"><p style=\"{}\">{}</p><p style=\"{}\">{}</p></td>",
            CARD_STYLE,
            LABEL_STYLE,
            label,
            VALUE_STYLE,
            escape_html(value)
        )?;
    }
    html.push_str("</tr></table>");
    Ok(())
}

fn write_project_card(
    html: &mut String,
    project: &ProjectReport,
    index: usize,
) -> Result<(), RenderError> {
    let report = &project.report;
    let status = report.status();

    write!(
        html,
        "<div style=\"border:1px solid #e2e8f0;border-left:4px solid {};border-radius:8px;\
         padding:16px;margin-top:16px\">\
         <p style=\"font-size:18px;font-weight:bold;margin:0\">{}</p>\
         <p style=\"font-size:12px;color:#64748b;margin:4px 0 0 0\">{}</p>\
         <p style=\"font-size:13px;font-weight:bold;color:{};margin:8px 0\">{}</p>",
        status.color(),
        escape_html(&project.display_name(index)),
        format_timestamp(project.created_at),
        status.color(),
        status.label()
    )?;
    write_stat_cards(
        html,
        &[
            ("Tests", report.tests.to_string()),
            ("Passed", report.passes.to_string()),
            ("Failed", report.failures.to_string()),
            ("Duration", format_duration(report.duration)),
        ],
    )?;
    write!(
        html,
        "<div style=\"{}\"><div>Start: {}</div><div>End: {}</div><div>Suites: {}</div>\
         <div>Pass Rate: {}%</div></div></div>",
        DETAIL_STYLE,
        format_timestamp(report.start),
        format_timestamp(report.end),
        report.suites,
        format_percent(report.pass_rate())
    )?;
    Ok(())
}

fn write_text_stats(text: &mut String, report: &ReportStats) -> Result<(), RenderError> {
    writeln!(
        text,
        "Tests: {}  Passed: {}  Failed: {}  Duration: {}",
        report.tests,
        report.passes,
        report.failures,
        format_duration(report.duration)
    )?;
    writeln!(
        text,
        "Start: {}  End: {}  Suites: {}  Pass Rate: {}%",
        format_timestamp(report.start),
        format_timestamp(report.end),
        report.suites,
        format_percent(report.pass_rate())
    )?;
    Ok(())
}

/// Human duration: `ms` below a second, one-decimal seconds below a minute,
/// one-decimal minutes above.
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms == 0 {
        "0ms".to_string()
    } else if duration_ms < 1000 {
        format!("{}ms", duration_ms)
    } else if duration_ms < 60_000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        format!("{:.1}m", duration_ms as f64 / 60_000.0)
    }
}

/// `YYYY-MM-DD HH:MM:SS UTC`, or `N/A`.
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "N/A".to_string(),
    }
}

/// Whole percentages without decimals, others with one.
pub fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{:.0}", percent)
    } else {
        format!("{:.1}", percent)
    }
}

/// Escape text for HTML element and attribute content.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
