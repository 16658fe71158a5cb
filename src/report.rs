//! Output formatting for a rendered [`View`].
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: the `View` serialized as-is, for programmatic consumption
//! - HTML: a standalone page with the same sections and links as the web UI

use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use crate::session::messages;
use crate::view::{ActionControl, ResultsView, View};

/// Output format for rendered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Html,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Render a view in the given format.
pub fn render(view: &View, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Pretty => render_pretty(view),
        OutputFormat::Json => render_json(view)?,
        OutputFormat::Html => render_html(view),
    })
}

/// Render to `output`, or to stdout when no path is given.
pub fn write(view: &View, format: OutputFormat, output: Option<&Path>) -> anyhow::Result<()> {
    let rendered = render(view, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            tracing::info!(path = %path.display(), format = %format, "wrote report");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

// =============================================================================
// JSON
// =============================================================================

pub fn render_json(view: &View) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(view)?;
    json.push('\n');
    Ok(json)
}

// =============================================================================
// Pretty
// =============================================================================

pub fn render_pretty(view: &View) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", view.title.cyan().bold());
    let _ = writeln!(out);

    let _ = writeln!(out, "  {}", messages::UPLOAD_HEADING.bold());
    if view.selected_files > 0 {
        let _ = writeln!(
            out,
            "    {}",
            format!("{} file(s) selected", view.selected_files).dimmed()
        );
    }
    let _ = writeln!(out, "    {}", pretty_control(&view.upload));
    if !view.status.is_empty() {
        let _ = writeln!(out, "    {}", view.status);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "  {}", messages::ANALYZE_HEADING.bold());
    let _ = writeln!(out, "    {}", pretty_control(&view.analyze));

    if let Some(results) = &view.results {
        let _ = writeln!(out);
        write_pretty_results(&mut out, results);
    }

    let _ = writeln!(out);
    out
}

fn pretty_control(control: &ActionControl) -> ColoredString {
    let text = format!("[{}]", control.label);
    if control.disabled {
        text.dimmed()
    } else {
        text.green()
    }
}

fn write_pretty_results(out: &mut String, results: &ResultsView) {
    let _ = writeln!(out, "  {}", messages::RESULTS_HEADING.cyan().bold());

    if let Some(responses) = &results.responses {
        let _ = writeln!(out, "    {}", messages::RESPONSES_HEADING.bold());
        for item in responses {
            let _ = writeln!(out, "      • {}", item.text());
        }
    }

    if let Some(links) = &results.excel_files {
        let _ = writeln!(out, "    {}", messages::EXCEL_HEADING.bold());
        for link in links {
            let _ = writeln!(
                out,
                "      • {}: {} {}",
                link.pdf_file,
                link.label(),
                format!("<{}>", link.href).blue().underline()
            );
        }
    }
}

// =============================================================================
// HTML
// =============================================================================

fn text(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}

fn html_button(out: &mut String, control: &ActionControl) {
    let disabled = if control.disabled { " disabled" } else { "" };
    let _ = writeln!(out, "      <button{}>{}</button>", disabled, text(&control.label));
}

pub fn render_html(view: &View) -> String {
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n");
    out.push_str("  <meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "  <title>{}</title>", text(&view.title));
    out.push_str("</head>\n<body>\n<div class=\"App\">\n");
    let _ = writeln!(
        out,
        "  <header class=\"App-header\">\n    <h1>{}</h1>\n  </header>",
        text(&view.title)
    );
    out.push_str("  <main>\n");

    out.push_str("    <section>\n");
    let _ = writeln!(out, "      <h2>{}</h2>", text(messages::UPLOAD_HEADING));
    html_button(&mut out, &view.upload);
    let _ = writeln!(out, "      <p>{}</p>", text(&view.status));
    out.push_str("    </section>\n");

    out.push_str("    <section>\n");
    let _ = writeln!(out, "      <h2>{}</h2>", text(messages::ANALYZE_HEADING));
    html_button(&mut out, &view.analyze);
    out.push_str("    </section>\n");

    if let Some(results) = &view.results {
        write_html_results(&mut out, results);
    }

    out.push_str("  </main>\n</div>\n</body>\n</html>\n");
    out
}

fn write_html_results(out: &mut String, results: &ResultsView) {
    out.push_str("    <section>\n");
    let _ = writeln!(out, "      <h2>{}</h2>", text(messages::RESULTS_HEADING));

    if let Some(responses) = &results.responses {
        out.push_str("      <div>\n");
        let _ = writeln!(out, "        <h3>{}</h3>", text(messages::RESPONSES_HEADING));
        out.push_str("        <ul>\n");
        for item in responses {
            let _ = writeln!(
                out,
                "          <li><strong>{}:</strong> {}</li>",
                text(&item.question),
                text(&item.answer)
            );
        }
        out.push_str("        </ul>\n      </div>\n");
    }

    if let Some(links) = &results.excel_files {
        out.push_str("      <div>\n");
        let _ = writeln!(out, "        <h3>{}</h3>", text(messages::EXCEL_HEADING));
        out.push_str("        <ul>\n");
        for link in links {
            let _ = writeln!(
                out,
                "          <li>{}: <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></li>",
                text(&link.pdf_file),
                attr(&link.href),
                text(&link.label())
            );
        }
        out.push_str("        </ul>\n      </div>\n");
    }

    out.push_str("    </section>\n");
}
