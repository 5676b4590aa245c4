//! HTML rendering of the run report.
//!
//! Output depends only on its inputs: no timestamps, no absolute paths, so a
//! re-run over the same data rewrites the same bytes.

use crate::analyser::logic::types::{Narrative, Profile};
use crate::plots::manifest::VisualizationManifest;
use crate::utils::{escape_html, fmt_bytes, fmt_f64};

const STYLE: &str = "\
* { box-sizing: border-box; }
body { font-family: 'Segoe UI', system-ui, sans-serif; margin: 0; padding: 24px; background: #f4f5f7; color: #1f2330; }
h1 { text-align: center; font-size: 2rem; margin-bottom: 4px; color: #3b3f8f; }
h2 { border-bottom: 2px solid #667eea; padding-bottom: 4px; }
.subtitle { text-align: center; color: #6b7080; margin-bottom: 32px; }
section { background: #fff; border-radius: 12px; padding: 16px 20px; margin-bottom: 24px; border: 1px solid #e2e4ea; }
table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
th, td { border: 1px solid #e2e4ea; padding: 6px 8px; text-align: right; }
th:first-child, td:first-child { text-align: left; }
th { background: #eef0fb; }
.ai-section { border-left: 4px solid #764ba2; }
.ai-label { font-size: 0.8rem; color: #764ba2; text-transform: uppercase; letter-spacing: 0.05em; }
.ai-content { line-height: 1.7; white-space: pre-wrap; }
.charts { display: grid; grid-template-columns: repeat(auto-fill, minmax(420px, 1fr)); gap: 24px; }
.chart { background: #fff; border-radius: 12px; overflow: hidden; border: 1px solid #e2e4ea; }
.chart img { width: 100%; height: auto; display: block; }
.chart p { margin: 0; padding: 12px; font-size: 0.85rem; color: #6b7080; }
footer { text-align: center; margin-top: 48px; color: #8a8f9c; font-size: 0.9rem; }
";

/// Render the report as a self-contained HTML document.
///
/// `source_name` is shown as the dataset title; charts are referenced by
/// their path relative to the report.
pub fn render_html(
    profile: &Profile,
    narrative: Option<&Narrative>,
    manifest: &VisualizationManifest,
    source_name: &str,
) -> String {
    let mut html = String::new();
    let title = format!("Data report: {source_name}");

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    html.push_str(&format!("<style>\n{STYLE}</style>\n"));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&title)));
    html.push_str("<p class=\"subtitle\">Profile, charts and summary</p>\n");

    render_overview(&mut html, profile);
    render_missing(&mut html, profile);
    render_numeric(&mut html, profile);
    render_categorical(&mut html, profile);
    render_correlation(&mut html, profile);

    if let Some(narrative) = narrative {
        html.push_str("<section class=\"ai-section\">\n<h2>AI summary</h2>\n");
        html.push_str(
            "<p class=\"ai-label\">Generated by an AI model from the statistics above. Verify before relying on it.</p>\n",
        );
        html.push_str(&format!(
            "<div class=\"ai-content\">{}</div>\n",
            escape_html(narrative.as_str())
        ));
        html.push_str("</section>\n");
    }

    render_charts(&mut html, manifest);

    html.push_str("<footer>Generated by tablescope</footer>\n");
    html.push_str("</body>\n</html>\n");
    html
}

fn render_overview(html: &mut String, profile: &Profile) {
    html.push_str("<section>\n<h2>Overview</h2>\n<table>\n");
    let rows = [
        ("Rows", profile.row_count.to_string()),
        ("Columns", profile.column_count.to_string()),
        (
            "Memory (estimate)",
            fmt_bytes(profile.memory_estimate_bytes),
        ),
        ("Numeric columns", profile.numeric_columns.join(", ")),
        ("Categorical columns", profile.categorical_columns.join(", ")),
    ];
    for (label, value) in rows {
        html.push_str(&format!(
            "<tr><th>{label}</th><td>{}</td></tr>\n",
            escape_html(&value)
        ));
    }
    html.push_str("</table>\n</section>\n");
}

fn render_missing(html: &mut String, profile: &Profile) {
    html.push_str("<section>\n<h2>Missing values</h2>\n");
    if profile.has_missing() {
        html.push_str("<table>\n<tr><th>Column</th><th>Missing</th><th>Share</th></tr>\n");
        for (column, count) in &profile.missing_by_column {
            let share = if profile.row_count == 0 {
                0.0
            } else {
                *count as f64 * 100.0 / profile.row_count as f64
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{count}</td><td>{share:.1}%</td></tr>\n",
                escape_html(column)
            ));
        }
        html.push_str("</table>\n");
    } else {
        html.push_str("<p>No missing values.</p>\n");
    }
    html.push_str("</section>\n");
}

fn render_numeric(html: &mut String, profile: &Profile) {
    html.push_str("<section>\n<h2>Numeric columns</h2>\n");
    if profile.numeric_stats.is_empty() {
        html.push_str("<p>No numeric columns.</p>\n</section>\n");
        return;
    }
    html.push_str(
        "<table>\n<tr><th>Column</th><th>Count</th><th>Mean</th><th>Std</th><th>Min</th><th>25%</th><th>50%</th><th>75%</th><th>Max</th></tr>\n",
    );
    for s in &profile.numeric_stats {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&s.column),
            s.count,
            fmt_f64(s.mean),
            fmt_f64(s.std),
            fmt_f64(s.min),
            fmt_f64(s.q1),
            fmt_f64(s.median),
            fmt_f64(s.q3),
            fmt_f64(s.max)
        ));
    }
    html.push_str("</table>\n</section>\n");
}

fn render_categorical(html: &mut String, profile: &Profile) {
    html.push_str("<section>\n<h2>Categorical columns</h2>\n");
    if profile.categorical_stats.is_empty() {
        html.push_str("<p>No categorical columns.</p>\n</section>\n");
        return;
    }
    html.push_str(
        "<table>\n<tr><th>Column</th><th>Unique</th><th>Missing</th><th>Most frequent values</th></tr>\n",
    );
    for s in &profile.categorical_stats {
        let top: Vec<String> = s
            .top_values
            .iter()
            .map(|v| format!("{} ({})", escape_html(&v.value), v.count))
            .collect();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&s.column),
            s.unique_count,
            s.missing,
            top.join(", ")
        ));
    }
    html.push_str("</table>\n</section>\n");
}

fn render_correlation(html: &mut String, profile: &Profile) {
    let m = &profile.correlation_matrix;
    if m.columns.len() < 2 {
        return;
    }
    html.push_str("<section>\n<h2>Correlation matrix</h2>\n<table>\n<tr><th></th>");
    for name in &m.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(name)));
    }
    html.push_str("</tr>\n");
    for (name, row) in m.columns.iter().zip(&m.data) {
        html.push_str(&format!("<tr><td>{}</td>", escape_html(name)));
        for v in row {
            if v.is_finite() {
                html.push_str(&format!("<td>{v:.2}</td>"));
            } else {
                html.push_str("<td>—</td>");
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</section>\n");
}

fn render_charts(html: &mut String, manifest: &VisualizationManifest) {
    if manifest.entries.is_empty() && manifest.omitted.is_empty() {
        return;
    }
    html.push_str("<h2>Charts</h2>\n");
    if !manifest.entries.is_empty() {
        html.push_str("<section class=\"charts\">\n");
        for entry in &manifest.entries {
            let src = escape_html(entry.relative_path());
            let title = escape_html(&entry.title);
            html.push_str(&format!(
                "<div class=\"chart\"><img src=\"{src}\" alt=\"{title}\"/><p>{title}</p></div>\n"
            ));
        }
        html.push_str("</section>\n");
    }
    if !manifest.omitted.is_empty() {
        html.push_str("<section>\n<h3>Charts not produced</h3>\n<ul>\n");
        for o in &manifest.omitted {
            html.push_str(&format!(
                "<li>{} ({}): {}</li>\n",
                escape_html(&o.name),
                o.kind,
                escape_html(&o.reason.to_string())
            ));
        }
        html.push_str("</ul>\n</section>\n");
    }
}
