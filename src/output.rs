//! Rendering of a [`RateSummary`] for the terminal.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::app::Result;
use crate::config::OutputFormat;
use crate::domain::{RateSummary, DATE_FORMAT};

pub fn render(summary: &RateSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(summary),
        OutputFormat::Table => Ok(render_table(summary)),
    }
}

/// Pretty JSON with four-space indentation.
pub fn render_json(summary: &RateSummary) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    summary.serialize(&mut serializer)?;

    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn render_table(summary: &RateSummary) -> String {
    let mut out = format!("{:<12} {:<8} {:>12} {:>12}\n", "DATE", "CURRENCY", "SALE", "PURCHASE");

    for (date, rates) in summary.iter() {
        let date = date.format(DATE_FORMAT).to_string();
        if rates.is_empty() {
            out.push_str(&format!("{:<12} {:<8} {:>12} {:>12}\n", date, "-", "-", "-"));
            continue;
        }
        for (currency, quote) in rates {
            out.push_str(&format!(
                "{:<12} {:<8} {:>12.4} {:>12.4}\n",
                date, currency, quote.sale, quote.purchase
            ));
        }
    }

    out
}
