//! Rendering of audit results for console and machine consumers
//!
//! The core never prints; callers pick a renderer and decide where the
//! output goes.

use crate::audit::Diff;
use crate::error::Result;
use crate::types::Record;
use std::fmt::Write;

/// Render a diff as a plain-text report
pub fn render_text(diff: &Diff) -> String {
    let mut out = String::new();
    let counts = diff.counts();

    let _ = writeln!(out, "=== Cross-view audit: {} ===", diff.view);
    let status = if diff.is_clean() {
        "OK (view matches ground truth)".to_string()
    } else {
        format!(
            "MISMATCH ({} hidden, {} substituted)",
            counts.hidden, counts.substituted
        )
    };
    let _ = writeln!(out, "Status: {}", status);
    let _ = writeln!(out);

    write_section(&mut out, "Ground truth:", &diff.truth);
    write_section(&mut out, "Visible (verbatim):", &diff.visible);
    write_section(&mut out, "Hidden (truth - visible):", &diff.hidden);

    let _ = writeln!(out, "Substituted:");
    if diff.substituted.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for sub in &diff.substituted {
        let _ = writeln!(out, "  {}", sub.id);
        let _ = writeln!(out, "    truth  : {}", sub.truth);
        let _ = writeln!(out, "    visible: {}", sub.visible);
    }

    out
}

fn write_section(out: &mut String, title: &str, records: &[Record]) {
    let _ = writeln!(out, "{}", title);
    if records.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for record in records {
        let _ = writeln!(out, "  {}", record);
    }
    let _ = writeln!(out);
}

/// Render a diff as pretty-printed JSON
pub fn render_json(diff: &Diff) -> Result<String> {
    Ok(serde_json::to_string_pretty(diff)?)
}
