//! Compact diagnostics for batch parsing.
//!
//! A directory parse can fail in many files at once, so instead of a full
//! miette report per file each failure gets a location line and a short
//! snippet with a caret under the offending span.

use std::io;

use termcolor::{Color, ColorSpec, WriteColor};
use unicode_width::UnicodeWidthStr;

use crate::errors::ParseError;
use crate::syntax::Span;

/// Lines of context shown before the error line.
const SNIPPET_CONTEXT_LINES: usize = 1;

// === Formatting Helpers ===

/// 1-based line and column (in chars) of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = floor_char_boundary(source, offset);
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let col = source[line_start..offset].chars().count() + 1;
    (line, col)
}

/// The error line with preceding context and a caret line under `span`.
pub fn render_snippet(source: &str, span: Span) -> String {
    let (line, _) = line_col(source, span.start);
    let lines: Vec<&str> = source.split('\n').collect();
    let first = line.saturating_sub(SNIPPET_CONTEXT_LINES).max(1);
    let gutter = line.to_string().len();

    let mut out = String::new();
    for number in first..=line {
        let text = lines.get(number - 1).copied().unwrap_or_default().trim_end_matches('\r');
        out.push_str(&format!("{number:>gutter$} | {text}\n"));
    }

    let line_text = lines.get(line - 1).copied().unwrap_or_default();
    let line_start = line_start_offset(source, line);
    let start = floor_char_boundary(source, span.start);
    let end = floor_char_boundary(source, span.end.max(span.start)).min(line_start + line_text.len());

    let pad = source[line_start..start].width();
    let marked = if end > start { source[start..end].width().max(1) } else { 1 };
    out.push_str(&format!(
        "{:gutter$} | {}{}\n",
        "",
        " ".repeat(pad),
        "^".repeat(marked)
    ));
    out
}

/// Writes `path:line:col: message`, the snippet and any help.
pub fn write_compact(writer: &mut impl WriteColor, path: &str, source: &str, error: &ParseError) -> io::Result<()> {
    let (line, col) = line_col(source, error.location.start);

    writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(writer, "error")?;
    writer.reset()?;
    writeln!(writer, ": {path}:{line}:{col}: {}", error.message)?;
    write!(writer, "{}", render_snippet(source, error.location))?;

    if let Some(help) = &error.help {
        writer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(writer, "help")?;
        writer.reset()?;
        writeln!(writer, ": {help}")?;
    }
    Ok(())
}

fn line_start_offset(source: &str, line: usize) -> usize {
    source
        .match_indices('\n')
        .nth(line.saturating_sub(2))
        .filter(|_| line > 1)
        .map_or(0, |(i, _)| i + 1)
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
