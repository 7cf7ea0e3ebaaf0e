//! Handles all user-facing output for the CLI.
//!
//! Tree dumps, slot tables and diffs go to stdout; status lines, progress and
//! reports go to stderr. Both streams honor the configured color choice.

use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::schema::{Production, ValidationReport};

// ============================================================================
// OUTPUT SINK
// ============================================================================

pub struct Output {
    stdout: StandardStream,
    stderr: StandardStream,
    verbose: bool,
}

impl Output {
    pub fn new(choice: ColorChoice, verbose: bool) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
            stderr: StandardStream::stderr(choice),
            verbose,
        }
    }

    pub fn stderr(&mut self) -> &mut StandardStream {
        &mut self.stderr
    }

    /// Writes plain text to stdout.
    pub fn print(&mut self, text: &str) {
        let _ = write!(self.stdout, "{text}");
        if !text.ends_with('\n') {
            let _ = writeln!(self.stdout);
        }
    }

    /// A cargo-style status line: bold colored label, then the message.
    pub fn status(&mut self, label: &str, color: Color, message: &str) {
        let _ = self
            .stderr
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(self.stderr, "{label:>12}");
        let _ = self.stderr.reset();
        let _ = writeln!(self.stderr, " {message}");
    }

    /// Status line shown only with `--verbose`.
    pub fn progress(&mut self, label: &str, message: &str) {
        if self.verbose {
            self.status(label, Color::Cyan, message);
        }
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    pub fn print_report(&mut self, name: &str, report: &ValidationReport) {
        let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        self.print_section(&errors, Color::Red, "❌", "SCHEMA ERRORS");
        self.print_section(&report.warnings, Color::Yellow, "⚠️ ", "SCHEMA WARNINGS");
        self.print_section(&report.suggestions, Color::Blue, "💡", "SCHEMA SUGGESTIONS");

        if report.is_valid() {
            self.status("Checked", Color::Green, &format!("{name}: schema is valid"));
        } else {
            let count = report.errors.len();
            let noun = if count == 1 { "error" } else { "errors" };
            self.status("Failed", Color::Red, &format!("{name}: {count} {noun}"));
        }
    }

    fn print_section(&mut self, items: &[String], color: Color, emoji: &str, title: &str) {
        if items.is_empty() {
            return;
        }

        let _ = self
            .stderr
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = writeln!(self.stderr, "{emoji} {title}:");
        let _ = self.stderr.reset();
        for item in items {
            let _ = writeln!(self.stderr, "  • {item}");
        }
        let _ = writeln!(self.stderr);
    }

    /// One production's slots with the accessor name each one binds to.
    pub fn print_slots(&mut self, production: &Production) {
        let _ = self.stdout.set_color(ColorSpec::new().set_bold(true));
        let _ = write!(self.stdout, "{}", production.name());
        let _ = self.stdout.reset();
        if production.is_token() {
            let _ = writeln!(self.stdout, " (token)");
            return;
        }
        let _ = writeln!(self.stdout);

        let width = production
            .slots()
            .iter()
            .map(|s| s.kind.as_str().len() + 1)
            .max()
            .unwrap_or(0);
        for slot in production.slots() {
            let declared = format!("{}{}", slot.kind, slot.cardinality.suffix());
            let _ = writeln!(self.stdout, "  {declared:<width$}  {}()", slot.accessor_name());
        }
    }

    // ------------------------------------------------------------------------
    // Diffs
    // ------------------------------------------------------------------------

    /// Prints a line diff of `old` and `new`; returns whether they differ.
    pub fn print_changes(&mut self, old: &str, new: &str) -> bool {
        let changeset = Changeset::new(old, new, "\n");
        let changed = changeset.distance > 0;
        print_diff(&mut self.stdout, &changeset.diffs);
        changed
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.split('\n') {
                    let _ = writeln!(stdout, " {line}");
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.split('\n') {
                    let _ = writeln!(stdout, "+{line}");
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.split('\n') {
                    let _ = writeln!(stdout, "-{line}");
                }
            }
        }
    }
    let _ = stdout.reset();
}
