//! User-facing console output for the CLI.
//!
//! Everything here writes to stdout; logs and errors go to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::corpus::CorpusStats;

fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}

fn print_colored(stdout: &mut StandardStream, text: &str, color: Color, bold: bool) {
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = write!(stdout, "{}", text);
    let _ = stdout.reset();
}

/// Prints one path per line.
pub fn print_paths(paths: &[PathBuf]) {
    let mut stdout = stdout();
    for path in paths {
        let _ = writeln!(stdout, "{}", path.display());
    }
}

pub fn print_stats(documents: usize, stats: &CorpusStats) {
    let mut stdout = stdout();
    print_colored(&mut stdout, "ok", Color::Green, true);
    let _ = writeln!(
        stdout,
        ": {} documents, {} units, {} runnable, {} placeholders",
        documents, stats.units, stats.runnable, stats.placeholders
    );
    if stats.only > 0 {
        print_colored(&mut stdout, "note", Color::Yellow, true);
        let _ = writeln!(
            stdout,
            ": {} tests marked 'only'; all others will be skipped",
            stats.only
        );
    }
    if stats.skip > 0 {
        let _ = writeln!(stdout, "{} tests marked 'skip'", stats.skip);
    }
}

pub fn print_resolved(file_name: &str, path: Option<&Path>, searched: &[&Path]) {
    let mut stdout = stdout();
    match path {
        Some(path) => {
            let _ = writeln!(stdout, "{}", path.display());
        }
        None => {
            print_colored(&mut stdout, "not found", Color::Red, true);
            let _ = writeln!(stdout, ": {}", file_name);
            for dir in searched {
                let _ = writeln!(stdout, "  searched {}", dir.display());
            }
        }
    }
}

pub fn print_synced(root: &Path) {
    let mut stdout = stdout();
    print_colored(&mut stdout, "synced", Color::Green, true);
    let _ = writeln!(stdout, ": {}", root.display());
}
