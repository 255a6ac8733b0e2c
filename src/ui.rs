//! File acquisition and user-facing reporting.
//!
//! Both collaborators are explicit values passed to the caller, never
//! ambient state. The console implementations are the default channel; a
//! GUI front end would supply its own.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use log::debug;

/// Filter raw process arguments down to existing `.docx` files.
pub fn docx_args<I>(args: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(PathBuf::from)
        .filter(|path| {
            let keep = has_docx_extension(path) && path.exists();
            if !keep {
                debug!("ignoring argument {}", path.display());
            }
            keep
        })
        .collect()
}

fn has_docx_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}

/// Resolves input documents interactively when none were supplied.
pub trait FilePicker {
    fn pick_inputs(&mut self) -> io::Result<Vec<PathBuf>>;
}

/// Reads one path per line from standard input until an empty line.
pub struct ConsolePicker;

impl FilePicker for ConsolePicker {
    fn pick_inputs(&mut self) -> io::Result<Vec<PathBuf>> {
        let stdin = io::stdin();
        let mut out = io::stdout();
        writeln!(
            out,
            "Enter the DOCX files to combine, one per line (empty line to finish):"
        )?;
        out.flush()?;

        let mut picked = Vec::new();
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            let path = PathBuf::from(line);
            if has_docx_extension(&path) && path.exists() {
                picked.push(path);
            } else {
                writeln!(out, "Not a readable .docx file: {line}")?;
            }
        }
        Ok(picked)
    }
}

/// User-facing reporting channel for the combiner.
pub trait Notifier {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Reports to stdout/stderr; informational messages can be silenced.
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        ConsoleNotifier { quiet }
    }
}

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}
