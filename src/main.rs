//! docxmerge - Merge DOCX documents with font normalization

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use docxmerge::ui::{ConsoleNotifier, ConsolePicker, FilePicker, docx_args};
use docxmerge::{FontRule, combine};

#[derive(Parser)]
#[command(name = "docxmerge")]
#[command(version, about = "Merge DOCX documents with font normalization", long_about = None)]
#[command(after_help = "EXAMPLES:
    docxmerge a.docx b.docx                     Merge onto CT_TEMPLATE.docx
    docxmerge -t base.docx -o out.docx *.docx   Explicit template and output
    docxmerge                                   Pick files interactively")]
struct Cli {
    /// Input DOCX files, merged in the given order
    #[arg(value_name = "FILES")]
    files: Vec<String>,

    /// Base template document
    #[arg(short, long, value_name = "PATH", default_value = "CT_TEMPLATE.docx")]
    template: PathBuf,

    /// Output path (defaults to combined.docx next to the first input)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Suppress informational output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut inputs = docx_args(cli.files.iter().cloned());
    if inputs.is_empty() {
        inputs = match ConsolePicker.pick_inputs() {
            Ok(paths) => paths,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        };
    }
    if inputs.is_empty() {
        eprintln!("No files selected. Nothing to do.");
        return ExitCode::SUCCESS;
    }

    let output = cli.output.unwrap_or_else(|| {
        inputs[0]
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join("combined.docx")
    });

    let notifier = ConsoleNotifier::new(cli.quiet);
    match combine(&cli.template, &inputs, &output, &FontRule::default(), &notifier) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
