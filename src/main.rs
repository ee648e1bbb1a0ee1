//! rnm lists the symbols in ELF object files, nm style.
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod dump;
mod elf;
mod list;
mod window;
mod writer;

use dump::{DumpError, Options, dump_file};
use window::WindowError;

#[derive(Parser)]
#[command(version, about = "List symbols in ELF object files")]
struct Cli {
    /// Also list symbols in debug-only sections
    #[arg(short = 'a')]
    debug_syms: bool,

    /// List external symbols only
    #[arg(short = 'g')]
    extern_only: bool,

    /// List undefined symbols only
    #[arg(short = 'u')]
    undefined_only: bool,

    /// Don't sort, keep symbol-table order
    #[arg(short = 'p')]
    no_sort: bool,

    /// Reverse the sense of the sort
    #[arg(short = 'r')]
    reverse: bool,

    /// Object files to list, "a.out" if none are named
    files: Vec<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// One diagnostic per failed target, matching nm's message shapes. Structural
/// errors, including windows past the end of a truncated file, all collapse
/// into the bad-format message.
fn report(path: &PathBuf, err: &DumpError) {
    let path = path.display();
    let line = if err.is_format() {
        format!("rnm: {path}: file format not recognized")
    } else {
        match err {
            DumpError::File(WindowError::NotFound) => format!("rnm: '{path}': No such file"),
            DumpError::File(WindowError::PermissionDenied) => {
                format!("rnm: {path}: Permission denied")
            }
            DumpError::File(WindowError::IsDirectory) => {
                format!("rnm: Warning: '{path}' is a directory")
            }
            other => format!("rnm: {path}: {other}"),
        }
    };
    eprintln!("{line}");
}

/// Run every target in order, writing symbol blocks to `out` and diagnostics
/// to stderr. With more than one target each block gets a `<path>:` header.
/// One target's failure never stops the rest; a fatal error does. Returns
/// true when any target failed.
fn run_batch(files: &[PathBuf], opts: Options, out: &mut impl Write) -> bool {
    let many = files.len() > 1;
    let mut failed = false;
    for (i, path) in files.iter().enumerate() {
        if many {
            let header = if i == 0 {
                format!("{}:\n", path.display())
            } else {
                format!("\n{}:\n", path.display())
            };
            if out.write_all(header.as_bytes()).is_err() {
                return true;
            }
        }
        if let Err(err) = dump_file(path, opts, out) {
            report(path, &err);
            failed = true;
            if err.is_fatal() {
                break;
            }
        }
    }
    failed
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let opts = Options {
        debug_sections: cli.debug_syms,
        extern_only: cli.extern_only,
        undefined_only: cli.undefined_only,
        no_sort: cli.no_sort,
        reverse: cli.reverse,
    };
    let files = if cli.files.is_empty() {
        vec![PathBuf::from("a.out")]
    } else {
        cli.files
    };

    let mut stdout = std::io::stdout().lock();
    if run_batch(&files, opts, &mut stdout) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
