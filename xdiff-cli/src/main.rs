//! Command line front end for the xdiff XML differencing engine.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use clap::Parser as ClapParser;
use xdiff::{compare, Encoder, Parser, PlainTextEncoder, Tree};

/// Minimum-cost edit scripts between XML documents or directory trees.
#[derive(ClapParser)]
#[command(name = "xdiff")]
#[command(version)]
#[command(about = "Computes the difference between two XML sources", long_about = None)]
struct Cli {
    /// Original source for comparison, a file or a directory
    #[arg(long, value_name = "PATH")]
    left: PathBuf,

    /// Edited source for comparison, a file or a directory
    #[arg(long, value_name = "PATH")]
    right: PathBuf,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    match run(&cli.left, &cli.right) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(left_path: &Path, right_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // The two sources are independent; parse them on separate threads.
    eprintln!("Parsing left: {}", left_path.display());
    eprintln!("Parsing right: {}", right_path.display());
    let (left, right) = thread::scope(|scope| {
        let left = scope.spawn(|| parse_source(left_path));
        let right = scope.spawn(|| parse_source(right_path));
        (left.join(), right.join())
    });
    let mut left = left.map_err(|_| "left parser thread panicked")??;
    let mut right = right.map_err(|_| "right parser thread panicked")??;

    eprintln!("Comparing...");
    let deltas = compare(&mut left, &mut right)?;

    let stdout = io::stdout().lock();
    let mut encoder = PlainTextEncoder::new(stdout);
    encoder.encode(&left, &right, &deltas)?;
    eprintln!("Comparison complete.");
    Ok(())
}

/// Parses a file or a whole directory, depending on what the path points at.
fn parse_source(path: &Path) -> xdiff::Result<Tree> {
    let parser = Parser::new();
    if std::fs::metadata(path)?.is_dir() {
        parser.parse_dir(path)
    } else {
        parser.parse_file(path)
    }
}
