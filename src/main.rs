use clap::{Parser, Subcommand};
use section_sync::{count::LinesCounter, duplicates::DuplicatesChecker, sync::FileSynchronizer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
  name = "section-sync",
  about = "Check, de-duplicate and synchronize section-based translation files",
  version,
  author
)]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Verbose output (-v for verbose, -vv for very verbose)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,
}

#[derive(Subcommand)]
enum Command {
  /// Report duplicated sections and lines in a file
  Duplicates {
    /// Path to the translation file
    file: PathBuf,

    /// Write a de-duplicated copy to <FILE>.generated
    #[arg(short, long)]
    write: bool,
  },
  /// Compare a target file against a reference file
  Sync {
    /// Path to the reference file
    #[arg(short, long)]
    reference: PathBuf,

    /// Path to the target file
    #[arg(short, long)]
    target: PathBuf,

    /// Write a synchronized copy to <TARGET>.generated
    #[arg(short, long)]
    write: bool,
  },
  /// Count how many reference lines the target translates
  Count {
    /// Path to the reference file
    #[arg(short, long)]
    reference: PathBuf,

    /// Path to the target file
    #[arg(short, long)]
    target: PathBuf,
  },
}

fn setup_tracing(verbose: u8) {
  use tracing_subscriber::fmt;
  use tracing_subscriber::prelude::*;

  let log_level = match verbose {
    1 => "debug",
    2 => "trace",
    _ => "info",
  };

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
    ))
    .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  setup_tracing(cli.verbose);

  match cli.command {
    Command::Duplicates { file, write } => {
      let mut checker = DuplicatesChecker::new();
      print!("{}", checker.run_analyzer(&file)?);

      if write {
        match checker.remove_duplicates()? {
          Some(path) => println!("De-duplicated file written to {}", path.display()),
          None => println!("No duplicates, nothing to write."),
        }
      }
    }
    Command::Sync {
      reference,
      target,
      write,
    } => {
      let mut synchronizer = FileSynchronizer::new();
      print!("{}", synchronizer.run_analyzer(&reference, &target)?);

      if write {
        match synchronizer.synchronize_file()? {
          Some(path) => println!("Synchronized file written to {}", path.display()),
          None => println!("Files already in sync, nothing to write."),
        }
      }
    }
    Command::Count { reference, target } => {
      print!("{}", LinesCounter::new().run_analyzer(&reference, &target)?);
    }
  }

  Ok(())
}
