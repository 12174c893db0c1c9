use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use tidyform_core::formatter;
use tidyform_core::syntax::SyntaxError;

mod files;

const STDIN_TARGET: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "tidyform")]
#[command(version, about = "Rewrite HCL configuration files to a canonical format", long_about = None)]
struct Cli {
    /// Files or directories to format, or `-` to read from stdin
    #[arg(default_value = ".")]
    targets: Vec<PathBuf>,

    /// Don't list files whose formatting differs
    #[arg(long)]
    no_list: bool,

    /// Don't write to source files
    #[arg(long)]
    no_write: bool,

    /// Check if the input is formatted; exit status is non-zero if it isn't
    #[arg(long, short)]
    check: bool,

    /// Display diffs of formatting changes
    #[arg(long)]
    diff: bool,

    /// Also process files in subdirectories
    #[arg(long, short)]
    recursive: bool,
}

impl Cli {
    fn list(&self) -> bool {
        self.check || !self.no_list
    }

    fn write(&self) -> bool {
        !self.check && !self.no_write
    }
}

/// What happened to one input
#[derive(Debug, PartialEq, Eq)]
enum FileStatus {
    Unchanged,
    Changed,
    Invalid,
}

#[derive(Debug, Default)]
struct Summary {
    changed: usize,
    invalid: usize,
}

impl Summary {
    fn record(&mut self, status: FileStatus) {
        match status {
            FileStatus::Unchanged => {}
            FileStatus::Changed => self.changed += 1,
            FileStatus::Invalid => self.invalid += 1,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut summary = Summary::default();

    for target in &cli.targets {
        if target.as_os_str() == STDIN_TARGET {
            summary.record(run_stdin(cli)?);
            continue;
        }

        let files = files::collect(target, cli.recursive)?;
        if files.is_empty() {
            log::info!("no configuration files in {}", target.display());
        }
        for file in &files {
            summary.record(run_file(file, cli)?);
        }
    }

    if summary.invalid > 0 {
        bail!("{} file(s) could not be parsed", summary.invalid);
    }
    if cli.check && summary.changed > 0 {
        bail!("{} file(s) are not properly formatted", summary.changed);
    }
    Ok(())
}

fn run_stdin(cli: &Cli) -> Result<FileStatus> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("Failed to read from stdin")?;

    let outcome = match formatter::format_checked(&source, "<stdin>") {
        Ok(outcome) => outcome,
        Err(e) => {
            report_syntax_error("<stdin>", &e);
            return Ok(FileStatus::Invalid);
        }
    };

    if cli.diff {
        if outcome.changed {
            print_diff("<stdin>", &source, &outcome.formatted);
        }
    } else if !cli.check {
        print!("{}", outcome.formatted);
    }

    Ok(status(outcome.changed))
}

fn run_file(path: &Path, cli: &Cli) -> Result<FileStatus> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let display = path.display().to_string();

    let outcome = match formatter::format_checked(&source, &display) {
        Ok(outcome) => outcome,
        Err(e) => {
            report_syntax_error(&display, &e);
            return Ok(FileStatus::Invalid);
        }
    };

    if outcome.changed {
        if cli.list() {
            println!("{}", display);
        }
        if cli.write() {
            fs::write(path, &outcome.formatted)
                .with_context(|| format!("Failed to write {}", display))?;
            log::debug!("wrote {}", display);
        }
        if cli.diff {
            print_diff(&display, &source, &outcome.formatted);
        }
    }

    Ok(status(outcome.changed))
}

fn status(changed: bool) -> FileStatus {
    if changed {
        FileStatus::Changed
    } else {
        FileStatus::Unchanged
    }
}

fn report_syntax_error(name: &str, err: &SyntaxError) {
    eprintln!("{} {}: {}", "Error:".red().bold(), name, err);
}

fn print_diff(name: &str, original: &str, formatted: &str) {
    println!("{}", format!("--- old/{}", name).red());
    println!("{}", format!("+++ new/{}", name).green());

    let diff = TextDiff::from_lines(original, formatted);
    let unified = diff.unified_diff();
    for hunk in unified.iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-".red(),
                ChangeTag::Insert => "+".green(),
                ChangeTag::Equal => " ".normal(),
            };
            print!("{}{}", sign, change);
            if change.missing_newline() {
                println!();
            }
        }
    }
}
