mod display;
mod prompt;
mod shell;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fcf::{
    CliOverrides, EntryTypeFilter, FinderConfig, NavigationHandoff, SearchCoordinator,
    SearchOutcome,
};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::display::Summary;
use crate::prompt::{parse_selection, MenuChoice, Prompter, Selection};
use crate::shell::Shell;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Find a file or folder, then cd to it",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Name or glob pattern to find (e.g. "*.log", config, src); omit for interactive mode
    pattern: Option<String>,

    /// Directory to search in
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Case-insensitive pattern matching
    #[arg(short = 'i', long = "ignore-case")]
    ignore_case: bool,

    /// Only report files (f) or directories (d)
    #[arg(short = 't', long = "type", value_name = "f|d")]
    entry_type: Option<EntryTypeFilter>,

    /// Display file sizes
    #[arg(long)]
    show_size: bool,

    /// Maximum results to display (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_display: Option<usize>,

    /// Always use the built-in directory walk, even when fd is installed
    #[arg(long)]
    no_delegate: bool,

    /// Configuration file layered over the default locations
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            case_insensitive: self.ignore_case,
            entry_type: self.entry_type,
            max_display: self.max_display,
            show_size: self.show_size,
            no_delegate: self.no_delegate,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the shell function that lets fcf change your working directory
    Init {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "ERROR:".red(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Init { shell }) = cli.command {
        print!("{}", shell::wrapper(shell));
        return Ok(());
    }

    let config = FinderConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(cli.overrides());
    init_logging(&config.log_level);
    display::init_colors();

    let handoff = NavigationHandoff::for_current_user();
    if handoff.cleanup_stale_marker() {
        debug!("Cleared marker left by a previous run");
    }

    let mut session = Session {
        coordinator: SearchCoordinator::new(&config),
        config,
        handoff,
        prompter: Prompter::new(io::stdin().lock()),
    };

    match cli.pattern {
        Some(pattern) => session.run_single(&pattern, &cli.path),
        None => session.run_interactive(),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Results go to stdout; logs must not interleave with them
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Outcome of one interactive question
enum Answer<T> {
    Value(T),
    Retry,
    Eof,
}

struct Session<R> {
    config: FinderConfig,
    coordinator: SearchCoordinator,
    handoff: NavigationHandoff,
    prompter: Prompter<R>,
}

impl<R: BufRead> Session<R> {
    fn run_single(&mut self, pattern: &str, root: &Path) -> Result<()> {
        display::show_header();
        let outcome = self.search(pattern, root)?;
        if !outcome.is_empty() {
            self.select_and_navigate(&outcome)?;
        }
        Ok(())
    }

    fn run_interactive(&mut self) -> Result<()> {
        let mut root: Option<PathBuf> = None;

        loop {
            display::show_header();

            let search_root = match root.take() {
                Some(path) => path,
                None => match self.ask_path()? {
                    Answer::Value(path) => path,
                    Answer::Retry => continue,
                    Answer::Eof => return Ok(()),
                },
            };

            display::show_header();
            let pattern = match self.ask_pattern()? {
                Answer::Value(pattern) => pattern,
                Answer::Retry => {
                    root = Some(search_root);
                    continue;
                }
                Answer::Eof => return Ok(()),
            };

            display::show_header();
            match self.search(&pattern, &search_root) {
                Ok(outcome) if !outcome.is_empty() => self.select_and_navigate(&outcome)?,
                Ok(_) => {}
                Err(e) => display::show_error(e),
            }

            match self.options_menu()? {
                MenuChoice::FindAgain => root = None,
                MenuChoice::Repeat => root = Some(search_root),
                MenuChoice::Exit => {
                    println!("{}", "Goodbye!".green());
                    return Ok(());
                }
            }
        }
    }

    /// Runs one search, streaming results and printing the summary
    fn search(&self, pattern: &str, root: &Path) -> Result<SearchOutcome> {
        let request = self.config.request(pattern, root);
        let shown_root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        display::show_search_info(&shown_root, pattern, self.coordinator.backend());

        let show_size = self.config.show_size;
        let started = Instant::now();
        let outcome = self
            .coordinator
            .execute(&request, |m| display::show_result(&m.path, m.sequence, show_size))?;

        display::show_summary(&Summary {
            pattern,
            count: outcome.len(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            stopped: outcome.stopped,
            max_display: request.max_display,
        });
        Ok(outcome)
    }

    /// Step 3: pick a result or type a path, then hand it to the shell
    fn select_and_navigate(&mut self, outcome: &SearchOutcome) -> Result<()> {
        println!();
        println!("{} Enter path to navigate to", "Step 3:".bold());
        println!(
            "{}",
            "(Enter a number from results, full path, or press Enter to skip)".dimmed()
        );
        println!();

        let Some(input) = self.prompter.ask("Navigate to: ")? else {
            return Ok(());
        };

        match parse_selection(&input, outcome, dirs::home_dir().as_deref()) {
            Selection::Skip => println!("{}", "Skipped navigation".dimmed()),
            Selection::InvalidNumber => display::show_error("Invalid result number"),
            Selection::Result(path) | Selection::Path(path) => {
                println!();
                self.navigate(&path);
            }
        }
        Ok(())
    }

    fn navigate(&self, target: &Path) {
        if let Some(user) = &self.handoff.owner().sudo_user {
            display::show_sudo_note(user);
        }
        match self.handoff.publish(target) {
            Ok(dir) => display::show_navigation(&dir),
            Err(e) => display::show_error(e),
        }
    }

    /// Step 1
    fn ask_path(&mut self) -> Result<Answer<PathBuf>> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        println!("{} Enter path to search", "Step 1:".bold());
        println!(
            "{}",
            format!("(Press Enter for current directory: {})", cwd.display()).dimmed()
        );
        println!();

        let Some(input) = self.prompter.ask("Path: ")? else {
            return Ok(Answer::Eof);
        };
        if input.is_empty() {
            println!("{}", "Using current directory".green());
            return Ok(Answer::Value(PathBuf::from(".")));
        }

        let path = prompt::expand_tilde(&input, dirs::home_dir().as_deref());
        if !path.is_dir() {
            display::show_error(format!(
                "Directory '{}' does not exist or is not a directory",
                path.display()
            ));
            return self.pause();
        }

        println!();
        Ok(Answer::Value(path))
    }

    /// Step 2
    fn ask_pattern(&mut self) -> Result<Answer<String>> {
        println!("{} Enter file/folder name or pattern to find", "Step 2:".bold());
        println!("{}", "Examples: *.log, config, .env, src, *.js".dimmed());
        println!();

        let Some(pattern) = self.prompter.ask("Pattern: ")? else {
            return Ok(Answer::Eof);
        };
        if pattern.is_empty() {
            display::show_error("Pattern cannot be empty");
            return self.pause();
        }

        println!();
        Ok(Answer::Value(pattern))
    }

    fn pause<T>(&mut self) -> Result<Answer<T>> {
        Ok(match self.prompter.ask("Press Enter to try again...")? {
            Some(_) => Answer::Retry,
            None => Answer::Eof,
        })
    }

    fn options_menu(&mut self) -> Result<MenuChoice> {
        println!();
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bold());
        println!("{}", "Options:".bold());
        println!("  {} Find again (new search)", "[f]".cyan());
        println!("  {} Repeat search (same path)", "[r]".cyan());
        println!("  {} Exit", "[n]".cyan());
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bold());
        println!();

        Ok(self
            .prompter
            .ask("Choose: ")?
            .map(|choice| MenuChoice::parse(&choice))
            .unwrap_or(MenuChoice::Exit))
    }
}
