use colored::Colorize;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use fcf::BackendKind;
use std::fs::{self, Metadata};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Turns colors off when stdout is not a terminal
pub fn init_colors() {
    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
}

fn clear_screen() {
    let mut stdout = io::stdout();
    if stdout.is_terminal() {
        let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));
    }
}

pub fn show_header() {
    clear_screen();
    println!("{}", "╔════════════════════════════════════════╗".cyan().bold());
    println!(
        "{}   {} - Find File or Folder          {}",
        "║".cyan().bold(),
        "fcf".bold(),
        "║".cyan().bold()
    );
    println!("{}", "╚════════════════════════════════════════╝".cyan().bold());
    println!();
}

pub fn show_search_info(root: &Path, pattern: &str, backend: BackendKind) {
    println!("{}", RULE.bold());
    println!("{} {}", "Searching in:".blue(), root.display().to_string().cyan());
    println!("{} {}", "Pattern:".blue(), pattern.yellow());
    match backend {
        BackendKind::Delegate => println!("{} {}", "Method:".blue(), "fd (parallel search)".green()),
        BackendKind::Walk => println!(
            "{} {}",
            "Method:".blue(),
            "walk (sequential - install 'fd' for faster search)".yellow()
        ),
    }
    println!("{}", RULE.bold());
    println!();
    println!(
        "{} {}  {}",
        "Results:".bold(),
        "(streaming in real-time...)".dimmed(),
        "[press 's' to stop]".yellow()
    );
    println!();
}

/// What kind of entry a result is, for its marker and color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Symlink,
    Executable,
    File,
    Unknown,
}

impl EntryKind {
    /// Classifies an entry without following symlinks
    pub fn of(path: &Path) -> (Self, Option<Metadata>) {
        match fs::symlink_metadata(path) {
            Ok(meta) => {
                let kind = if meta.is_dir() {
                    EntryKind::Directory
                } else if meta.file_type().is_symlink() {
                    EntryKind::Symlink
                } else if is_executable(path, &meta) {
                    EntryKind::Executable
                } else {
                    EntryKind::File
                };
                (kind, Some(meta))
            }
            Err(_) => (EntryKind::Unknown, None),
        }
    }
}

#[cfg(unix)]
fn is_executable(_path: &Path, meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.is_file() && meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(path: &Path, meta: &Metadata) -> bool {
    const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "bat", "cmd", "com", "ps1"];
    meta.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXECUTABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Formats one result line: `[n]`, a kind marker, the path and optionally the size
pub fn format_result(path: &Path, sequence: usize, show_size: bool) -> String {
    let index = format!("  [{}]", sequence).cyan();
    let (kind, meta) = EntryKind::of(path);
    let shown = path.display();

    let size = match (&meta, kind) {
        (Some(meta), kind) if show_size && kind != EntryKind::Directory => {
            format!(" ({})", format_size(meta.len())).dimmed().to_string()
        }
        _ => String::new(),
    };

    match kind {
        EntryKind::Directory => format!(
            "{} {}{}",
            index,
            format!("📁 {}{}", shown, MAIN_SEPARATOR).blue(),
            size
        ),
        EntryKind::Symlink => format!("{} {}{}", index, format!("🔗 {}", shown).magenta(), size),
        EntryKind::Executable => format!("{} {}{}", index, format!("⚡ {}", shown).green(), size),
        EntryKind::File => format!("{} 📄 {}{}", index, shown, size),
        EntryKind::Unknown => format!("  [{}] {}", sequence, shown),
    }
}

pub fn show_result(path: &Path, sequence: usize, show_size: bool) {
    println!("{}", format_result(path, sequence, show_size));
}

/// Formats bytes as B, K, M or G with one decimal above a kilobyte
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.1}G", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1}M", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1}K", b as f64 / KB as f64),
        b => format!("{}B", b),
    }
}

/// Figures printed after a search
#[derive(Debug, Clone, PartialEq)]
pub struct Summary<'a> {
    pub pattern: &'a str,
    pub count: usize,
    pub elapsed_secs: f64,
    pub stopped: bool,
    pub max_display: usize,
}

pub fn show_summary(summary: &Summary<'_>) {
    println!();
    println!("{}", RULE.bold());

    if summary.count == 0 {
        if summary.stopped {
            println!("{}", "Search stopped before any match was found".yellow());
        } else {
            println!("{} for pattern: {}", "No matches found".yellow(), summary.pattern.cyan());
            println!();
            println!("{}", "Tips:".dimmed());
            println!("  - Try a different pattern");
            println!("  - Use {} for case-insensitive search", "-i".cyan());
        }
    } else {
        let status = if summary.stopped {
            format!(" {}", "(stopped by user)".yellow())
        } else {
            String::new()
        };
        println!(
            "{} in {}{}",
            format!("Found {} match(es)", summary.count).green().bold(),
            format!("{:.2}s", summary.elapsed_secs).cyan(),
            status
        );

        if summary.max_display > 0 && summary.count > summary.max_display {
            println!(
                "{}",
                format!(
                    "(Displayed first {} of {})",
                    summary.max_display, summary.count
                )
                .yellow()
            );
        }
    }
    println!("{}", RULE.bold());
}

pub fn show_error(message: impl std::fmt::Display) {
    println!("{} {}", "ERROR:".red(), message);
}

pub fn show_sudo_note(user: &str) {
    println!(
        "{} Running under sudo - navigation will apply to {}'s shell",
        "Note:".yellow(),
        user.cyan()
    );
    println!();
}

/// Confirms the navigation target and lists what is in it
pub fn show_navigation(dir: &Path) {
    println!("{} {}", "✓ Will navigate to:".green(), dir.display().to_string().cyan());
    println!();
    println!("{}", "Contents:".dimmed());
    match directory_listing(dir) {
        Ok(lines) => {
            for line in lines {
                println!("  {}", line);
            }
        }
        Err(_) => println!("  {}", "Could not read directory".red()),
    }
    println!();
}

/// One line per entry, sorted by name: directories end in `/`, files show their size
pub fn directory_listing(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries: Vec<(PathBuf, String)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| (entry.path(), entry.file_name().to_string_lossy().into_owned()))
        .collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1));

    Ok(entries
        .into_iter()
        .filter_map(|(path, name)| {
            let meta = fs::metadata(&path).ok()?;
            Some(if meta.is_dir() {
                format!("{}/", name).blue().to_string()
            } else {
                format!("{} {}", name, format!("({})", format_size(meta.len())).dimmed())
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(1023), "1023B");
        assert_eq!(format_size(1024), "1.0K");
        assert_eq!(format_size(1536), "1.5K");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0M");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 / 2), "1.5G");
    }

    #[test]
    fn test_format_result_markers() {
        plain();
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();

        let line = format_result(&file, 3, false);
        assert_eq!(line, format!("  [3] 📄 {}", file.display()));

        let line = format_result(&file, 3, true);
        assert!(line.ends_with(" (5B)"));

        let line = format_result(dir.path(), 1, true);
        assert!(line.contains("📁"));
        assert!(line.ends_with(MAIN_SEPARATOR));
    }

    #[test]
    fn test_format_result_missing_entry() {
        plain();
        let line = format_result(Path::new("/no/such/entry"), 7, true);
        assert_eq!(line, "  [7] /no/such/entry");
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_kind_executable_and_symlink() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&script, &link).unwrap();

        assert_eq!(EntryKind::of(&script).0, EntryKind::Executable);
        assert_eq!(EntryKind::of(&link).0, EntryKind::Symlink);
        assert_eq!(EntryKind::of(dir.path()).0, EntryKind::Directory);
    }

    #[test]
    fn test_directory_listing() {
        plain();
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::write(dir.path().join("alpha.txt"), "abc").unwrap();

        let lines = directory_listing(dir.path()).unwrap();
        assert_eq!(lines, vec!["alpha.txt (3B)".to_string(), "beta/".to_string()]);
        assert!(directory_listing(&dir.path().join("missing")).is_err());
    }
}
