use colored::Colorize;
use fcf::SearchOutcome;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Line-oriented questions on top of any buffered input
pub struct Prompter<R> {
    input: R,
}

impl<R: BufRead> Prompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Prints `prompt` and reads one trimmed line; `None` at end of input
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        print!("{}", prompt.cyan());
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            println!();
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// What the user asked for at the navigation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Skip,
    /// A result picked by its number
    Result(PathBuf),
    /// A path typed in directly
    Path(PathBuf),
    InvalidNumber,
}

/// Interprets navigation input against the results of the last search
pub fn parse_selection(input: &str, outcome: &SearchOutcome, home: Option<&Path>) -> Selection {
    let input = input.trim();
    if input.is_empty() {
        return Selection::Skip;
    }

    if let Ok(number) = input.parse::<i64>() {
        return usize::try_from(number)
            .ok()
            .and_then(|n| outcome.get(n))
            .map(|record| Selection::Result(record.path.clone()))
            .unwrap_or(Selection::InvalidNumber);
    }

    Selection::Path(expand_tilde(input, home))
}

/// Replaces a leading `~` with the home directory
pub fn expand_tilde(input: &str, home: Option<&Path>) -> PathBuf {
    match (input.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home.to_path_buf(),
        (Some(rest), Some(home)) if rest.starts_with('/') || rest.starts_with('\\') => {
            home.join(&rest[1..])
        }
        _ => PathBuf::from(input),
    }
}

/// Next move after a search in interactive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Back to step 1
    FindAgain,
    /// Back to step 2, keeping the path
    Repeat,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "f" => MenuChoice::FindAgain,
            "r" => MenuChoice::Repeat,
            _ => MenuChoice::Exit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcf::BackendKind;
    use std::io::Cursor;

    fn outcome_of(paths: &[&str]) -> SearchOutcome {
        let mut outcome = SearchOutcome::new(BackendKind::Walk);
        for path in paths {
            outcome.push(PathBuf::from(path));
        }
        outcome
    }

    #[test]
    fn test_parse_selection_by_number() {
        let outcome = outcome_of(&["/a/one", "/a/two"]);
        assert_eq!(
            parse_selection("2", &outcome, None),
            Selection::Result(PathBuf::from("/a/two"))
        );
        assert_eq!(parse_selection("0", &outcome, None), Selection::InvalidNumber);
        assert_eq!(parse_selection("3", &outcome, None), Selection::InvalidNumber);
        assert_eq!(parse_selection("-1", &outcome, None), Selection::InvalidNumber);
    }

    #[test]
    fn test_parse_selection_skip_and_path() {
        let outcome = outcome_of(&["/a/one"]);
        assert_eq!(parse_selection("  ", &outcome, None), Selection::Skip);
        assert_eq!(
            parse_selection("/etc", &outcome, None),
            Selection::Path(PathBuf::from("/etc"))
        );
        assert_eq!(
            parse_selection("~/src", &outcome, Some(Path::new("/home/u"))),
            Selection::Path(PathBuf::from("/home/u/src"))
        );
    }

    #[test]
    fn test_expand_tilde() {
        let home = Some(Path::new("/home/u"));
        assert_eq!(expand_tilde("~", home), PathBuf::from("/home/u"));
        assert_eq!(expand_tilde("~/a/b", home), PathBuf::from("/home/u/a/b"));
        assert_eq!(expand_tilde("~other", home), PathBuf::from("~other"));
        assert_eq!(expand_tilde("~/a", None), PathBuf::from("~/a"));
    }

    #[test]
    fn test_menu_choice() {
        assert_eq!(MenuChoice::parse("F"), MenuChoice::FindAgain);
        assert_eq!(MenuChoice::parse("r"), MenuChoice::Repeat);
        assert_eq!(MenuChoice::parse("n"), MenuChoice::Exit);
        assert_eq!(MenuChoice::parse(""), MenuChoice::Exit);
    }

    #[test]
    fn test_ask_reads_lines_until_eof() {
        let mut prompter = Prompter::new(Cursor::new("  first \nsecond"));
        assert_eq!(prompter.ask("> ").unwrap().as_deref(), Some("first"));
        assert_eq!(prompter.ask("> ").unwrap().as_deref(), Some("second"));
        assert_eq!(prompter.ask("> ").unwrap(), None);
    }
}
