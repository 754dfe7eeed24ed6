use once_cell::sync::OnceCell;
use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, warn};

use super::cancel::CancellationSignal;
use super::engine::{drive, MatchProducer, Step};
use crate::config::SearchRequest;
use crate::errors::{FinderError, FinderResult};
use crate::metrics::SearchMetrics;
use crate::results::{BackendKind, MatchRecord, SearchOutcome};

/// Executable names of the delegate, in order of preference.
/// Debian and Ubuntu ship `fd` as `fdfind`.
const DELEGATE_NAMES: &[&str] = &["fd", "fdfind"];

static DISCOVERED: OnceCell<Option<Delegate>> = OnceCell::new();

/// An installed fast search tool that can run a search on our behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegate {
    program: PathBuf,
}

impl Delegate {
    /// Looks the delegate up on `PATH`. The lookup runs once per process.
    pub fn discover() -> Option<Delegate> {
        DISCOVERED
            .get_or_init(|| {
                let found = env::var_os("PATH").and_then(|path| Self::find_in(&path));
                match &found {
                    Some(d) => debug!("Found delegate search tool at {}", d.program.display()),
                    None => debug!("No delegate search tool on PATH, using directory walk"),
                }
                found
            })
            .clone()
    }

    /// Searches a `PATH`-style list of directories for the delegate
    pub fn find_in(search_path: &OsStr) -> Option<Delegate> {
        let dirs: Vec<PathBuf> = env::split_paths(search_path).collect();
        DELEGATE_NAMES.iter().find_map(|name| {
            let file_name = format!("{}{}", name, env::consts::EXE_SUFFIX);
            dirs.iter()
                .map(|dir| dir.join(&file_name))
                .find(|candidate| is_executable(candidate))
                .map(Delegate::from_program)
        })
    }

    /// Uses a specific executable as the delegate
    pub fn from_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for a search under `request.root_path`
    pub fn args(&self, request: &SearchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["--color", "never", "--hidden", "--no-ignore"]
            .iter()
            .map(OsString::from)
            .collect();

        if let Some(kind) = request.entry_type.delegate_type() {
            args.push("-t".into());
            args.push(kind.into());
        }

        let case_flag = if request.case_insensitive { "-i" } else { "-s" };
        args.push(case_flag.into());

        // A pattern such as "-foo" must not be read as an option
        args.push("-g".into());
        args.push("--".into());
        args.push(request.pattern.clone().into());
        args.push(request.root_path.clone().into_os_string());
        args
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Runs the search through the delegate as a child process
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    delegate: Delegate,
    metrics: SearchMetrics,
}

impl ProcessBackend {
    pub fn new(delegate: Delegate) -> Self {
        Self::with_metrics(delegate, SearchMetrics::new())
    }

    pub fn with_metrics(delegate: Delegate, metrics: SearchMetrics) -> Self {
        Self { delegate, metrics }
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// Starts the delegate. A spawn failure is `BackendUnavailable`.
    pub fn spawn(&self, request: &SearchRequest) -> FinderResult<ProcessProducer> {
        let program = self.delegate.program();
        let args = self.delegate.args(request);
        debug!("Spawning {} {:?}", program.display(), args);

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FinderError::backend_unavailable(program, e))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FinderError::backend_unavailable(
                    program,
                    std::io::Error::new(ErrorKind::BrokenPipe, "child stdout was not captured"),
                ));
            }
        };

        Ok(ProcessProducer {
            child,
            reader: BufReader::new(stdout),
            line: Vec::with_capacity(256),
            program: program.to_path_buf(),
            metrics: self.metrics.clone(),
            reaped: false,
        })
    }

    /// Runs the delegate, calling `on_match` for every match inside the display cap
    pub fn run<F>(
        &self,
        request: &SearchRequest,
        on_match: F,
        cancel: &CancellationSignal,
    ) -> FinderResult<SearchOutcome>
    where
        F: FnMut(&MatchRecord),
    {
        let mut producer = self.spawn(request)?;
        drive(&mut producer, request, cancel, on_match)
    }
}

/// Reads the delegate's output one path per line.
///
/// The child is always reaped: on completion, on cancellation (after a kill),
/// or on drop.
pub struct ProcessProducer {
    child: Child,
    reader: BufReader<ChildStdout>,
    line: Vec<u8>,
    program: PathBuf,
    metrics: SearchMetrics,
    reaped: bool,
}

impl ProcessProducer {
    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.child.kill() {
            debug!("Delegate already exited before kill: {}", e);
        }
        let _ = self.child.wait();
        self.reaped = true;
    }

    fn finish(&mut self) {
        if self.reaped {
            return;
        }
        match self.child.wait() {
            Ok(status) if !status.success() => {
                warn!("{} exited with {}", self.program.display(), status)
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to wait for {}: {}", self.program.display(), e),
        }
        self.reaped = true;
    }
}

impl MatchProducer for ProcessProducer {
    fn kind(&self) -> BackendKind {
        BackendKind::Delegate
    }

    fn next_match(&mut self, cancel: &CancellationSignal) -> FinderResult<Step> {
        loop {
            if cancel.is_tripped() {
                self.terminate();
                return Ok(Step::Cancelled);
            }

            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.finish();
                    return Ok(Step::Done);
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Failed to read output of {}: {}", self.program.display(), e);
                    self.terminate();
                    return Ok(Step::Done);
                }
            }

            while matches!(self.line.last(), Some(b'\n' | b'\r')) {
                self.line.pop();
            }
            if self.line.is_empty() {
                continue;
            }

            let text = String::from_utf8_lossy(&self.line);
            let lossy = matches!(text, std::borrow::Cow::Owned(_));
            if lossy {
                warn!("Invalid UTF-8 replaced in delegate output: {}", text);
            }
            self.metrics.record_line(lossy);
            self.metrics.record_match();
            return Ok(Step::Match(PathBuf::from(text.into_owned())));
        }
    }
}

impl Drop for ProcessProducer {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::EntryTypeFilter;

    fn args_as_strings(delegate: &Delegate, request: &SearchRequest) -> Vec<String> {
        delegate
            .args(request)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_args_default() {
        let delegate = Delegate::from_program("fd");
        let request = SearchRequest::new("*.log", "/var/log");
        assert_eq!(
            args_as_strings(&delegate, &request),
            vec!["--color", "never", "--hidden", "--no-ignore", "-s", "-g", "--", "*.log", "/var/log"]
        );
    }

    #[test]
    fn test_args_with_filters() {
        let delegate = Delegate::from_program("fd");
        let request = SearchRequest::new("src", "/repo")
            .case_insensitive(true)
            .entry_type(EntryTypeFilter::DirOnly);
        assert_eq!(
            args_as_strings(&delegate, &request),
            vec![
                "--color",
                "never",
                "--hidden",
                "--no-ignore",
                "-t",
                "d",
                "-i",
                "-g",
                "--",
                "src",
                "/repo"
            ]
        );

        let request = SearchRequest::new("*.rs", "/repo").entry_type(EntryTypeFilter::FileOnly);
        let args = args_as_strings(&delegate, &request);
        assert!(args.windows(2).any(|w| w == ["-t", "f"]));
    }

    #[test]
    fn test_args_leading_dash_pattern_is_positional() {
        let delegate = Delegate::from_program("fd");
        let request = SearchRequest::new("-draft*", "/notes");
        let args = args_as_strings(&delegate, &request);
        assert_eq!(&args[args.len() - 3..], ["--", "-draft*", "/notes"]);
    }

    #[test]
    fn test_find_in_empty_path() {
        assert_eq!(Delegate::find_in(OsStr::new("")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_prefers_fd_over_fdfind() {
        use std::os::unix::fs::PermissionsExt;

        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for (dir, name) in [(&first, "fdfind"), (&second, "fd")] {
            let path = dir.path().join(name);
            std::fs::write(&path, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let search_path = env::join_paths([first.path(), second.path()]).unwrap();
        let found = Delegate::find_in(&search_path).unwrap();
        assert_eq!(found.program(), second.path().join("fd"));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_skips_non_executables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fd"), "not a program").unwrap();
        assert_eq!(Delegate::find_in(dir.path().as_os_str()), None);
    }

    #[test]
    fn test_spawn_failure_is_backend_unavailable() {
        let backend = ProcessBackend::new(Delegate::from_program("/definitely/not/a/real/fd"));
        let result = backend.run(
            &SearchRequest::new("*", "."),
            |_| {},
            &CancellationSignal::new(),
        );
        assert!(matches!(result, Err(FinderError::BackendUnavailable { .. })));
    }
}
