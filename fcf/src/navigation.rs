/// Hands a chosen directory back to the invoking shell.
///
/// A child process cannot change its parent's working directory, so fcf
/// writes the target to a marker file in the temp directory. The shell
/// wrapper printed by `fcf init` reads the marker after fcf exits, deletes
/// it, and `cd`s there.
///
/// The marker name carries the uid of the user whose shell should move:
/// `<temp>/fcf_nav_path_<uid>` on Unix, `<temp>/fcf_nav_path` on Windows,
/// where the temp directory is already per-user.
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::{FinderError, FinderResult};

/// Prefix of the marker file name, shared with the shell wrapper
pub const MARKER_PREFIX: &str = "fcf_nav_path";

/// Programs that mean sudo opened a root shell rather than running fcf directly
const SHELL_PROGRAMS: &[&str] = &["su", "sh", "bash", "zsh", "fish", "dash", "ksh"];

/// The user whose shell wrapper will consume the marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokingUser {
    /// Unix uid the marker is scoped to; `None` on Windows
    pub uid: Option<u32>,
    /// Set when running as `sudo fcf` on behalf of another user
    pub sudo_user: Option<String>,
}

impl InvokingUser {
    /// Identifies the invoking user of this process
    #[cfg(unix)]
    pub fn detect() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail.
        let euid = unsafe { libc::geteuid() };
        Self::resolve(euid, |key| env::var(key).ok())
    }

    /// Identifies the invoking user of this process
    #[cfg(not(unix))]
    pub fn detect() -> Self {
        Self {
            uid: None,
            sudo_user: None,
        }
    }

    /// Resolves the marker owner from the effective uid and sudo's environment.
    ///
    /// Under `sudo fcf` the marker belongs to `SUDO_UID`. Under a root shell
    /// opened with sudo (`sudo su`, `sudo -s`, ...) root's own shell runs fcf,
    /// so the effective uid is kept.
    pub fn resolve<F>(euid: u32, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if euid == 0 {
            let sudo_user = var("SUDO_USER").filter(|name| !name.is_empty());
            let via_shell = var("SUDO_COMMAND").is_some_and(|cmd| launched_shell(&cmd));
            let sudo_uid = var("SUDO_UID").and_then(|uid| uid.trim().parse::<u32>().ok());

            if let (Some(name), Some(uid), false) = (sudo_user, sudo_uid, via_shell) {
                return Self {
                    uid: Some(uid),
                    sudo_user: Some(name),
                };
            }
        }
        Self {
            uid: Some(euid),
            sudo_user: None,
        }
    }

    pub fn marker_file_name(&self) -> String {
        match self.uid {
            Some(uid) => format!("{}_{}", MARKER_PREFIX, uid),
            None => MARKER_PREFIX.to_string(),
        }
    }
}

fn launched_shell(sudo_command: &str) -> bool {
    let program = sudo_command.split_whitespace().next().unwrap_or_default();
    Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SHELL_PROGRAMS.contains(&name))
}

/// Writes and cleans up the navigation marker
#[derive(Debug, Clone)]
pub struct NavigationHandoff {
    marker: PathBuf,
    owner: InvokingUser,
}

impl NavigationHandoff {
    /// Marker in the system temp directory for the invoking user
    pub fn for_current_user() -> Self {
        Self::new(env::temp_dir(), InvokingUser::detect())
    }

    /// Marker in `temp_dir` for `owner`
    pub fn new(temp_dir: impl AsRef<Path>, owner: InvokingUser) -> Self {
        Self {
            marker: temp_dir.as_ref().join(owner.marker_file_name()),
            owner,
        }
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    pub fn owner(&self) -> &InvokingUser {
        &self.owner
    }

    /// Removes a marker left by an earlier run. Returns true if one was removed.
    pub fn cleanup_stale_marker(&self) -> bool {
        match fs::remove_file(&self.marker) {
            Ok(()) => {
                debug!("Removed stale marker {}", self.marker.display());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Could not remove stale marker {}: {}", self.marker.display(), e);
                false
            }
        }
    }

    /// Resolves a selected path to the absolute directory to navigate to.
    ///
    /// A file resolves to its parent directory.
    pub fn resolve_target(target: &Path) -> FinderResult<PathBuf> {
        let metadata = fs::metadata(target)
            .map_err(|_| FinderError::navigation_target_invalid(target, "does not exist"))?;

        let dir = if metadata.is_dir() {
            target.to_path_buf()
        } else {
            match target.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            }
        };

        if !dir.is_dir() {
            return Err(FinderError::navigation_target_invalid(
                dir,
                "is not a valid directory",
            ));
        }

        Ok(std::path::absolute(&dir).unwrap_or(dir))
    }

    /// Writes the resolved directory as the whole marker content.
    ///
    /// Nothing is written when the target cannot be resolved.
    pub fn publish(&self, target: &Path) -> FinderResult<PathBuf> {
        let dir = Self::resolve_target(target)?;
        self.write_marker(&dir)?;
        debug!("Navigation target {} written to {}", dir.display(), self.marker.display());
        Ok(dir)
    }

    fn write_marker(&self, dir: &Path) -> io::Result<()> {
        let parent = match self.marker.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(dir.as_os_str().to_string_lossy().as_bytes())?;
        staged.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }

        staged.persist(&self.marker).map_err(|e| e.error)?;

        // The wrapper must be able to delete the marker from the sticky temp dir
        #[cfg(unix)]
        {
            if self.owner.sudo_user.is_some() {
                if let Err(e) = std::os::unix::fs::chown(&self.marker, self.owner.uid, None) {
                    warn!("Could not hand marker to invoking user: {}", e);
                }
            }
        }

        Ok(())
    }
}
