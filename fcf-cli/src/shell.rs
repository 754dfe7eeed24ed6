use clap::ValueEnum;
use fcf::navigation::MARKER_PREFIX;

/// Shells `fcf init` can print a wrapper for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// A wrapper function that runs fcf, then `cd`s to the directory it chose.
///
/// The marker path must agree with `NavigationHandoff`: the temp directory
/// (`$TMPDIR` falling back to `/tmp`) plus the uid on Unix, `$env:TEMP` on Windows.
pub fn wrapper(shell: Shell) -> String {
    match shell {
        Shell::Bash | Shell::Zsh => format!(
            r#"fcf() {{
    local nav_file="${{TMPDIR:-/tmp}}"
    nav_file="${{nav_file%/}}/{prefix}_$(id -u)"
    rm -f "$nav_file"
    command fcf "$@"
    local status=$?
    if [[ -f "$nav_file" ]]; then
        local target
        target=$(cat "$nav_file")
        rm -f "$nav_file"
        if [[ -d "$target" ]]; then
            cd "$target" || return
        fi
    fi
    return $status
}}
"#,
            prefix = MARKER_PREFIX
        ),
        Shell::Fish => format!(
            r#"function fcf
    set -l tmp /tmp
    if set -q TMPDIR
        set tmp (string trim --right --chars=/ $TMPDIR)
    end
    set -l nav_file $tmp/{prefix}_(id -u)
    rm -f $nav_file
    command fcf $argv
    set -l fcf_status $status
    if test -f $nav_file
        set -l target (cat $nav_file)
        rm -f $nav_file
        if test -d "$target"
            cd $target
        end
    end
    return $fcf_status
end
"#,
            prefix = MARKER_PREFIX
        ),
        Shell::Powershell => format!(
            r#"function fcf {{
    $navFile = Join-Path $env:TEMP "{prefix}"
    if (Test-Path $navFile) {{ Remove-Item $navFile -Force }}
    & (Get-Command fcf -CommandType Application | Select-Object -First 1).Source @args
    if (Test-Path $navFile) {{
        $target = Get-Content $navFile -Raw
        Remove-Item $navFile -Force
        if (Test-Path $target -PathType Container) {{
            Set-Location $target
        }}
    }}
}}
"#,
            prefix = MARKER_PREFIX
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_wrappers_use_uid_scoped_marker() {
        for shell in [Shell::Bash, Shell::Zsh] {
            let script = wrapper(shell);
            assert!(script.contains("fcf_nav_path_$(id -u)"));
            assert!(script.contains("command fcf \"$@\""));
            assert!(script.contains("cd \"$target\""));
        }
        assert!(wrapper(Shell::Fish).contains("fcf_nav_path_(id -u)"));
    }

    #[test]
    fn test_powershell_wrapper_uses_plain_marker() {
        let script = wrapper(Shell::Powershell);
        assert!(script.contains("\"fcf_nav_path\""));
        assert!(script.contains("Set-Location $target"));
    }
}
