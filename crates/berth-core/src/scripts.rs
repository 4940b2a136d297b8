//! Launcher script generation.
//!
//! Every declared command gets one script per host-shell family at the
//! output root. Each family is a pure function from the script inputs to
//! text, so the two dialects are independently testable. The launcher
//! binary is named bare (resolved via the caller's search path) unless a
//! runtime was bundled, in which case it is addressed relative to the
//! script's own location inside the bundled runtime's `bin` directory.

use crate::error::PackError;
use crate::paths::{APPROOT_DIR, HOST_ENTRY_POINT, LAUNCHER_BIN, RUNTIME_BIN_DIR, SRC_DIR};
use crate::runtime::RuntimeId;
use std::path::Path;

/// Environment variable the POSIX script exports for the launcher.
pub const APP_BASE_ENV: &str = "APP_BASE";

const SH_PROLOGUE: &str = r#"#!/usr/bin/env bash

SOURCE="${BASH_SOURCE[0]}"
while [ -h "$SOURCE" ]; do
  DIR="$( cd -P "$( dirname "$SOURCE" )" >/dev/null 2>&1 && pwd )"
  SOURCE="$(readlink "$SOURCE")"
  [[ $SOURCE != /* ]] && SOURCE="$DIR/$SOURCE"
done
DIR="$( cd -P "$( dirname "$SOURCE" )" >/dev/null 2>&1 && pwd )"
"#;

/// Render the Windows-style script: a single launcher invocation with the
/// application base, the hosting entry point, the command line, and
/// forwarded arguments.
pub fn cmd_script(project: &str, command_line: &str, runtime: Option<&RuntimeId>, cache_dir: &str) -> String {
    let launcher = match runtime {
        Some(runtime) => format!(
            "\"%~dp0{APPROOT_DIR}\\{cache_dir}\\{name}\\{RUNTIME_BIN_DIR}\\{LAUNCHER_BIN}.exe\"",
            name = runtime.name()
        ),
        None => LAUNCHER_BIN.to_string(),
    };
    format!(
        "@{launcher} --appbase \"%~dp0{APPROOT_DIR}\\{SRC_DIR}\\{project}\" {HOST_ENTRY_POINT} {command_line} %*"
    )
}

/// Render the POSIX-style script.
///
/// The script first resolves its own real location through any symlinks,
/// so invocation via a symlink still finds the packed application, then
/// exports [`APP_BASE_ENV`] and hands over to the launcher. Content is
/// LF-only regardless of host convention.
pub fn sh_script(project: &str, command_line: &str, runtime: Option<&RuntimeId>, cache_dir: &str) -> String {
    let launcher = match runtime {
        Some(runtime) => format!(
            "\"$DIR/{APPROOT_DIR}/{cache_dir}/{name}/{RUNTIME_BIN_DIR}/{LAUNCHER_BIN}\"",
            name = runtime.name()
        ),
        None => LAUNCHER_BIN.to_string(),
    };
    format!(
        "{SH_PROLOGUE}\nexport {APP_BASE_ENV}=\"$DIR/{APPROOT_DIR}/{SRC_DIR}/{project}\"\n\n\
         exec {launcher} --appbase \"${APP_BASE_ENV}\" {HOST_ENTRY_POINT} {command_line} \"$@\"\n"
    )
}

/// Write both script variants for every declared command at the output
/// root. The Windows-style file uses host-default line endings; the
/// POSIX-style file is always LF and is marked executable where the host
/// supports it.
///
/// # Errors
///
/// Returns [`PackError::FileSystem`] when a script cannot be written.
pub fn write_launcher_scripts(
    out: &Path,
    project: &str,
    commands: &[(String, String)],
    runtime: Option<&RuntimeId>,
    cache_dir: &str,
) -> Result<(), PackError> {
    let host_eol = if cfg!(windows) { "\r\n" } else { "\n" };

    for (command, command_line) in commands {
        let cmd_path = out.join(format!("{command}.cmd"));
        let content = cmd_script(project, command_line, runtime, cache_dir) + host_eol;
        std::fs::write(&cmd_path, content).map_err(|e| PackError::io(&cmd_path, e))?;

        let sh_path = out.join(format!("{command}.sh"));
        let content = sh_script(project, command_line, runtime, cache_dir);
        std::fs::write(&sh_path, content).map_err(|e| PackError::io(&sh_path, e))?;
        mark_executable(&sh_path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), PackError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| PackError::io(path, e))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), PackError> {
    Ok(())
}
