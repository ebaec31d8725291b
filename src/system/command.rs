//! External process invocation with unified error mapping.

use std::process::{Command, Stdio};

use crate::error::{NvupError, Result};

fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Run a command to completion, inheriting stdout/stderr, and return its
/// exit status code. Spawn failures (binary absent) are their own error.
pub fn run_status(program: &str, args: &[&str]) -> Result<i32> {
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| NvupError::CommandSpawnFailed {
            command: display_command(program, args),
            reason: e.to_string(),
        })?;
    // Signal-terminated processes carry no code; treat as generic failure
    Ok(status.code().unwrap_or(1))
}

/// Run a command and fail if it exits nonzero.
pub fn run_checked(program: &str, args: &[&str]) -> Result<()> {
    let status = run_status(program, args)?;
    if status != 0 {
        return Err(NvupError::CommandFailed {
            command: display_command(program, args),
            status,
        });
    }
    Ok(())
}

/// Run a command with its diagnostic stream discarded, returning the status.
pub fn run_status_quiet(program: &str, args: &[&str]) -> Result<i32> {
    let status = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .status()
        .map_err(|e| NvupError::CommandSpawnFailed {
            command: display_command(program, args),
            reason: e.to_string(),
        })?;
    Ok(status.code().unwrap_or(1))
}

/// Capture a command's stdout as a string, failing on nonzero exit.
pub fn output_of(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| NvupError::CommandSpawnFailed {
            command: display_command(program, args),
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(NvupError::CommandFailed {
            command: display_command(program, args),
            status: output.status.code().unwrap_or(1),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether a binary resolves on PATH.
pub fn binary_on_path(name: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| {
                let candidate = dir.join(name);
                candidate.is_file()
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_zero() {
        assert_eq!(run_status("true", &[]).unwrap(), 0);
    }

    #[test]
    fn test_run_status_nonzero() {
        assert_eq!(run_status("false", &[]).unwrap(), 1);
    }

    #[test]
    fn test_run_status_spawn_failure() {
        let err = run_status("nvup-no-such-binary", &[]).unwrap_err();
        assert!(matches!(err, NvupError::CommandSpawnFailed { .. }));
    }

    #[test]
    fn test_run_checked_maps_nonzero() {
        let err = run_checked("false", &[]).unwrap_err();
        assert!(matches!(err, NvupError::CommandFailed { status: 1, .. }));
    }

    #[test]
    fn test_output_of_captures_stdout() {
        let out = output_of("echo", &["hello"]).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_binary_on_path() {
        assert!(binary_on_path("sh"));
        assert!(!binary_on_path("nvup-no-such-binary"));
    }
}
