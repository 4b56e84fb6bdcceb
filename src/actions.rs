//! The detection action: run a command that locks the session.

use std::process::Command;
use thiserror::Error;

/// Errors from running the detection action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// The platform's session-lock command.
///
/// On macOS this only sleeps the display. The session is locked only when
/// "Require password immediately after sleep or screen saver begins" is
/// enabled in Lock Screen settings.
pub fn default_lock_command() -> Vec<String> {
    #[cfg(target_os = "macos")]
    let command: &[&str] = &["pmset", "displaysleepnow"];

    #[cfg(target_os = "windows")]
    let command: &[&str] = &["rundll32.exe", "user32.dll,LockWorkStation"];

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command: &[&str] = &["loginctl", "lock-session"];

    command.iter().map(|part| part.to_string()).collect()
}

/// Runs a configured command when a paw is detected.
#[derive(Debug, Clone)]
pub struct LockAction {
    command: Vec<String>,
    dry_run: bool,
}

impl LockAction {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            dry_run: false,
        }
    }

    /// Log instead of running the command.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Run the command and wait for it to finish.
    ///
    /// An empty command is a no-op.
    pub fn run(&self) -> Result<(), ActionError> {
        let Some((program, args)) = self.command.split_first() else {
            tracing::debug!("No detection action configured");
            return Ok(());
        };

        if self.dry_run {
            tracing::info!(command = ?self.command, "Dry run; not locking");
            return Ok(());
        }

        tracing::info!(command = ?self.command, "Locking session");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ActionError::Spawn {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::Failed {
                program: program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Caveat printed next to the default command, if the platform has one.
pub fn default_lock_note() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("sleeps the display; locks only if a password is required immediately after sleep")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_not_empty() {
        assert!(!default_lock_command().is_empty());
    }

    #[test]
    fn test_lock_note_only_on_macos() {
        assert_eq!(default_lock_note().is_some(), cfg!(target_os = "macos"));
    }

    #[test]
    fn test_empty_command_is_noop() {
        assert!(LockAction::new(Vec::new()).run().is_ok());
    }

    #[test]
    fn test_dry_run_does_not_spawn() {
        let action = LockAction::new(vec!["paws-no-such-program".to_string()]).dry_run(true);
        assert!(action.run().is_ok());
    }

    #[test]
    fn test_missing_program_reports_spawn_error() {
        let action = LockAction::new(vec!["paws-no-such-program".to_string()]);
        assert!(matches!(action.run(), Err(ActionError::Spawn { .. })));
    }
}
