use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::Command;

use log::debug;

use crate::error::{JenkinsError, Result};

/// A password that stays out of `Debug` output.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(****)")
    }
}

/// Where the login credentials come from.
///
/// The password is taken from the config file first, then from the output of
/// a configured command, and finally from an interactive prompt.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<Password>,
    pub password_command: Option<String>,
}

impl Credentials {
    pub fn user(&self) -> Result<String> {
        if let Some(user) = &self.user {
            return Ok(user.clone());
        }

        if !io::stdin().is_terminal() {
            return Err(JenkinsError::Auth(
                "user required; supply via --user when running non-interactively".to_string(),
            ));
        }

        read_user(&mut io::stdin().lock(), &mut io::stderr())
    }

    pub fn password(&self, user: &str) -> Result<Password> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }

        if let Some(command) = &self.password_command {
            return run_password_command(command);
        }

        if !io::stdin().is_terminal() {
            return Err(JenkinsError::Auth(
                "password required; configure one when running non-interactively".to_string(),
            ));
        }

        let password = rpassword::prompt_password(format!("Password for {user}: "))?;
        non_empty(&password, "password").map(Password::from)
    }
}

/// Asks for a username on `output` and reads one line of `input`.
fn read_user(input: &mut impl BufRead, output: &mut impl Write) -> Result<String> {
    write!(output, "Username: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    non_empty(line.trim(), "username")
}

fn non_empty(value: &str, what: &str) -> Result<String> {
    if value.is_empty() {
        return Err(JenkinsError::Auth(format!("{what} cannot be empty")));
    }
    Ok(value.to_string())
}

/// Runs `command` through the shell and uses the first line of its output.
fn run_password_command(command: &str) -> Result<Password> {
    debug!("Running password command");
    let output = Command::new("sh").arg("-c").arg(command).output()?;

    if !output.status.success() {
        return Err(JenkinsError::Auth(format!(
            "password command exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let password = stdout.lines().next().unwrap_or_default();
    non_empty(password, "password").map(Password::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::from("hunter2");
        assert_eq!(format!("{password:?}"), "Password(****)");
        assert_eq!(password.as_str(), "hunter2");
    }

    #[test]
    fn test_configured_password_wins() {
        let credentials = Credentials {
            user: Some("alice".to_string()),
            password: Some(Password::from("from-config")),
            password_command: Some("echo from-command".to_string()),
        };

        assert_eq!(credentials.user().unwrap(), "alice");
        assert_eq!(credentials.password("alice").unwrap().as_str(), "from-config");
    }

    #[test]
    fn test_read_user_from_input() {
        let mut input = "  alice \nbob\n".as_bytes();
        let mut output = Vec::new();

        assert_eq!(read_user(&mut input, &mut output).unwrap(), "alice");
        assert_eq!(String::from_utf8(output).unwrap(), "Username: ");
    }

    #[test]
    fn test_read_user_rejects_blank_line() {
        let mut input = "\n".as_bytes();
        assert!(matches!(
            read_user(&mut input, &mut Vec::new()),
            Err(JenkinsError::Auth(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_password_command_first_line() {
        let credentials = Credentials {
            password_command: Some("printf 'secret\\nignored\\n'".to_string()),
            ..Credentials::default()
        };

        assert_eq!(credentials.password("alice").unwrap().as_str(), "secret");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_password_command() {
        let credentials = Credentials {
            password_command: Some("exit 3".to_string()),
            ..Credentials::default()
        };

        assert!(matches!(
            credentials.password("alice"),
            Err(JenkinsError::Auth(_))
        ));
    }
}
