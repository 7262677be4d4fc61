//! `.env` file support
//!
//! Loading goes through `dotenvy`, which never overrides variables already
//! present in the process environment. Writing produces a commented sample
//! for `--create-env-file`.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::constants::{
    DEFAULT_HEALTH_PORT, DEFAULT_INTERVAL_MINUTES, DEFAULT_TTL_SECS, ENV_FILE_NAME,
    SAMPLE_IPV4_URL,
};

/// Loads variables from `path`, or from `./.env` when no path is given
///
/// Returns the file that was loaded. A missing default file is not an error;
/// a missing explicit file is.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file: {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::from_filename(ENV_FILE_NAME) {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to load {}", ENV_FILE_NAME)),
        },
    }
}

/// Contents written by `--create-env-file`
pub fn sample_env_contents() -> String {
    format!(
        "\
# Hetzner DDNS Configuration
# URL to get your public IPv4 address
IPV4_URL={SAMPLE_IPV4_URL}

# Your domain name (the zone in Hetzner DNS)
DOMAIN=example.com

# The subdomain/hostname to update (e.g., \"home\" for home.example.com)
SUBDOMAIN=home

# TTL for the DNS record in seconds (optional, default is {DEFAULT_TTL_SECS})
TTL={DEFAULT_TTL_SECS}

# Your Hetzner DNS API token
# Get this from: https://dns.hetzner.com/settings/api-token
TOKEN=your_hetzner_api_token_here

# Interval in minutes between IP checks and updates (optional, default is {DEFAULT_INTERVAL_MINUTES})
INTERVAL={DEFAULT_INTERVAL_MINUTES}

# Port for the health check endpoint (optional, default is {DEFAULT_HEALTH_PORT}, 0 disables it)
HEALTH_PORT={DEFAULT_HEALTH_PORT}
"
    )
}

/// Result of [`write_sample_env_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Overwritten,
    Kept,
}

/// Writes the sample file to `path`
///
/// When the file already exists `confirm_overwrite` is asked first and the
/// file is left untouched unless it returns `true`.
pub fn write_sample_env_file<F>(path: &Path, confirm_overwrite: F) -> Result<WriteOutcome>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    let existed = path.exists();
    if existed && !confirm_overwrite(path)? {
        return Ok(WriteOutcome::Kept);
    }

    std::fs::write(path, sample_env_contents())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(if existed {
        WriteOutcome::Overwritten
    } else {
        WriteOutcome::Created
    })
}

/// Asks `Overwrite? (y/N)` on `output` and reads the answer from `input`
pub fn prompt_overwrite<R: BufRead, W: Write>(path: &Path, input: R, mut output: W) -> Result<bool> {
    write!(
        output,
        "{} already exists. Do you want to overwrite it? (y/N) ",
        path.display()
    )?;
    output.flush()?;

    let mut answer = String::new();
    let mut input = input;
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// [`prompt_overwrite`] bound to the terminal
pub fn prompt_overwrite_stdin(path: &Path) -> Result<bool> {
    prompt_overwrite(path, io::stdin().lock(), io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::EnvGuard;
    use crate::config::Config;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");

        let outcome = write_sample_env_file(&path, |_| panic!("must not prompt")).unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("IPV4_URL=https://ipv4.icanhazip.com"));
        assert!(content.contains("TOKEN=your_hetzner_api_token_here"));
        assert!(content.contains("TTL=7200"));
        assert!(content.contains("INTERVAL=10"));
    }

    #[test]
    fn test_existing_file_kept_without_consent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "TOKEN=mine\n").unwrap();

        let outcome = write_sample_env_file(&path, |_| Ok(false)).unwrap();
        assert_eq!(outcome, WriteOutcome::Kept);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "TOKEN=mine\n");
    }

    #[test]
    fn test_existing_file_overwritten_with_consent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "TOKEN=mine\n").unwrap();

        let outcome = write_sample_env_file(&path, |_| Ok(true)).unwrap();
        assert_eq!(outcome, WriteOutcome::Overwritten);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("DOMAIN=example.com"));
    }

    #[test]
    fn test_prompt_answers() {
        let path = Path::new(".env");
        for (answer, expected) in [
            ("y\n", true),
            ("YES\n", true),
            (" yes \n", true),
            ("n\n", false),
            ("\n", false),
            ("", false),
            ("maybe\n", false),
        ] {
            let mut out = Vec::new();
            let got = prompt_overwrite(path, answer.as_bytes(), &mut out).unwrap();
            assert_eq!(got, expected, "answer {answer:?}");
            assert!(String::from_utf8(out).unwrap().contains("(y/N)"));
        }
    }

    #[test]
    #[serial]
    fn test_sample_file_loads_into_valid_config() {
        let _env = EnvGuard::new();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.env");
        write_sample_env_file(&path, |_| Ok(true)).unwrap();

        let loaded = load_env_file(Some(&path)).unwrap();
        assert_eq!(loaded.as_deref(), Some(path.as_path()));

        let cfg = Config::load(None).expect("sample config is valid");
        assert_eq!(cfg.domain, "example.com");
        assert_eq!(cfg.subdomain, "home");
        assert_eq!(cfg.ttl, 7200);
        assert_eq!(cfg.health_port, 8080);
    }

    #[test]
    #[serial]
    fn test_env_file_does_not_override_process_env() {
        let _env = EnvGuard::new();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.env");
        std::fs::write(&path, "DOMAIN=from-file.com\nSUBDOMAIN=nas\n").unwrap();
        std::env::set_var("DOMAIN", "from-process.com");

        load_env_file(Some(&path)).unwrap();
        assert_eq!(std::env::var("DOMAIN").unwrap(), "from-process.com");
        assert_eq!(std::env::var("SUBDOMAIN").unwrap(), "nas");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load_env_file(Some(Path::new("/nonexistent/custom.env"))).unwrap_err();
        assert!(format!("{err}").contains("Failed to load env file"));
    }
}
