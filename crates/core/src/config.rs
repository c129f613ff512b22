//! Immutable runtime settings, sourced from `FLOWBOT_*` environment
//! variables. Components receive `Settings` by reference; nothing reads
//! the process environment after startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{FlowError, Result};

const DEFAULT_PROMPT: &str = "A cinematic shot of a beautiful landscape";
const DEFAULT_OUTPUT_DIR: &str = "./downloads";
const DEFAULT_USER_DATA_DIR: &str = "./user-data";

const FLOW_URL: &str = "https://labs.google/fx/vi/tools/flow";
const FLOW_CREATE_URL: &str = "https://labs.google/flow/create";

/// Account credentials for the login sequence. Both parts are optional at
/// load time; [`Credentials::require`] enforces presence where login is
/// actually needed.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn require(&self) -> Result<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok((email, password))
            }
            _ => Err(FlowError::Configuration(
                "FLOWBOT_EMAIL and FLOWBOT_PASSWORD must be set to log in".into(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Urls {
    /// Landing page of the studio.
    pub flow: String,
    /// The create/editor page where jobs are submitted.
    pub flow_create: String,
}

impl Default for Urls {
    fn default() -> Self {
        Self {
            flow: FLOW_URL.to_string(),
            flow_create: FLOW_CREATE_URL.to_string(),
        }
    }
}

/// Every bounded wait in the workflow. Defaults match the studio's
/// observed behavior; override via environment for slow networks.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Post-navigation settle for client-side rendering.
    pub settle: Duration,
    /// Bound on waiting for a login form field to appear.
    pub field_wait: Duration,
    /// Window for a human to complete a second-factor challenge.
    pub second_factor: Duration,
    /// Completion poller tick.
    pub poll_interval: Duration,
    /// Hard deadline on the whole generation job.
    pub completion_deadline: Duration,
    /// Bound on the download event after triggering it.
    pub download: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            field_wait: Duration::from_secs(30),
            second_factor: Duration::from_secs(120),
            poll_interval: Duration::from_secs(5),
            completion_deadline: Duration::from_secs(300),
            download: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub default_prompt: String,
    pub output_dir: PathBuf,
    pub user_data_dir: PathBuf,
    pub headless: bool,
    pub urls: Urls,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            default_prompt: DEFAULT_PROMPT.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            user_data_dir: PathBuf::from(DEFAULT_USER_DATA_DIR),
            headless: false,
            urls: Urls::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an injected variable lookup. Malformed numeric
    /// overrides fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        settings.credentials.email = lookup("FLOWBOT_EMAIL").filter(|v| !v.is_empty());
        settings.credentials.password = lookup("FLOWBOT_PASSWORD").filter(|v| !v.is_empty());

        if let Some(prompt) = lookup("FLOWBOT_PROMPT") {
            settings.default_prompt = prompt;
        }
        if let Some(dir) = lookup("FLOWBOT_OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FLOWBOT_USER_DATA_DIR") {
            settings.user_data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("FLOWBOT_HEADLESS") {
            settings.headless = matches!(value.as_str(), "true" | "1");
        }

        if let Some(secs) = parse_secs(&lookup, "FLOWBOT_POLL_INTERVAL_SECS") {
            settings.timeouts.poll_interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "FLOWBOT_COMPLETION_DEADLINE_SECS") {
            settings.timeouts.completion_deadline = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "FLOWBOT_DOWNLOAD_TIMEOUT_SECS") {
            settings.timeouts.download = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "FLOWBOT_SECOND_FACTOR_TIMEOUT_SECS") {
            settings.timeouts.second_factor = secs;
        }

        settings
    }
}

fn parse_secs(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    lookup(key)?.parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_without_any_environment() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.default_prompt, DEFAULT_PROMPT);
        assert_eq!(settings.output_dir, PathBuf::from("./downloads"));
        assert_eq!(settings.user_data_dir, PathBuf::from("./user-data"));
        assert!(!settings.headless);
        assert_eq!(settings.timeouts.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.timeouts.completion_deadline, Duration::from_secs(300));
        assert!(settings.credentials.email.is_none());
    }

    #[test]
    fn environment_overrides_are_applied() {
        let env = env_of(&[
            ("FLOWBOT_EMAIL", "user@example.com"),
            ("FLOWBOT_PASSWORD", "hunter2"),
            ("FLOWBOT_PROMPT", "a red fox in the snow"),
            ("FLOWBOT_OUTPUT_DIR", "/tmp/artifacts"),
            ("FLOWBOT_HEADLESS", "true"),
            ("FLOWBOT_POLL_INTERVAL_SECS", "2"),
        ]);
        let settings = Settings::from_lookup(|key| env.get(key).cloned());
        assert_eq!(settings.credentials.email.as_deref(), Some("user@example.com"));
        assert_eq!(settings.default_prompt, "a red fox in the snow");
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/artifacts"));
        assert!(settings.headless);
        assert_eq!(settings.timeouts.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn headless_accepts_one_as_true() {
        let env = env_of(&[("FLOWBOT_HEADLESS", "1")]);
        assert!(Settings::from_lookup(|key| env.get(key).cloned()).headless);

        let env = env_of(&[("FLOWBOT_HEADLESS", "yes")]);
        assert!(!Settings::from_lookup(|key| env.get(key).cloned()).headless);
    }

    #[test]
    fn malformed_timeout_override_keeps_default() {
        let env = env_of(&[("FLOWBOT_COMPLETION_DEADLINE_SECS", "five minutes")]);
        let settings = Settings::from_lookup(|key| env.get(key).cloned());
        assert_eq!(settings.timeouts.completion_deadline, Duration::from_secs(300));
    }

    #[test]
    fn empty_credentials_do_not_count() {
        let env = env_of(&[("FLOWBOT_EMAIL", ""), ("FLOWBOT_PASSWORD", "hunter2")]);
        let settings = Settings::from_lookup(|key| env.get(key).cloned());
        assert!(settings.credentials.email.is_none());
        assert!(settings.credentials.require().is_err());
    }

    #[test]
    fn require_returns_both_parts_when_present() {
        let creds = Credentials {
            email: Some("user@example.com".into()),
            password: Some("hunter2".into()),
        };
        let (email, password) = creds.require().unwrap();
        assert_eq!(email, "user@example.com");
        assert_eq!(password, "hunter2");
    }
}
