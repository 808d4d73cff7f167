use std::env;

use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "change-me";
const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "系统正在维护升级，暂停对外服务。给您带来不便，敬请谅解。";
const DEFAULT_MESSAGES_PER_MINUTE: usize = 3;
const DEFAULT_MESSAGES_PER_DAY: usize = 10;

/// Process-wide settings read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub admin_username: String,
    pub admin_password: String,
    pub maintenance_enabled: bool,
    pub maintenance_message: String,
    pub messages_per_minute: usize,
    pub messages_per_day: usize,
    pub seed_mock_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            maintenance_enabled: false,
            maintenance_message: DEFAULT_MAINTENANCE_MESSAGE.to_string(),
            messages_per_minute: DEFAULT_MESSAGES_PER_MINUTE,
            messages_per_day: DEFAULT_MESSAGES_PER_DAY,
            seed_mock_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: parse_number("PORT", defaults.port),
            admin_username: non_empty_var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: non_empty_var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            maintenance_enabled: env::var("MAINTENANCE_MODE")
                .map(|value| parse_flag(&value))
                .unwrap_or(defaults.maintenance_enabled),
            maintenance_message: non_empty_var("MAINTENANCE_MESSAGE")
                .unwrap_or(defaults.maintenance_message),
            messages_per_minute: parse_number(
                "MESSAGE_LIMIT_PER_MINUTE",
                defaults.messages_per_minute,
            ),
            messages_per_day: parse_number("MESSAGE_LIMIT_PER_DAY", defaults.messages_per_day),
            seed_mock_data: env::var("SEED_MOCK_DATA")
                .map(|value| parse_flag(&value))
                .unwrap_or(defaults.seed_mock_data),
        }
    }
}

/// Interprets the usual truthy spellings; everything else is off.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match non_empty_var(key) {
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    key,
                    value = %raw,
                    fallback = %default,
                    "invalid numeric setting, using default"
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_common_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(parse_flag(value), "{value} should be truthy");
        }
        for value in ["0", "false", "off", "", "enabled"] {
            assert!(!parse_flag(value), "{value} should be falsy");
        }
    }

    #[test]
    fn defaults_match_documented_limits() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.messages_per_minute, 3);
        assert_eq!(config.messages_per_day, 10);
        assert!(!config.maintenance_enabled);
        assert!(config.seed_mock_data);
    }
}
