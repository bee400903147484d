use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub completion: CompletionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Remote completion service settings. The endpoint list is ordered:
/// candidates are tried front to back until one succeeds.
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub endpoints: Vec<String>,
    pub api_key: SecretString,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub endpoints: Option<Vec<String>>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig {
                endpoints: Vec::new(),
                api_key: String::new().into(),
                model: String::new(),
                max_tokens: 2000,
                temperature: 0.7,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8787,
                health_check_port: 8788,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dramwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(completion) = patch.completion {
            if let Some(endpoints) = completion.endpoints {
                self.completion.endpoints = endpoints;
            }
            if let Some(api_key_value) = completion.api_key {
                self.completion.api_key = secret_value(api_key_value);
            }
            if let Some(model) = completion.model {
                self.completion.model = model;
            }
            if let Some(max_tokens) = completion.max_tokens {
                self.completion.max_tokens = max_tokens;
            }
            if let Some(temperature) = completion.temperature {
                self.completion.temperature = temperature;
            }
            if let Some(timeout_secs) = completion.timeout_secs {
                self.completion.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DRAMWISE_COMPLETION_ENDPOINTS") {
            self.completion.endpoints = split_endpoint_list(&value);
        }
        if let Some(value) = read_env("DRAMWISE_COMPLETION_API_KEY") {
            self.completion.api_key = secret_value(value);
        }
        if let Some(value) = read_env("DRAMWISE_COMPLETION_MODEL") {
            self.completion.model = value;
        }
        if let Some(value) = read_env("DRAMWISE_COMPLETION_MAX_TOKENS") {
            self.completion.max_tokens = parse_u32("DRAMWISE_COMPLETION_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("DRAMWISE_COMPLETION_TEMPERATURE") {
            self.completion.temperature = parse_f64("DRAMWISE_COMPLETION_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("DRAMWISE_COMPLETION_TIMEOUT_SECS") {
            self.completion.timeout_secs = parse_u64("DRAMWISE_COMPLETION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DRAMWISE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DRAMWISE_SERVER_PORT") {
            self.server.port = parse_u16("DRAMWISE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("DRAMWISE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("DRAMWISE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("DRAMWISE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("DRAMWISE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("DRAMWISE_LOGGING_LEVEL").or_else(|| read_env("DRAMWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DRAMWISE_LOGGING_FORMAT").or_else(|| read_env("DRAMWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(endpoints) = overrides.endpoints {
            self.completion.endpoints = endpoints;
        }
        if let Some(api_key) = overrides.api_key {
            self.completion.api_key = secret_value(api_key);
        }
        if let Some(model) = overrides.model {
            self.completion.model = model;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_completion(&self.completion)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dramwise.toml"), PathBuf::from("config/dramwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn split_endpoint_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_completion(completion: &CompletionConfig) -> Result<(), ConfigError> {
    if completion.endpoints.is_empty() {
        return Err(ConfigError::Validation(
            "completion.endpoints must list at least one candidate URL".to_string(),
        ));
    }
    for endpoint in &completion.endpoints {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "completion endpoint `{endpoint}` must start with http:// or https://"
            )));
        }
    }

    if completion.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "completion.api_key is required (set DRAMWISE_COMPLETION_API_KEY)".to_string(),
        ));
    }

    if completion.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "completion.model is required (set DRAMWISE_COMPLETION_MODEL)".to_string(),
        ));
    }

    if completion.max_tokens == 0 || completion.max_tokens > 8192 {
        return Err(ConfigError::Validation(
            "completion.max_tokens must be in range 1..=8192".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&completion.temperature) {
        return Err(ConfigError::Validation(
            "completion.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if completion.timeout_secs == 0 || completion.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "completion.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    completion: Option<CompletionPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionPatch {
    endpoints: Option<Vec<String>>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: &[&str] = &[
        "DRAMWISE_COMPLETION_ENDPOINTS",
        "DRAMWISE_COMPLETION_API_KEY",
        "DRAMWISE_COMPLETION_MODEL",
        "DRAMWISE_COMPLETION_MAX_TOKENS",
        "DRAMWISE_COMPLETION_TEMPERATURE",
        "DRAMWISE_COMPLETION_TIMEOUT_SECS",
        "DRAMWISE_SERVER_PORT",
        "DRAMWISE_LOGGING_LEVEL",
        "DRAMWISE_LOG_LEVEL",
        "DRAMWISE_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn set_required_vars() {
        env::set_var(
            "DRAMWISE_COMPLETION_ENDPOINTS",
            "https://primary.example/api/v1/messages, https://backup.example/api/v1/messages",
        );
        env::set_var("DRAMWISE_COMPLETION_API_KEY", "test-key");
        env::set_var("DRAMWISE_COMPLETION_MODEL", "test-model");
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_fail_validation_without_completion_settings() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let result = AppConfig::load(LoadOptions::default());
        ensure(
            matches!(result, Err(ConfigError::Validation(_))),
            "empty completion settings must fail validation",
        )
    }

    #[test]
    fn env_endpoint_list_is_split_and_ordered() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        set_required_vars();

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.completion.endpoints.len() == 2, "two endpoints expected")?;
            ensure(
                config.completion.endpoints[0] == "https://primary.example/api/v1/messages",
                "primary endpoint must stay first",
            )?;
            ensure(
                config.completion.api_key.expose_secret() == "test-key",
                "api key should come from env",
            )?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("TEST_COMPLETION_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("dramwise.toml");
            fs::write(
                &path,
                r#"
[completion]
endpoints = ["https://proxy.example/api/v1/messages"]
api_key = "${TEST_COMPLETION_KEY}"
model = "sommelier-large"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.completion.api_key.expose_secret() == "key-from-env",
                "api key should be interpolated from environment",
            )?;
            ensure(config.completion.model == "sommelier-large", "model should come from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_COMPLETION_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("DRAMWISE_COMPLETION_MODEL", "model-from-env");
        env::set_var("DRAMWISE_COMPLETION_API_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("dramwise.toml");
            fs::write(
                &path,
                r#"
[completion]
endpoints = ["https://file.example/api/v1/messages"]
api_key = "key-from-file"
model = "model-from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.completion.model == "model-from-env", "env model should win over file")?;
            ensure(
                config.completion.api_key.expose_secret() == "key-from-env",
                "env api key should win over file",
            )?;
            ensure(config.logging.level == "debug", "programmatic override should win over file")?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        set_required_vars();
        env::set_var("DRAMWISE_LOG_LEVEL", "warn");
        env::set_var("DRAMWISE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn malformed_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        set_required_vars();
        env::set_var("DRAMWISE_COMPLETION_MAX_TOKENS", "lots");

        let result = ensure(
            matches!(
                AppConfig::load(LoadOptions::default()),
                Err(ConfigError::InvalidEnvOverride { .. })
            ),
            "non-numeric max_tokens must be rejected",
        );

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn non_http_endpoint_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        set_required_vars();
        env::set_var("DRAMWISE_COMPLETION_ENDPOINTS", "ftp://nope.example");

        let result = ensure(
            matches!(AppConfig::load(LoadOptions::default()), Err(ConfigError::Validation(_))),
            "non-http endpoint must fail validation",
        );

        clear_vars(MANAGED_VARS);
        result
    }
}
