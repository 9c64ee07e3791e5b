use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["voicecart.toml", "config/voicecart.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub conversation: ConversationConfig,
    pub payments: PaymentsConfig,
    pub orders: OrdersConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ConversationConfig {
    pub debug: bool,
    pub strict_flow: bool,
    pub unknown_intent: UnknownIntentPolicy,
    pub fallback_message: String,
}

/// Tokenization parameters handed to the payment gateway, plus the card the
/// merchant-managed path offers.
#[derive(Clone, Debug)]
pub struct PaymentsConfig {
    pub gateway: String,
    pub sdk_version: String,
    pub api_version: String,
    pub merchant_id: String,
    pub client_key: SecretString,
    pub authorization_fingerprint: SecretString,
    pub card_display_name: String,
}

#[derive(Clone, Debug)]
pub struct OrdersConfig {
    pub id_strategy: OrderIdStrategy,
    pub customer_service_url: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownIntentPolicy {
    Reject,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderIdStrategy {
    Random,
    Sequential,
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
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub debug: Option<bool>,
    pub strict_flow: Option<bool>,
    pub id_strategy: Option<OrderIdStrategy>,
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
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            conversation: ConversationConfig {
                debug: false,
                strict_flow: false,
                unknown_intent: UnknownIntentPolicy::Reject,
                fallback_message: "Sorry, I didn't get that. Can you say it again?".to_string(),
            },
            payments: PaymentsConfig {
                gateway: "braintree".to_string(),
                sdk_version: "1.4.0".to_string(),
                api_version: "v1".to_string(),
                merchant_id: "xxxxxxxxxxx".to_string(),
                client_key: secret_value("sandbox_xxxxxxxxxxxxxxx".to_string()),
                authorization_fingerprint: secret_value("sandbox_xxxxxxxxxxxxxxx".to_string()),
                card_display_name: "VISA-1234".to_string(),
            },
            orders: OrdersConfig {
                id_strategy: OrderIdStrategy::Random,
                customer_service_url: "http://example.com/customer-service".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for UnknownIntentPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "fallback" => Ok(Self::Fallback),
            other => Err(ConfigError::Validation(format!(
                "unsupported unknown-intent policy `{other}` (expected reject|fallback)"
            ))),
        }
    }
}

impl std::str::FromStr for OrderIdStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequential" => Ok(Self::Sequential),
            other => Err(ConfigError::Validation(format!(
                "unsupported order id strategy `{other}` (expected random|sequential)"
            ))),
        }
    }
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
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(conversation) = patch.conversation {
            if let Some(debug) = conversation.debug {
                self.conversation.debug = debug;
            }
            if let Some(strict_flow) = conversation.strict_flow {
                self.conversation.strict_flow = strict_flow;
            }
            if let Some(unknown_intent) = conversation.unknown_intent {
                self.conversation.unknown_intent = unknown_intent;
            }
            if let Some(fallback_message) = conversation.fallback_message {
                self.conversation.fallback_message = fallback_message;
            }
        }

        if let Some(payments) = patch.payments {
            if let Some(gateway) = payments.gateway {
                self.payments.gateway = gateway;
            }
            if let Some(sdk_version) = payments.sdk_version {
                self.payments.sdk_version = sdk_version;
            }
            if let Some(api_version) = payments.api_version {
                self.payments.api_version = api_version;
            }
            if let Some(merchant_id) = payments.merchant_id {
                self.payments.merchant_id = merchant_id;
            }
            if let Some(client_key) = payments.client_key {
                self.payments.client_key = secret_value(client_key);
            }
            if let Some(fingerprint) = payments.authorization_fingerprint {
                self.payments.authorization_fingerprint = secret_value(fingerprint);
            }
            if let Some(card_display_name) = payments.card_display_name {
                self.payments.card_display_name = card_display_name;
            }
        }

        if let Some(orders) = patch.orders {
            if let Some(id_strategy) = orders.id_strategy {
                self.orders.id_strategy = id_strategy;
            }
            if let Some(customer_service_url) = orders.customer_service_url {
                self.orders.customer_service_url = customer_service_url;
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
        if let Some(value) = read_env("VOICECART_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("VOICECART_SERVER_PORT") {
            self.server.port = parse_u16("VOICECART_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("VOICECART_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("VOICECART_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("VOICECART_CONVERSATION_DEBUG") {
            self.conversation.debug = parse_bool("VOICECART_CONVERSATION_DEBUG", &value)?;
        }
        if let Some(value) = read_env("VOICECART_CONVERSATION_STRICT_FLOW") {
            self.conversation.strict_flow =
                parse_bool("VOICECART_CONVERSATION_STRICT_FLOW", &value)?;
        }
        if let Some(value) = read_env("VOICECART_CONVERSATION_UNKNOWN_INTENT") {
            self.conversation.unknown_intent = value.parse()?;
        }
        if let Some(value) = read_env("VOICECART_CONVERSATION_FALLBACK_MESSAGE") {
            self.conversation.fallback_message = value;
        }

        if let Some(value) = read_env("VOICECART_PAYMENTS_GATEWAY") {
            self.payments.gateway = value;
        }
        if let Some(value) = read_env("VOICECART_PAYMENTS_SDK_VERSION") {
            self.payments.sdk_version = value;
        }
        if let Some(value) = read_env("VOICECART_PAYMENTS_API_VERSION") {
            self.payments.api_version = value;
        }
        if let Some(value) = read_env("VOICECART_PAYMENTS_MERCHANT_ID") {
            self.payments.merchant_id = value;
        }
        if let Some(value) = read_env("VOICECART_PAYMENTS_CLIENT_KEY") {
            self.payments.client_key = secret_value(value);
        }
        if let Some(value) = read_env("VOICECART_PAYMENTS_AUTHORIZATION_FINGERPRINT") {
            self.payments.authorization_fingerprint = secret_value(value);
        }
        if let Some(value) = read_env("VOICECART_PAYMENTS_CARD_DISPLAY_NAME") {
            self.payments.card_display_name = value;
        }

        if let Some(value) = read_env("VOICECART_ORDERS_ID_STRATEGY") {
            self.orders.id_strategy = value.parse()?;
        }
        if let Some(value) = read_env("VOICECART_ORDERS_CUSTOMER_SERVICE_URL") {
            self.orders.customer_service_url = value;
        }

        let log_level =
            read_env("VOICECART_LOGGING_LEVEL").or_else(|| read_env("VOICECART_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VOICECART_LOGGING_FORMAT").or_else(|| read_env("VOICECART_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(debug) = overrides.debug {
            self.conversation.debug = debug;
        }
        if let Some(strict_flow) = overrides.strict_flow {
            self.conversation.strict_flow = strict_flow;
        }
        if let Some(id_strategy) = overrides.id_strategy {
            self.orders.id_strategy = id_strategy;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_conversation(&self.conversation)?;
        validate_payments(&self.payments)?;
        validate_orders(&self.orders)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
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
        if ch != '$' || !matches!(chars.peek(), Some('{')) {
            output.push(ch);
            continue;
        }

        chars.next();
        let mut key = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(next) => key.push(next),
                None => return Err(ConfigError::UnterminatedInterpolation),
            }
        }

        let value =
            env::var(&key).map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
        output.push_str(&value);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_conversation(conversation: &ConversationConfig) -> Result<(), ConfigError> {
    if conversation.unknown_intent == UnknownIntentPolicy::Fallback
        && conversation.fallback_message.trim().is_empty()
    {
        return Err(ConfigError::Validation(
            "conversation.fallback_message is required when unknown_intent = \"fallback\""
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_payments(payments: &PaymentsConfig) -> Result<(), ConfigError> {
    let required = [
        ("payments.gateway", payments.gateway.as_str()),
        ("payments.sdk_version", payments.sdk_version.as_str()),
        ("payments.api_version", payments.api_version.as_str()),
        ("payments.merchant_id", payments.merchant_id.as_str()),
        ("payments.client_key", payments.client_key.expose_secret()),
        ("payments.authorization_fingerprint", payments.authorization_fingerprint.expose_secret()),
        ("payments.card_display_name", payments.card_display_name.as_str()),
    ];
    if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }

    Ok(())
}

fn validate_orders(orders: &OrdersConfig) -> Result<(), ConfigError> {
    let url = orders.customer_service_url.as_str();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "orders.customer_service_url must start with http:// or https://".to_string(),
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

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    conversation: Option<ConversationPatch>,
    payments: Option<PaymentsPatch>,
    orders: Option<OrdersPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationPatch {
    debug: Option<bool>,
    strict_flow: Option<bool>,
    unknown_intent: Option<UnknownIntentPolicy>,
    fallback_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentsPatch {
    gateway: Option<String>,
    sdk_version: Option<String>,
    api_version: Option<String>,
    merchant_id: Option<String>,
    client_key: Option<String>,
    authorization_fingerprint: Option<String>,
    card_display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OrdersPatch {
    id_strategy: Option<OrderIdStrategy>,
    customer_service_url: Option<String>,
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

    use super::{
        AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, OrderIdStrategy,
        UnknownIntentPolicy,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_any_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.server.port == 8080, "default port should be 8080")?;
        ensure(config.payments.gateway == "braintree", "default gateway should be braintree")?;
        ensure(
            config.orders.id_strategy == OrderIdStrategy::Random,
            "order ids should be random by default",
        )?;
        ensure(
            config.conversation.unknown_intent == UnknownIntentPolicy::Reject,
            "unknown intents should be rejected by default",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_GATEWAY_CLIENT_KEY", "production_key_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("voicecart.toml");
            fs::write(
                &path,
                r#"
[payments]
merchant_id = "merchant-42"
client_key = "${TEST_GATEWAY_CLIENT_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.payments.client_key.expose_secret() == "production_key_from_env",
                "client key should be interpolated from environment",
            )?;
            ensure(config.payments.merchant_id == "merchant-42", "merchant id should come from file")
        })();

        clear_vars(&["TEST_GATEWAY_CLIENT_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("voicecart.toml");
        fs::write(&path, "[payments]\nclient_key = \"${VOICECART_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "VOICECART_TEST_UNSET_VAR"),
            "missing variable should be named in the error",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOICECART_LOG_LEVEL", "warn");
        env::set_var("VOICECART_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["VOICECART_LOG_LEVEL", "VOICECART_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOICECART_SERVER_PORT", "9100");
        env::set_var("VOICECART_CONVERSATION_STRICT_FLOW", "true");
        env::set_var("VOICECART_ORDERS_ID_STRATEGY", "sequential");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("voicecart.toml");
            fs::write(
                &path,
                r#"
[server]
port = 9000
bind_address = "0.0.0.0"

[conversation]
debug = true
unknown_intent = "fallback"

[orders]
id_strategy = "random"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    port: Some(9200),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.server.port == 9200, "override port should win")?;
            ensure(config.server.bind_address == "0.0.0.0", "file bind address should apply")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.conversation.debug, "file debug flag should apply")?;
            ensure(config.conversation.strict_flow, "env strict flow should apply")?;
            ensure(
                config.conversation.unknown_intent == UnknownIntentPolicy::Fallback,
                "file unknown-intent policy should apply",
            )?;
            ensure(
                config.orders.id_strategy == OrderIdStrategy::Sequential,
                "env id strategy should win over file",
            )
        })();

        clear_vars(&[
            "VOICECART_SERVER_PORT",
            "VOICECART_CONVERSATION_STRICT_FLOW",
            "VOICECART_ORDERS_ID_STRATEGY",
        ]);
        result
    }

    #[test]
    fn invalid_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOICECART_CONVERSATION_DEBUG", "sometimes");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected env override failure".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "VOICECART_CONVERSATION_DEBUG"),
                "invalid boolean should name the variable",
            ),
        };

        clear_vars(&["VOICECART_CONVERSATION_DEBUG"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOICECART_ORDERS_CUSTOMER_SERVICE_URL", "example.com/help");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("orders.customer_service_url")
            );
            ensure(has_message, "validation failure should mention orders.customer_service_url")
        })();

        clear_vars(&["VOICECART_ORDERS_CUSTOMER_SERVICE_URL"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should fail",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOICECART_PAYMENTS_CLIENT_KEY", "client-key-secret-value");
        env::set_var("VOICECART_PAYMENTS_AUTHORIZATION_FINGERPRINT", "fingerprint-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("client-key-secret-value"),
                "debug output should not contain the client key",
            )?;
            ensure(
                !debug.contains("fingerprint-secret-value"),
                "debug output should not contain the authorization fingerprint",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(&[
            "VOICECART_PAYMENTS_CLIENT_KEY",
            "VOICECART_PAYMENTS_AUTHORIZATION_FINGERPRINT",
        ]);
        result
    }
}
