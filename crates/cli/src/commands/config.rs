use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use voicecart_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILES};

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl Field {
    fn new(key: &'static str, env_keys: &'static [&'static str], value: impl Into<String>) -> Self {
        Self { key, env_keys, value: value.into() }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field::new(
            "server.bind_address",
            &["VOICECART_SERVER_BIND_ADDRESS"],
            config.server.bind_address.as_str(),
        ),
        Field::new("server.port", &["VOICECART_SERVER_PORT"], config.server.port.to_string()),
        Field::new(
            "server.graceful_shutdown_secs",
            &["VOICECART_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        Field::new(
            "conversation.debug",
            &["VOICECART_CONVERSATION_DEBUG"],
            config.conversation.debug.to_string(),
        ),
        Field::new(
            "conversation.strict_flow",
            &["VOICECART_CONVERSATION_STRICT_FLOW"],
            config.conversation.strict_flow.to_string(),
        ),
        Field::new(
            "conversation.unknown_intent",
            &["VOICECART_CONVERSATION_UNKNOWN_INTENT"],
            format!("{:?}", config.conversation.unknown_intent),
        ),
        Field::new(
            "conversation.fallback_message",
            &["VOICECART_CONVERSATION_FALLBACK_MESSAGE"],
            config.conversation.fallback_message.as_str(),
        ),
        Field::new(
            "payments.gateway",
            &["VOICECART_PAYMENTS_GATEWAY"],
            config.payments.gateway.as_str(),
        ),
        Field::new(
            "payments.sdk_version",
            &["VOICECART_PAYMENTS_SDK_VERSION"],
            config.payments.sdk_version.as_str(),
        ),
        Field::new(
            "payments.api_version",
            &["VOICECART_PAYMENTS_API_VERSION"],
            config.payments.api_version.as_str(),
        ),
        Field::new(
            "payments.merchant_id",
            &["VOICECART_PAYMENTS_MERCHANT_ID"],
            config.payments.merchant_id.as_str(),
        ),
        Field::new(
            "payments.client_key",
            &["VOICECART_PAYMENTS_CLIENT_KEY"],
            redact_secret(config.payments.client_key.expose_secret()),
        ),
        Field::new(
            "payments.authorization_fingerprint",
            &["VOICECART_PAYMENTS_AUTHORIZATION_FINGERPRINT"],
            redact_secret(config.payments.authorization_fingerprint.expose_secret()),
        ),
        Field::new(
            "payments.card_display_name",
            &["VOICECART_PAYMENTS_CARD_DISPLAY_NAME"],
            config.payments.card_display_name.as_str(),
        ),
        Field::new(
            "orders.id_strategy",
            &["VOICECART_ORDERS_ID_STRATEGY"],
            format!("{:?}", config.orders.id_strategy),
        ),
        Field::new(
            "orders.customer_service_url",
            &["VOICECART_ORDERS_CUSTOMER_SERVICE_URL"],
            config.orders.customer_service_url.as_str(),
        ),
        Field::new(
            "logging.level",
            &["VOICECART_LOGGING_LEVEL", "VOICECART_LOG_LEVEL"],
            config.logging.level.as_str(),
        ),
        Field::new(
            "logging.format",
            &["VOICECART_LOGGING_FORMAT", "VOICECART_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the environment prefix (`sandbox_`, `production_`) and hides the rest.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('_') {
        return format!("{prefix}_***");
    }

    "<redacted>".to_string()
}
