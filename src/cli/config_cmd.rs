//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::capture::CapturePreset;
use crate::domain::config::{
    AppConfig, BackgroundConfig, LocationConfig, PermissionsConfig,
};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;
use crate::domain::status::{LocationAccuracy, LocationMode};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match get_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = get_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

fn one_of(key: &str, value: &str, valid: &[&str]) -> Result<(), ConfigError> {
    if valid.contains(&value.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(invalid(
            key,
            format!("Invalid value '{}'. Valid: {}", value, valid.join(", ")),
        ))
    }
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "tick" => {
            let tick = value
                .parse::<Duration>()
                .map_err(|e| invalid(key, e.to_string()))?;
            if !tick.is_valid_tick() {
                return Err(invalid(key, "Tick must be between 50ms and 1s"));
            }
        }
        "storage_poll_interval"
        | "battery_poll_interval"
        | "background.interval"
        | "background.capture_duration"
        | "background.budget"
        | "location.time_interval" => {
            let duration = value
                .parse::<Duration>()
                .map_err(|e| invalid(key, e.to_string()))?;
            if duration.as_millis() == 0 {
                return Err(invalid(key, "Duration must be greater than zero"));
            }
        }
        "quality" => {
            value.parse::<CapturePreset>()?;
        }
        "notify" | "background.enabled" | "location.enabled" => {
            parse_bool(key, value)?;
        }
        "location.mode" => {
            value.parse::<LocationMode>()?;
        }
        "location.accuracy" => {
            value.parse::<LocationAccuracy>()?;
        }
        "location.source" => one_of(key, value, &["ip", "fixed"])?,
        "location.distance_interval" => {
            let meters = parse_f64(key, value)?;
            if meters < 0.0 {
                return Err(invalid(key, "Distance must not be negative"));
            }
        }
        "location.latitude" => {
            let latitude = parse_f64(key, value)?;
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(invalid(key, "Latitude must be between -90 and 90"));
            }
        }
        "location.longitude" => {
            let longitude = parse_f64(key, value)?;
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(invalid(key, "Longitude must be between -180 and 180"));
            }
        }
        "permissions.microphone" => one_of(key, value, &["granted", "denied"])?,
        "permissions.location" => one_of(key, value, &["denied", "foreground", "background"])?,
        _ => {} // recordings_dir and location.endpoint accept any string
    }
    Ok(())
}

/// Store a validated value under `key`
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let text = Some(value.to_string());
    match key {
        "recordings_dir" => config.recordings_dir = text,
        "tick" => config.tick = text,
        "quality" => config.quality = Some(value.to_lowercase()),
        "notify" => config.notify = Some(parse_bool(key, value)?),
        "storage_poll_interval" => config.storage_poll_interval = text,
        "battery_poll_interval" => config.battery_poll_interval = text,
        "background.enabled" => background(config).enabled = Some(parse_bool(key, value)?),
        "background.interval" => background(config).interval = text,
        "background.capture_duration" => background(config).capture_duration = text,
        "background.budget" => background(config).budget = text,
        "location.enabled" => location(config).enabled = Some(parse_bool(key, value)?),
        "location.mode" => location(config).mode = Some(value.to_lowercase()),
        "location.accuracy" => location(config).accuracy = Some(value.to_lowercase()),
        "location.time_interval" => location(config).time_interval = text,
        "location.distance_interval" => {
            location(config).distance_interval = Some(parse_f64(key, value)?)
        }
        "location.source" => location(config).source = Some(value.to_lowercase()),
        "location.endpoint" => location(config).endpoint = text,
        "location.latitude" => location(config).latitude = Some(parse_f64(key, value)?),
        "location.longitude" => location(config).longitude = Some(parse_f64(key, value)?),
        "permissions.microphone" => permissions(config).microphone = Some(value.to_lowercase()),
        "permissions.location" => permissions(config).location = Some(value.to_lowercase()),
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

/// Read the raw value stored under `key`
fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    let background = config.background.as_ref();
    let location = config.location.as_ref();
    let permissions = config.permissions.as_ref();

    match key {
        "recordings_dir" => config.recordings_dir.clone(),
        "tick" => config.tick.clone(),
        "quality" => config.quality.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        "storage_poll_interval" => config.storage_poll_interval.clone(),
        "battery_poll_interval" => config.battery_poll_interval.clone(),
        "background.enabled" => background.and_then(|b| b.enabled).map(|b| b.to_string()),
        "background.interval" => background.and_then(|b| b.interval.clone()),
        "background.capture_duration" => background.and_then(|b| b.capture_duration.clone()),
        "background.budget" => background.and_then(|b| b.budget.clone()),
        "location.enabled" => location.and_then(|l| l.enabled).map(|b| b.to_string()),
        "location.mode" => location.and_then(|l| l.mode.clone()),
        "location.accuracy" => location.and_then(|l| l.accuracy.clone()),
        "location.time_interval" => location.and_then(|l| l.time_interval.clone()),
        "location.distance_interval" => location
            .and_then(|l| l.distance_interval)
            .map(|d| d.to_string()),
        "location.source" => location.and_then(|l| l.source.clone()),
        "location.endpoint" => location.and_then(|l| l.endpoint.clone()),
        "location.latitude" => location.and_then(|l| l.latitude).map(|d| d.to_string()),
        "location.longitude" => location.and_then(|l| l.longitude).map(|d| d.to_string()),
        "permissions.microphone" => permissions.and_then(|p| p.microphone.clone()),
        "permissions.location" => permissions.and_then(|p| p.location.clone()),
        _ => None,
    }
}

fn background(config: &mut AppConfig) -> &mut BackgroundConfig {
    config.background.get_or_insert_with(BackgroundConfig::default)
}

fn location(config: &mut AppConfig) -> &mut LocationConfig {
    config.location.get_or_insert_with(LocationConfig::default)
}

fn permissions(config: &mut AppConfig) -> &mut PermissionsConfig {
    config.permissions.get_or_insert_with(PermissionsConfig::default)
}

/// Parse a boolean value
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, "Value must be 'true' or 'false'")),
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(key, format!("'{}' is not a number", value)))
}
