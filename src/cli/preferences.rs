//! `labchat settings`: reply settings outside a chat session.

use std::error::Error;

use crate::core::settings::{parse_switch, LocalStorage, SettingKey, UserSettings};

pub fn run_settings(
    storage: &LocalStorage,
    key: Option<&str>,
    value: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let Some(key) = key else {
        print_settings(&UserSettings::load(storage));
        return Ok(());
    };

    let (key, enabled) = apply_setting(storage, key, value)?;
    println!(
        "✅ {} {}",
        key.label(),
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Sets `key` to `value` (or flips it) and writes the result back.
pub fn apply_setting(
    storage: &LocalStorage,
    key: &str,
    value: Option<&str>,
) -> Result<(SettingKey, bool), Box<dyn Error>> {
    let setting = SettingKey::parse(key).ok_or_else(|| {
        let known: Vec<&str> = SettingKey::ALL.iter().map(|key| key.as_str()).collect();
        format!("Unknown setting: {key} (expected one of {})", known.join(", "))
    })?;
    let explicit = match value {
        Some(raw) => Some(parse_switch(raw).ok_or_else(|| format!("Expected on or off, got '{raw}'"))?),
        None => None,
    };

    let mut settings = UserSettings::load(storage);
    let enabled = explicit.unwrap_or(!settings.get(setting));
    settings.set(setting, enabled);
    settings.save(storage)?;
    Ok((setting, enabled))
}

fn print_settings(settings: &UserSettings) {
    println!("Reply settings:");
    for key in SettingKey::ALL {
        let state = if settings.get(key) { "on" } else { "off" };
        println!("  {}: {state}", key.as_str());
    }
}
