use std::borrow::Cow;

use rust_embed::RustEmbed;

use crate::domain::ConfigurationError;

/// Embed the entire `assets/` directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

const DEFAULT_ROSTER: &str = "default_roster.json";

/// Returns the contents of `assets/default_roster.json`.
pub fn default_roster_json() -> Result<String, ConfigurationError> {
    load_text(DEFAULT_ROSTER)
}

fn load_text(path: &str) -> Result<String, ConfigurationError> {
    let asset = load_asset(path).ok_or_else(|| {
        ConfigurationError::MalformedRoster(format!("embedded asset {path} is missing"))
    })?;
    String::from_utf8(asset.into_owned()).map_err(|_| {
        ConfigurationError::MalformedRoster(format!("embedded asset {path} is not valid UTF-8"))
    })
}

fn load_asset(path: &str) -> Option<Cow<'static, [u8]>> {
    EmbeddedAssets::get(&canonical_asset_path(path)).map(|file| file.data)
}

fn canonical_asset_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix("assets/") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}
