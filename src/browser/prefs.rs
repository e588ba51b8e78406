//! Chrome profile Preferences patching
//!
//! Chrome offers to translate hh.ru pages on every load, which steals focus
//! from the modal the workflow is typing into. The translate prompt has no
//! command-line switch, so it is disabled directly in the profile's
//! `Preferences` file before launch. All other keys in the file are
//! preserved.

use std::path::Path;

use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Disable the translate feature in `<user_data_dir>/Default/Preferences`.
///
/// Creates the profile directory and the file when they do not exist yet.
/// Callers treat failure as a warning, not a fatal error; the automation
/// still works with the prompt present, just less smoothly.
#[instrument]
pub async fn disable_translate(user_data_dir: &Path) -> Result<()> {
    let default_dir = user_data_dir.join("Default");
    let prefs_path = default_dir.join("Preferences");

    tokio::fs::create_dir_all(&default_dir).await?;

    let prefs: Value = match tokio::fs::read_to_string(&prefs_path).await {
        Ok(content) => serde_json::from_str(&content)?,
        Err(_) => {
            info!("Creating new Preferences file");
            json!({})
        }
    };

    // Anything that is not an object (including a corrupt file) is rebuilt.
    let mut root = match prefs {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    let mut translate = match root.remove("translate") {
        Some(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    translate.insert("enabled".to_string(), Value::Bool(false));
    root.insert("translate".to_string(), Value::Object(translate));

    let patched = Value::Object(root);
    tokio::fs::write(&prefs_path, serde_json::to_string_pretty(&patched)?).await?;

    debug!("Translation disabled in {}", prefs_path.display());
    Ok(())
}
