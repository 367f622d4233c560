//! Theme lookup with graceful fallback to the built-in default.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{error, warn};
use serde_json::{Map, Value};

/// Theme used whenever the configured one has no manifest on disk.
pub const DEFAULT_THEME: &str = "merlin-light";

const THEMES_DIR: &str = "themes";
const MANIFEST_FILE: &str = "theme.json";

/// Outcome of [`resolve_theme`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThemeResolution {
    /// The requested theme has a manifest and is used as-is.
    Found(String),
    /// The requested theme is missing; the default theme is used instead.
    Substituted { requested: String },
}

impl ThemeResolution {
    /// Name of the theme that views are rendered with.
    pub fn effective(&self) -> &str {
        match self {
            ThemeResolution::Found(name) => name,
            ThemeResolution::Substituted { .. } => DEFAULT_THEME,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, ThemeResolution::Substituted { .. })
    }
}

/// Location of the manifest for `name`, or `None` when the name is not a
/// single plain path segment.
pub fn manifest_path(views_dir: &Path, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if !name.contains('\\') => Some(
            views_dir
                .join(THEMES_DIR)
                .join(segment)
                .join(MANIFEST_FILE),
        ),
        _ => None,
    }
}

/// Checks that `name` has a manifest under `views_dir`, substituting
/// [`DEFAULT_THEME`] with a single warning when it does not.
pub fn resolve_theme(views_dir: &Path, name: &str) -> ThemeResolution {
    match manifest_path(views_dir, name) {
        Some(path) if path.is_file() => ThemeResolution::Found(name.to_string()),
        _ => {
            warn!("No such theme as `{name}`. Falling back to `{DEFAULT_THEME}`.");
            ThemeResolution::Substituted {
                requested: name.to_string(),
            }
        }
    }
}

/// Reads the manifest of an already resolved theme.
///
/// An unreadable manifest yields an empty object so rendering can proceed.
pub fn load_manifest(views_dir: &Path, name: &str) -> Value {
    let Some(path) = manifest_path(views_dir, name) else {
        error!("Theme name `{name}` is not a valid directory name");
        return Value::Object(Map::new());
    };

    let parsed = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Failed to load theme manifest {}: {e}", path.display());
            Value::Object(Map::new())
        }
    }
}
