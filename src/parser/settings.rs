//! Settings file decoding
//!
//! Local `settings.local.json` files are read best-effort: anything unusual
//! becomes a [`SettingsDecode`] value rather than an error. The global file
//! is different, because it is about to be rewritten: [`SettingsDocument`]
//! refuses to load a file it could not faithfully round-trip.

use serde_json::{Map, Value};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ConsolidateError, Result};
use crate::fs::FileSystem;
use crate::rules::{Category, RuleSet};

/// Outcome of reading one local settings file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsDecode {
    Ok(RuleSet),
    /// Not JSON, not an object, unreadable, or `permissions` of the wrong shape
    Malformed,
    NotFound,
}

impl SettingsDecode {
    pub fn into_rule_set(self) -> Option<RuleSet> {
        match self {
            SettingsDecode::Ok(rules) => Some(rules),
            SettingsDecode::Malformed | SettingsDecode::NotFound => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SettingsDecode::Ok(_))
    }
}

/// Read and decode the permissions of a settings file
pub fn parse_file<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> SettingsDecode {
    let content = match fs.read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file vanished before parsing");
            return SettingsDecode::NotFound;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read settings file, skipping");
            return SettingsDecode::Malformed;
        }
    };

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "settings file is not valid JSON, skipping");
            return SettingsDecode::Malformed;
        }
    };

    match rule_set_from_value(&value) {
        Some(rules) => SettingsDecode::Ok(rules),
        None => {
            warn!(
                path = %path.display(),
                "settings file has no usable permissions object, skipping"
            );
            SettingsDecode::Malformed
        }
    }
}

/// Extract a [`RuleSet`] from a decoded settings value.
///
/// Returns `None` when the top level is not an object (arrays included) or
/// `permissions` is present but not an object.
pub fn rule_set_from_value(value: &Value) -> Option<RuleSet> {
    let root = value.as_object()?;
    let permissions = match root.get("permissions") {
        None => return Some(RuleSet::new()),
        Some(p) => p.as_object()?,
    };

    let mut rules = RuleSet::new();
    for category in Category::ALL {
        let Some(entries) = permissions.get(category.as_str()) else {
            continue;
        };
        let Some(entries) = entries.as_array() else {
            debug!(category = %category, "permission category is not an array, ignoring");
            continue;
        };
        for entry in entries {
            match entry.as_str() {
                Some(raw) => {
                    rules.insert(category, raw);
                }
                None => debug!(
                    category = %category,
                    entry = %entry,
                    "dropping non-string permission entry"
                ),
            }
        }
    }
    Some(rules)
}

/// The global settings file, kept whole so unrelated fields survive a rewrite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDocument {
    root: Map<String, Value>,
}

impl SettingsDocument {
    /// Load the global settings file. A missing file is an empty document.
    pub fn load<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Self> {
        let content = match fs.read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "global settings file does not exist yet");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConsolidateError::GlobalUnreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let value: Value =
            serde_json::from_str(&content).map_err(|source| ConsolidateError::GlobalMalformed {
                path: path.to_path_buf(),
                source,
            })?;

        if rule_set_from_value(&value).is_none() {
            return Err(ConsolidateError::GlobalNotObject {
                path: path.to_path_buf(),
            });
        }
        if let Some(category) = lossy_category(&value) {
            return Err(ConsolidateError::GlobalInvalidCategory {
                path: path.to_path_buf(),
                category: category.to_string(),
            });
        }

        Self::from_value(value).ok_or_else(|| ConsolidateError::GlobalNotObject {
            path: path.to_path_buf(),
        })
    }

    /// Wrap a decoded value; `None` if it cannot hold permissions or a
    /// rewrite would drop entries it cannot represent
    pub fn from_value(value: Value) -> Option<Self> {
        rule_set_from_value(&value)?;
        if lossy_category(&value).is_some() {
            return None;
        }
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    pub fn rule_set(&self) -> RuleSet {
        rule_set_from_value(&Value::Object(self.root.clone())).unwrap_or_default()
    }

    /// A copy of this document whose `permissions.allow|deny|ask` are
    /// replaced by `rules`. Every other field is kept as is.
    pub fn with_rule_set(&self, rules: &RuleSet) -> Self {
        let mut root = self.root.clone();
        let permissions = root
            .entry("permissions")
            .or_insert_with(|| Value::Object(Map::new()));
        if !permissions.is_object() {
            *permissions = Value::Object(Map::new());
        }
        if let Value::Object(permissions) = permissions {
            for category in Category::ALL {
                let entries = rules
                    .get(category)
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect();
                permissions.insert(category.as_str().to_string(), Value::Array(entries));
            }
        }
        Self { root }
    }

    /// Canonical serialization: sorted keys, two-space indent, trailing newline
    pub fn to_canonical_string(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(&sorted(&Value::Object(self.root.clone())))?;
        out.push('\n');
        Ok(out)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }
}

/// First category that is not an array of strings. Rewriting it would
/// discard the offending values.
fn lossy_category(value: &Value) -> Option<Category> {
    let permissions = value.get("permissions")?.as_object()?;
    Category::ALL
        .into_iter()
        .find(|category| match permissions.get(category.as_str()) {
            None => false,
            Some(Value::Array(entries)) => !entries.iter().all(Value::is_string),
            Some(_) => true,
        })
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), sorted(&map[k])))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
