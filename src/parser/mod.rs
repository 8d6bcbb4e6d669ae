//! Parsing for claude-consolidate
//!
//! Turns raw rule strings and settings files into the permission model.

pub mod rule;
pub mod settings;

pub use rule::parse_rule;
pub use settings::{parse_file, SettingsDecode, SettingsDocument};
