use crate::config::{ConfigError, Language};
use std::{collections::HashMap, fs, path::Path};
use tracing::warn;

const DEFAULT_STRINGS: &str = include_str!("../lang/strings.json");

/// Every localized message the bot can send.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StringKey {
	ArgumentsIncorrect,
	Error,
	Fixed,
	InvalidAction,
	InvalidLanguage,
	InvalidPageSize,
	NoFix,
	NoResults,
	SettingChanged,
}

impl StringKey {
	pub fn to_str(self) -> &'static str {
		match self {
			Self::ArgumentsIncorrect => "arguments_incorrect",
			Self::Error => "error",
			Self::Fixed => "fixed",
			Self::InvalidAction => "invalid_action",
			Self::InvalidLanguage => "invalid_language",
			Self::InvalidPageSize => "invalid_page_size",
			Self::NoFix => "no_fix",
			Self::NoResults => "no_results",
			Self::SettingChanged => "setting_changed",
		}
	}
}

/// Language code -> string key -> display text.
pub struct Strings {
	table: HashMap<String, HashMap<String, String>>,
}

impl Strings {
	pub fn from_json(text: &str) -> Result<Self, ConfigError> {
		Ok(Self {
			table: serde_json::from_str(text)?,
		})
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		Self::from_json(&fs::read_to_string(path)?)
	}

	pub fn builtin() -> Self {
		Self::from_json(DEFAULT_STRINGS).unwrap_or_else(|e| {
			warn!("Built-in string table is broken: {}", e);
			Self {
				table: HashMap::new(),
			}
		})
	}

	/// Falls back to English, then to the raw key.
	pub fn get(&self, lang: Language, key: StringKey) -> String {
		let lookup = |code: &str| {
			self.table
				.get(code)
				.and_then(|strings| strings.get(key.to_str()))
		};

		lookup(lang.to_str())
			.or_else(|| lookup(Language::English.to_str()))
			.cloned()
			.unwrap_or_else(|| key.to_str().to_string())
	}
}
