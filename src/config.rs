use crate::{constants::*, lang::StringKey};
use enum_primitive::*;
use serde::Deserialize;
use std::{fs, io::Error as IoError, path::Path};
use thiserror::Error;
use tracing::Level;

enum_from_primitive! {
/// Display language of a guild, stored by discriminant.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Language {
	English = 0,
	German,
	French,
	Polish,
	Portuguese,
	Russian,
	Chinese,
}
}

const LANGUAGES: &[&str] = &["en", "de", "fr", "pl", "pt", "ru", "zh"];

impl Language {
	pub const LABEL_LIST: &'static [&'static str] = LANGUAGES;

	pub fn to_str(self) -> &'static str {
		LANGUAGES[self as usize]
	}

	/// Case-insensitive lookup of a language code.
	pub fn from_str(label: &str) -> Option<Self> {
		LANGUAGES
			.iter()
			.position(|code| code.eq_ignore_ascii_case(label))
			.and_then(|i| Self::from_i64(i as i64))
	}
}

impl Default for Language {
	fn default() -> Self {
		Self::English
	}
}

enum_from_primitive! {
/// Number of cards returned per filtered search.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PageSize {
	Five = 5,
	Ten = 10,
	Fifteen = 15,
}
}

const PAGE_SIZES: &[PageSize] = &[PageSize::Five, PageSize::Ten, PageSize::Fifteen];

impl PageSize {
	pub fn get(self) -> i32 {
		self as i32
	}

	pub fn from_value(val: i64) -> Option<Self> {
		Self::from_i64(val)
	}

	pub fn list_string() -> String {
		PAGE_SIZES
			.iter()
			.map(|p| p.get().to_string())
			.collect::<Vec<_>>()
			.join(", ")
	}
}

impl Default for PageSize {
	fn default() -> Self {
		Self::Five
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigParseError {
	ArgumentsIncorrect,
	BadNumber,
	InvalidAction,
	InvalidLanguage,
	InvalidPageSize,
}

impl ConfigParseError {
	pub fn string_key(self) -> StringKey {
		match self {
			Self::ArgumentsIncorrect => StringKey::ArgumentsIncorrect,
			Self::BadNumber => StringKey::Error,
			Self::InvalidAction => StringKey::InvalidAction,
			Self::InvalidLanguage => StringKey::InvalidLanguage,
			Self::InvalidPageSize => StringKey::InvalidPageSize,
		}
	}

	/// Valid options appended after the localized text, if any.
	pub fn options_suffix(self) -> Option<String> {
		match self {
			Self::InvalidLanguage => Some(Language::LABEL_LIST.join(", ")),
			Self::InvalidPageSize => Some(PageSize::list_string()),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
	pub user: String,
	pub host: String,
	pub password: String,
	pub port: Option<u16>,
	pub dbname: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
	#[serde(default = "default_endpoint")]
	pub endpoint: String,
	#[serde(default = "default_image_base")]
	pub image_base: String,
}

fn default_endpoint() -> String {
	DEFAULT_API_ENDPOINT.to_string()
}

fn default_image_base() -> String {
	DEFAULT_IMAGE_BASE.to_string()
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			endpoint: default_endpoint(),
			image_base: default_image_base(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub token: String,
	pub database: Option<DatabaseConfig>,
	#[serde(default)]
	pub api: ApiConfig,
	pub strings: Option<String>,
	pub log_level: Option<String>,
	#[serde(default)]
	pub strict_filters: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("couldn't read config file: {0}")]
	Io(#[from] IoError),
	#[error("config file is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("unknown log level {0:?}")]
	LogLevel(String),
}

impl Config {
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let text = fs::read_to_string(path)?;
		Self::from_json(&text)
	}

	pub fn from_json(text: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(text)?)
	}

	pub fn log_level(&self) -> Result<Level, ConfigError> {
		match &self.log_level {
			Some(level) => level
				.parse::<Level>()
				.map_err(|_| ConfigError::LogLevel(level.clone())),
			None => Ok(Level::ERROR),
		}
	}
}
