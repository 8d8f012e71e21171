use serenity::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum NationError {
	#[error("no nation is called {0:?}")]
	Unknown(String),
}

#[async_trait]
pub trait NationResolver: Send + Sync {
	async fn name_to_id(&self, name: &str) -> Result<i32, NationError>;
}

/// Playable nations and the names players commonly use for them.
const NATIONS: &[(i32, &[&str])] = &[
	(1, &["germany", "german", "ger"]),
	(2, &["britain", "uk", "british", "gb"]),
	(3, &["japan", "japanese", "jp"]),
	(4, &["soviet", "ussr", "soviets", "sov", "russia"]),
	(5, &["usa", "us", "america", "american"]),
	(7, &["france", "french", "fr"]),
	(8, &["italy", "italian", "ita"]),
	(9, &["poland", "polish", "pol"]),
	(10, &["finland", "finnish", "fin"]),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct NationTable;

impl NationTable {
	pub fn lookup(name: &str) -> Option<i32> {
		let name = name.trim();

		NATIONS
			.iter()
			.find(|(_, names)| names.iter().any(|n| n.eq_ignore_ascii_case(name)))
			.map(|(id, _)| *id)
	}
}

#[async_trait]
impl NationResolver for NationTable {
	async fn name_to_id(&self, name: &str) -> Result<i32, NationError> {
		Self::lookup(name).ok_or_else(|| NationError::Unknown(name.to_string()))
	}
}
