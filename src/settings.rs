use crate::config::{Language, PageSize};
use dashmap::DashMap;
use serenity::{
	async_trait,
	model::id::{ChannelId, GuildId},
	utils::MessageBuilder,
};
use std::io::Error as IoError;
use thiserror::Error;
use tokio_postgres::Error as SqlError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuildSettings {
	pub language: Language,
	pub page_size: PageSize,
	/// Empty means every channel is allowed.
	pub channels: Vec<ChannelId>,
}

impl Default for GuildSettings {
	fn default() -> Self {
		Self {
			language: Language::English,
			page_size: PageSize::Five,
			channels: vec![],
		}
	}
}

impl GuildSettings {
	pub fn allows(&self, channel: ChannelId) -> bool {
		self.channels.is_empty() || self.channels.contains(&channel)
	}

	pub fn to_summary(&self) -> String {
		let channels = if self.channels.is_empty() {
			"All".to_string()
		} else {
			self.channels
				.iter()
				.map(|c| c.to_string())
				.collect::<Vec<_>>()
				.join(", ")
		};

		let mut builder = MessageBuilder::new();

		builder.push_line(format!("Language: {}", self.language.to_str()));
		builder.push_line(format!("Page Size: {}", self.page_size.get()));
		builder.push(format!("Usable Channels: {}", channels));

		builder.build()
	}
}

/// A single mutable per-guild value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettingField {
	Language(Language),
	PageSize(PageSize),
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Db(#[from] SqlError),
	#[error("couldn't read query file: {0}")]
	Io(#[from] IoError),
	#[error("statement {0} was never prepared")]
	MissingStatement(String),
	#[error("stored value for guild {0} is invalid")]
	Corrupt(GuildId),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
	/// Unknown guilds read as defaults.
	async fn get_by_guild_id(&self, guild: GuildId) -> Result<GuildSettings, StoreError>;

	async fn set_field(&self, guild: GuildId, field: SettingField) -> Result<(), StoreError>;

	async fn add_channel(&self, guild: GuildId, channel: ChannelId) -> Result<(), StoreError>;

	async fn remove_channel(&self, guild: GuildId, channel: ChannelId) -> Result<(), StoreError>;
}

/// Settings kept for the lifetime of the process only.
#[derive(Default)]
pub struct MemorySettings {
	guilds: DashMap<GuildId, GuildSettings>,
}

impl MemorySettings {
	pub fn new() -> Self {
		Default::default()
	}
}

#[async_trait]
impl SettingsStore for MemorySettings {
	async fn get_by_guild_id(&self, guild: GuildId) -> Result<GuildSettings, StoreError> {
		Ok(self
			.guilds
			.get(&guild)
			.map(|s| s.value().clone())
			.unwrap_or_default())
	}

	async fn set_field(&self, guild: GuildId, field: SettingField) -> Result<(), StoreError> {
		let mut entry = self.guilds.entry(guild).or_default();

		match field {
			SettingField::Language(l) => entry.language = l,
			SettingField::PageSize(p) => entry.page_size = p,
		}

		Ok(())
	}

	async fn add_channel(&self, guild: GuildId, channel: ChannelId) -> Result<(), StoreError> {
		let mut entry = self.guilds.entry(guild).or_default();

		if !entry.channels.contains(&channel) {
			entry.channels.push(channel);
		}

		Ok(())
	}

	async fn remove_channel(&self, guild: GuildId, channel: ChannelId) -> Result<(), StoreError> {
		if let Some(mut entry) = self.guilds.get_mut(&guild) {
			entry.channels.retain(|c| *c != channel);
		}

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[tokio::test]
	async fn unknown_guild_reads_defaults() {
		let store = MemorySettings::new();
		let settings = store.get_by_guild_id(GuildId::new(1)).await.unwrap();

		assert_eq!(settings, GuildSettings::default());
	}

	#[tokio::test]
	async fn repeated_writes_are_idempotent() {
		let store = MemorySettings::new();
		let guild = GuildId::new(1);

		for _ in 0..2 {
			store
				.set_field(guild, SettingField::PageSize(PageSize::Ten))
				.await
				.unwrap();
			store.add_channel(guild, ChannelId::new(5)).await.unwrap();
		}

		let settings = store.get_by_guild_id(guild).await.unwrap();
		assert_eq!(settings.page_size, PageSize::Ten);
		assert_eq!(settings.channels, vec![ChannelId::new(5)]);

		store.remove_channel(guild, ChannelId::new(5)).await.unwrap();
		store.remove_channel(guild, ChannelId::new(5)).await.unwrap();
		assert!(store.get_by_guild_id(guild).await.unwrap().channels.is_empty());
	}

	#[test]
	fn summary_lists_channels_or_all() {
		let mut settings = GuildSettings::default();
		assert_eq!(
			settings.to_summary(),
			"Language: en\nPage Size: 5\nUsable Channels: All"
		);

		settings.channels = vec![ChannelId::new(1), ChannelId::new(2)];
		assert!(settings.to_summary().ends_with("Usable Channels: 1, 2"));
	}

	#[test]
	fn allow_list_gates_channels() {
		let mut settings = GuildSettings::default();
		assert!(settings.allows(ChannelId::new(9)));

		settings.channels.push(ChannelId::new(1));
		assert!(settings.allows(ChannelId::new(1)));
		assert!(!settings.allows(ChannelId::new(9)));
	}
}
