use crate::{
	cards::{CardRecord, CardSource},
	command::{parse_filters, ChannelAction, Command, FilterVocab, SettingsCommand},
	config::{ConfigParseError, Language},
	constants::{MAX_ATTACHMENTS, SETTINGS_COLOUR},
	lang::{StringKey, Strings},
	nation::NationResolver,
	query::CardQuery,
	settings::{GuildSettings, SettingsStore},
};
use serenity::{
	async_trait,
	model::id::{ChannelId, GuildId},
	Result as SResult,
};
use std::sync::Arc;
use tracing::{error, trace};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChannelKind {
	Text,
	Direct,
	Other,
}

/// The parts of a chat message the bot acts on.
#[derive(Clone, Debug)]
pub struct Inbound {
	pub content: String,
	pub author_is_bot: bool,
	pub channel_id: ChannelId,
	pub channel_kind: ChannelKind,
	pub guild_id: Option<GuildId>,
	pub mentioned_channels: Vec<ChannelId>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyAttachment {
	pub source_url: String,
	pub filename: String,
}

impl From<&CardRecord> for ReplyAttachment {
	fn from(card: &CardRecord) -> Self {
		Self {
			source_url: card.image_url.clone(),
			filename: card.attachment_name(),
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyEmbed {
	pub colour: u32,
	pub fields: Vec<(String, String, bool)>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reply {
	pub content: Option<String>,
	pub embed: Option<ReplyEmbed>,
	pub attachments: Vec<ReplyAttachment>,
}

impl Reply {
	pub fn text(content: impl Into<String>) -> Self {
		Self {
			content: Some(content.into()),
			..Default::default()
		}
	}

	pub fn settings(settings: &GuildSettings) -> Self {
		Self {
			embed: Some(ReplyEmbed {
				colour: SETTINGS_COLOUR,
				fields: vec![("Settings:".into(), settings.to_summary(), true)],
			}),
			..Default::default()
		}
	}
}

/// Per-message access to the chat platform.
#[async_trait]
pub trait MessageContext: Send + Sync {
	/// Whether the author holds administrator rights in the source channel.
	async fn is_admin(&self) -> bool;

	/// Every channel which currently exists in the source guild.
	async fn guild_channels(&self) -> SResult<Vec<ChannelId>>;

	/// Delivery failures are logged, never retried.
	async fn send(&self, reply: Reply);
}

pub struct Dispatcher {
	settings: Arc<dyn SettingsStore>,
	cards: Arc<dyn CardSource>,
	nations: Arc<dyn NationResolver>,
	strings: Arc<Strings>,
	vocab: FilterVocab,
}

impl Dispatcher {
	pub fn new(
		settings: Arc<dyn SettingsStore>,
		cards: Arc<dyn CardSource>,
		nations: Arc<dyn NationResolver>,
		strings: Arc<Strings>,
		vocab: FilterVocab,
	) -> Self {
		Self {
			settings,
			cards,
			nations,
			strings,
			vocab,
		}
	}

	pub async fn handle(&self, ctx: &dyn MessageContext, msg: &Inbound) {
		if msg.author_is_bot || msg.channel_kind == ChannelKind::Other {
			return;
		}

		let command = match Command::classify(&msg.content) {
			Some(c) => c,
			None => return,
		};

		let settings = match msg.guild_id {
			Some(guild_id) => match self.settings.get_by_guild_id(guild_id).await {
				Ok(s) => s,
				Err(e) => {
					error!("Couldn't read settings for {}: {}", guild_id, e);
					self.say(ctx, Language::default(), StringKey::Error).await;
					return;
				},
			},
			None => GuildSettings::default(),
		};

		trace!("{:?} under {:?}", command, settings);

		match command {
			Command::Settings(args) => self.settings_command(ctx, msg, &settings, args).await,
			Command::Filtered(body) => self.filtered_search(ctx, msg, &settings, body).await,
			Command::Name(search) => self.name_search(ctx, msg, &settings, search).await,
		}
	}

	async fn say(&self, ctx: &dyn MessageContext, lang: Language, key: StringKey) {
		ctx.send(Reply::text(self.strings.get(lang, key))).await;
	}

	async fn settings_command(
		&self,
		ctx: &dyn MessageContext,
		msg: &Inbound,
		settings: &GuildSettings,
		args: &str,
	) {
		let guild_id = match msg.guild_id {
			Some(g) => g,
			None => return,
		};

		// Unauthorised users get no hint that the command exists.
		if !ctx.is_admin().await {
			return;
		}

		let lang = settings.language;

		let cmd = match SettingsCommand::parse(args) {
			Ok(Some(cmd)) => cmd,
			Ok(None) => return,
			Err(e) => {
				ctx.send(Reply::text(self.parse_error_text(lang, e))).await;
				return;
			},
		};

		let key = match cmd {
			SettingsCommand::List => {
				ctx.send(Reply::settings(settings)).await;
				return;
			},
			SettingsCommand::Fix => self.fix_channels(ctx, guild_id, settings).await,
			SettingsCommand::Set(field) => match self.settings.set_field(guild_id, field).await {
				Ok(()) => StringKey::SettingChanged,
				Err(e) => {
					error!("Couldn't store {:?} for {}: {}", field, guild_id, e);
					StringKey::Error
				},
			},
			SettingsCommand::Channels(action) => {
				self.update_channels(guild_id, action, &msg.mentioned_channels)
					.await
			},
		};

		self.say(ctx, lang, key).await;
	}

	fn parse_error_text(&self, lang: Language, e: ConfigParseError) -> String {
		let mut text = self.strings.get(lang, e.string_key());

		if let Some(options) = e.options_suffix() {
			text.push_str(&options);
		}

		text
	}

	/// Drops allow-list entries for channels which no longer exist.
	async fn fix_channels(
		&self,
		ctx: &dyn MessageContext,
		guild_id: GuildId,
		settings: &GuildSettings,
	) -> StringKey {
		if settings.channels.is_empty() {
			return StringKey::NoFix;
		}

		let existing = match ctx.guild_channels().await {
			Ok(chans) => chans,
			Err(e) => {
				error!("Couldn't list channels of {}: {:?}", guild_id, e);
				return StringKey::Error;
			},
		};

		for stale in settings.channels.iter().filter(|c| !existing.contains(c)) {
			if let Err(e) = self.settings.remove_channel(guild_id, *stale).await {
				error!("Couldn't remove channel {} from {}: {}", stale, guild_id, e);
				return StringKey::Error;
			}
		}

		StringKey::Fixed
	}

	async fn update_channels(
		&self,
		guild_id: GuildId,
		action: ChannelAction,
		channels: &[ChannelId],
	) -> StringKey {
		for chan in channels {
			let res = match action {
				ChannelAction::Add => self.settings.add_channel(guild_id, *chan).await,
				ChannelAction::Remove => self.settings.remove_channel(guild_id, *chan).await,
			};

			if let Err(e) = res {
				error!("Couldn't {:?} channel {} for {}: {}", action, chan, guild_id, e);
				return StringKey::Error;
			}
		}

		StringKey::SettingChanged
	}

	async fn filtered_search(
		&self,
		ctx: &dyn MessageContext,
		msg: &Inbound,
		settings: &GuildSettings,
		body: &str,
	) {
		if !settings.allows(msg.channel_id) {
			return;
		}

		let mut query = CardQuery::new(settings);
		query
			.apply_filters(parse_filters(body, self.vocab), &*self.nations)
			.await;

		match self.cards.cards(&query).await {
			Ok(page) if page.total_count == 0 => {
				self.say(ctx, settings.language, StringKey::NoResults).await
			},
			Ok(page) => {
				let mut content = Some(query.to_json());

				for chunk in page.records.chunks(MAX_ATTACHMENTS) {
					ctx.send(Reply {
						content: content.take(),
						attachments: chunk.iter().map(ReplyAttachment::from).collect(),
						..Default::default()
					})
					.await;
				}

				if let Some(content) = content {
					ctx.send(Reply::text(content)).await;
				}
			},
			Err(e) => {
				error!("Card search {:?} failed: {}", query, e);
				self.say(ctx, settings.language, StringKey::Error).await
			},
		}
	}

	async fn name_search(
		&self,
		ctx: &dyn MessageContext,
		msg: &Inbound,
		settings: &GuildSettings,
		search: &str,
	) {
		if !settings.allows(msg.channel_id) || search.is_empty() {
			return;
		}

		let query = CardQuery::by_name(settings.language, search);

		match self.cards.cards(&query).await {
			Ok(page) => match page.records.first() {
				Some(card) if page.total_count > 0 => {
					ctx.send(Reply {
						attachments: vec![card.into()],
						..Default::default()
					})
					.await
				},
				_ => self.say(ctx, settings.language, StringKey::NoResults).await,
			},
			Err(e) => {
				error!("Card search for {:?} failed: {}", search, e);
				self.say(ctx, settings.language, StringKey::Error).await
			},
		}
	}
}
