use crate::{
	command::channel_mentions,
	dispatch::{ChannelKind, Dispatcher, Inbound, MessageContext, Reply, ReplyAttachment},
};

use serenity::{
	async_trait,
	builder::{CreateAttachment, CreateEmbed, CreateMessage},
	client::*,
	model::{prelude::*, Colour},
	Result as SResult,
};
use std::sync::Arc;
use tracing::*;

pub struct KardsEvts {
	dispatcher: Arc<Dispatcher>,
	http: reqwest::Client,
}

impl KardsEvts {
	pub fn new(dispatcher: Arc<Dispatcher>, http: reqwest::Client) -> Self {
		Self { dispatcher, http }
	}
}

#[async_trait]
impl EventHandler for KardsEvts {
	async fn message(&self, ctx: Context, msg: Message) {
		// Cheap checks first: classifying the channel costs a request.
		if msg.author.bot || !msg.content.starts_with('[') {
			return;
		}

		let channel = msg.channel(&ctx).await;

		let (channel_kind, guild_channel) = match channel {
			Ok(Channel::Guild(gc)) if gc.kind == ChannelType::Text => (ChannelKind::Text, Some(gc)),
			Ok(Channel::Private(_)) => (ChannelKind::Direct, None),
			Ok(_) => (ChannelKind::Other, None),
			Err(e) => {
				warn!("Couldn't look up channel {}: {:?}", msg.channel_id, e);
				return;
			},
		};

		let inbound = Inbound {
			mentioned_channels: channel_mentions(&msg.content),
			content: msg.content.clone(),
			author_is_bot: msg.author.bot,
			channel_id: msg.channel_id,
			channel_kind,
			guild_id: msg.guild_id,
		};

		let reply_to = SerenityChannel {
			ctx: &ctx,
			msg: &msg,
			guild_channel: guild_channel.as_ref(),
			http: &self.http,
		};

		self.dispatcher.handle(&reply_to, &inbound).await;
	}

	async fn ready(&self, _ctx: Context, rdy: Ready) {
		info!("Connected as {}", rdy.user.name);
	}
}

struct SerenityChannel<'a> {
	ctx: &'a Context,
	msg: &'a Message,
	guild_channel: Option<&'a GuildChannel>,
	http: &'a reqwest::Client,
}

impl<'a> SerenityChannel<'a> {
	async fn download(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
		let bytes = self
			.http
			.get(url)
			.send()
			.await?
			.error_for_status()?
			.bytes()
			.await?;

		Ok(bytes.to_vec())
	}

	async fn fetch_attachment(&self, attachment: &ReplyAttachment) -> Option<CreateAttachment> {
		match self.download(&attachment.source_url).await {
			Ok(bytes) => Some(CreateAttachment::bytes(bytes, attachment.filename.clone())),
			Err(e) => {
				warn!("Couldn't fetch image {}: {:?}", attachment.source_url, e);
				None
			},
		}
	}
}

#[async_trait]
impl<'a> MessageContext for SerenityChannel<'a> {
	async fn is_admin(&self) -> bool {
		let channel = match self.guild_channel {
			Some(c) => c,
			None => return false,
		};

		// Members are not cached without the privileged intents.
		let member = self.msg.member(self.ctx).await;

		grants_admin(member, |member| {
			self.ctx
				.cache
				.guild(channel.guild_id)
				.map(|guild| guild.user_permissions_in(channel, member))
		})
	}

	async fn guild_channels(&self) -> SResult<Vec<ChannelId>> {
		match self.msg.guild_id {
			Some(guild_id) => Ok(guild_id
				.channels(&self.ctx.http)
				.await?
				.into_keys()
				.collect()),
			None => Ok(vec![]),
		}
	}

	async fn send(&self, reply: Reply) {
		let mut builder = CreateMessage::new();

		if let Some(content) = reply.content {
			builder = builder.content(content);
		}

		if let Some(embed) = reply.embed {
			let mut e = CreateEmbed::new().colour(Colour::new(embed.colour));
			for (name, value, inline) in embed.fields {
				e = e.field(name, value, inline);
			}
			builder = builder.embed(e);
		}

		let mut files = Vec::with_capacity(reply.attachments.len());
		for attachment in &reply.attachments {
			if let Some(file) = self.fetch_attachment(attachment).await {
				files.push(file);
			}
		}

		check_msg(
			self.msg
				.channel_id
				.send_message(&self.ctx.http, builder.add_files(files))
				.await,
		);
	}
}

/// Administrator rights of a fetched member, given a way to read their permissions.
fn grants_admin<M>(member: SResult<M>, permissions: impl FnOnce(&M) -> Option<Permissions>) -> bool {
	match member {
		Ok(member) => match permissions(&member) {
			Some(perms) => perms.administrator(),
			None => {
				warn!("Guild roles unavailable for permission check.");
				false
			},
		},
		Err(e) => {
			warn!("Couldn't fetch message author: {:?}", e);
			false
		},
	}
}

pub fn check_msg(result: SResult<Message>) {
	if let Err(why) = result {
		warn!("Error sending message: {:?}", why);
	}
}
