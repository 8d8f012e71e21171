mod query;

use crate::{
	config::*,
	settings::{GuildSettings, SettingField, SettingsStore, StoreError},
};

use enum_primitive::FromPrimitive;
use query::Query;
use serenity::{async_trait, model::prelude::*};
use std::collections::HashMap;
use tokio::fs;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{error, trace};

pub struct KardsDb {
	db: Client,
	statements: HashMap<Query, Statement>,
}

pub async fn init_db_tables(db: &Client) -> Result<HashMap<Query, Statement>, StoreError> {
	db.batch_execute(&fs::read_to_string(format!("{}/{}", query::QUERY_DIR, "init.sql")).await?)
		.await?;

	let mut out = HashMap::new();

	for i in 0..=(Query::LAST as u32) {
		let query_type = match Query::from_u32(i) {
			Some(q) => q,
			None => continue,
		};
		let data = fs::read_to_string(&query_type.query_dir()).await?;

		let query = db.prepare(&data).await;

		if query.is_err() {
			error!("Failed to prepare statement for {:?}", query_type);
		}

		out.insert(query_type, query?);
	}

	Ok(out)
}

#[inline]
pub async fn db_conn(config: &DatabaseConfig) -> Result<KardsDb, StoreError> {
	let mut conn_str = format!(
		"user={} host={} password={} port='{}'",
		config.user,
		config.host,
		config.password,
		config.port.unwrap_or(5432)
	);

	if let Some(dbname) = &config.dbname {
		conn_str.push_str(&format!(" dbname={}", dbname));
	}

	let (client, connection) = tokio_postgres::connect(&conn_str, NoTls).await?;

	tokio::spawn(async move {
		if let Err(e) = connection.await {
			error!("Database connection error {:?}", e);
		}
	});

	// Try and build tables, if we don't have them.
	init_db_tables(&client)
		.await
		.map(|statements| KardsDb {
			db: client,
			statements,
		})
		.map_err(|e| {
			error!("Couldn't setup db tables: {:?}", e);
			e
		})
}

impl KardsDb {
	#[inline]
	fn get_statement(&self, query: Query) -> Result<Statement, StoreError> {
		self.statements
			.get(&query)
			.cloned()
			.ok_or_else(|| StoreError::MissingStatement(format!("{:?}", query)))
	}

	#[inline]
	async fn select_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelId>, StoreError> {
		let g_id = i64::from(guild_id);

		let query = self.get_statement(Query::SelectChannels)?;

		Ok(self
			.db
			.query(&query, &[&g_id])
			.await?
			.into_iter()
			.map(|row| {
				let a: i64 = row.get(0);
				ChannelId::new(a as u64)
			})
			.collect())
	}

	#[inline]
	async fn execute_pair(&self, query: Query, guild_id: GuildId, val: i64) -> Result<(), StoreError> {
		let g_id = i64::from(guild_id);

		let query = self.get_statement(query)?;

		self.db.execute(&query, &[&g_id, &val]).await?;

		Ok(())
	}
}

#[async_trait]
impl SettingsStore for KardsDb {
	async fn get_by_guild_id(&self, guild_id: GuildId) -> Result<GuildSettings, StoreError> {
		let g_id = i64::from(guild_id);

		let query = self.get_statement(Query::SelectSettings)?;

		let mut settings = match self.db.query_opt(&query, &[&g_id]).await? {
			Some(row) => {
				let language: i16 = row.get(0);
				let page_size: i16 = row.get(1);

				GuildSettings {
					language: Language::from_i16(language).ok_or(StoreError::Corrupt(guild_id))?,
					page_size: PageSize::from_i16(page_size)
						.ok_or(StoreError::Corrupt(guild_id))?,
					channels: vec![],
				}
			},
			None => GuildSettings::default(),
		};

		settings.channels = self.select_channels(guild_id).await?;

		trace!("Settings for {}: {:?}", guild_id, settings);

		Ok(settings)
	}

	async fn set_field(&self, guild_id: GuildId, field: SettingField) -> Result<(), StoreError> {
		let g_id = i64::from(guild_id);

		let (query, val) = match field {
			SettingField::Language(l) => (Query::UpsertLanguage, l as i16),
			SettingField::PageSize(p) => (Query::UpsertPageSize, p as i16),
		};

		let query = self.get_statement(query)?;

		self.db.execute(&query, &[&g_id, &val]).await?;

		Ok(())
	}

	async fn add_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), StoreError> {
		self.execute_pair(Query::UpsertChannel, guild_id, i64::from(channel_id))
			.await
	}

	async fn remove_channel(
		&self,
		guild_id: GuildId,
		channel_id: ChannelId,
	) -> Result<(), StoreError> {
		self.execute_pair(Query::DeleteChannel, guild_id, i64::from(channel_id))
			.await
	}
}
