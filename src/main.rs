mod cards;
mod command;
mod config;
mod constants;
mod dbs;
mod dispatch;
mod event_handler;
mod lang;
mod nation;
mod query;
mod settings;

use crate::{
	cards::KardsApi,
	command::FilterVocab,
	config::Config,
	dbs::db_conn,
	dispatch::Dispatcher,
	event_handler::KardsEvts,
	lang::Strings,
	nation::NationTable,
	settings::{MemorySettings, SettingsStore},
};

use serenity::{prelude::*, utils::validate_token};
use std::{env, sync::Arc};
use tracing::*;

fn help() {
	eprintln!("Usage: kards-bot <config.json>");
}

#[tokio::main]
async fn main() {
	let args: Vec<_> = env::args().collect();

	if args.len() != 2 {
		help();
		return;
	}

	let config = match Config::load(&args[1]) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Couldn't load config '{}': {}", &args[1], e);
			return;
		},
	};

	let level = match config.log_level() {
		Ok(level) => level,
		Err(e) => {
			eprintln!("{}", e);
			return;
		},
	};

	tracing_subscriber::fmt().with_max_level(level).init();

	if let Err(e) = validate_token(&config.token) {
		error!("Token invalid: {:?}", e);
		return;
	}

	let settings: Arc<dyn SettingsStore> = match &config.database {
		Some(db_config) => match db_conn(db_config).await {
			Ok(db) => Arc::new(db),
			Err(e) => {
				error!("Couldn't connect to the settings database: {}", e);
				return;
			},
		},
		None => {
			warn!("No database configured: settings will be lost on restart.");
			Arc::new(MemorySettings::new())
		},
	};

	let strings = match &config.strings {
		Some(path) => match Strings::load(path) {
			Ok(strings) => strings,
			Err(e) => {
				error!("Couldn't load strings from '{}': {}", path, e);
				return;
			},
		},
		None => Strings::builtin(),
	};

	let http = reqwest::Client::new();

	let dispatcher = Dispatcher::new(
		settings,
		Arc::new(KardsApi::new(http.clone(), &config.api)),
		Arc::new(NationTable),
		Arc::new(strings),
		FilterVocab::new(config.strict_filters),
	);

	let intents = GatewayIntents::GUILDS
		| GatewayIntents::GUILD_MESSAGES
		| GatewayIntents::DIRECT_MESSAGES
		| GatewayIntents::MESSAGE_CONTENT;

	let mut client = match Client::builder(&config.token, intents)
		.event_handler(KardsEvts::new(Arc::new(dispatcher), http))
		.await
	{
		Ok(client) => client,
		Err(e) => {
			error!("Couldn't create client: {:?}", e);
			return;
		},
	};

	if let Err(why) = client.start().await {
		error!("Client ended: {:?}", why);
	}
}
