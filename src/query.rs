use crate::{
	command::FilterToken,
	config::Language,
	nation::NationResolver,
	settings::GuildSettings,
};
use serde::Serialize;
use tracing::error;

/// Variables of a single card search, named as the card API expects them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardQuery {
	pub language: &'static str,
	#[serde(rename = "first")]
	pub page_size: i32,
	/// `(page - 1) * page_size`
	pub offset: i64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nation_ids: Option<Vec<i32>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub kredits: Option<i32>,
	#[serde(rename = "q", skip_serializing_if = "Option::is_none")]
	pub search_text: Option<String>,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<Vec<&'static str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rarity: Option<Vec<&'static str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub set: Option<Vec<&'static str>>,
	#[serde(rename = "showSpawnables", skip_serializing_if = "Option::is_none")]
	pub include_spawnables: Option<bool>,
}

impl CardQuery {
	/// First page of an unfiltered listing, sized for this guild.
	pub fn new(settings: &GuildSettings) -> Self {
		Self {
			language: settings.language.to_str(),
			page_size: settings.page_size.get(),
			offset: 0,
			..Default::default()
		}
	}

	/// The single best match for `search`, spawnables included.
	pub fn by_name(language: Language, search: &str) -> Self {
		Self {
			language: language.to_str(),
			page_size: 1,
			offset: 0,
			search_text: Some(search.to_string()),
			include_spawnables: Some(true),
			..Default::default()
		}
	}

	/// Folds parsed filters into the query. Nations are resolved in order;
	/// names which fail to resolve are left out.
	pub async fn apply_filters(&mut self, filters: Vec<FilterToken>, nations: &dyn NationResolver) {
		for filter in filters {
			match filter {
				FilterToken::Nation(names) => {
					let mut ids = Vec::with_capacity(names.len());
					for name in names {
						match nations.name_to_id(&name).await {
							Ok(id) => ids.push(id),
							Err(e) => error!("Couldn't resolve nation: {}", e),
						}
					}

					if !ids.is_empty() {
						self.nation_ids = Some(ids);
					}
				},
				FilterToken::Page(page) => {
					self.offset = (i64::from(page) - 1) * i64::from(self.page_size);
				},
				FilterToken::Kredits(kredits) => self.kredits = Some(kredits),
				FilterToken::Set(sets) => attach(&mut self.set, sets),
				FilterToken::Rarity(rarities) => attach(&mut self.rarity, rarities),
				FilterToken::Type(kinds) => attach(&mut self.kind, kinds),
				FilterToken::Spawnable(show) => self.include_spawnables = Some(show),
			}
		}
	}

	pub fn to_json(&self) -> String {
		serde_json::to_string(self).unwrap_or_default()
	}
}

fn attach(slot: &mut Option<Vec<&'static str>>, vals: Vec<&'static str>) {
	if !vals.is_empty() {
		*slot = Some(vals);
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		command::{parse_filters, FilterVocab},
		config::PageSize,
		nation::NationTable,
	};

	async fn build(body: &str, settings: &GuildSettings) -> CardQuery {
		let mut query = CardQuery::new(settings);
		query
			.apply_filters(parse_filters(body, FilterVocab::default()), &NationTable)
			.await;
		query
	}

	#[tokio::test]
	async fn page_sets_offset_from_page_size() {
		let settings = GuildSettings::default();

		assert_eq!(build("page=3", &settings).await.offset, 10);
		assert_eq!(build("page=0", &settings).await.offset, 0);

		let big = GuildSettings {
			page_size: PageSize::Fifteen,
			..Default::default()
		};
		assert_eq!(build("page=2", &big).await.offset, 15);
	}

	#[tokio::test]
	async fn unparseable_page_keeps_offset() {
		let query = build("page=two", &GuildSettings::default()).await;

		assert_eq!(query.offset, 0);
	}

	#[tokio::test]
	async fn unresolved_nations_are_skipped() {
		let settings = GuildSettings::default();

		let query = build("foo nation=ussr,narnia,usa", &settings).await;
		assert_eq!(query.nation_ids, Some(vec![4, 5]));

		let query = build("nation=narnia", &settings).await;
		assert_eq!(query.nation_ids, None);
	}

	#[tokio::test]
	async fn empty_lists_are_not_attached() {
		let query = build("set=nope rarity=base", &GuildSettings::default()).await;

		assert_eq!(query.set, None);
		assert_eq!(query.rarity, Some(vec!["Base"]));
	}

	#[tokio::test]
	async fn serialises_as_api_variables() {
		let query = build("kredits=9 spawnable=no type=legions", &GuildSettings::default()).await;

		assert_eq!(
			query.to_json(),
			r#"{"language":"en","first":5,"offset":0,"kredits":7,"type":["Legions"],"showSpawnables":false}"#
		);
	}

	#[test]
	fn name_search_wants_one_card() {
		let query = CardQuery::by_name(Language::French, "tank");

		assert_eq!(
			query.to_json(),
			r#"{"language":"fr","first":1,"offset":0,"q":"tank","showSpawnables":true}"#
		);
	}
}
