use crate::{config::ApiConfig, constants::IMAGE_EXTENSION, query::CardQuery};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

const CARDS_QUERY: &str = "
query getCards(
	$language: String
	$nationIds: [Int]
	$first: Int
	$offset: Int
	$kredits: [Int]
	$q: String
	$type: [String]
	$rarity: [String]
	$set: [String]
	$showSpawnables: Boolean
) {
	cards(
		language: $language
		first: $first
		offset: $offset
		nationIds: $nationIds
		kredits: $kredits
		q: $q
		type: $type
		set: $set
		rarity: $rarity
		showSpawnables: $showSpawnables
	) {
		pageInfo {
			count
			hasNextPage
		}
		edges {
			node {
				json
				image: image(language: \"en\")
			}
		}
	}
}
";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CardRecord {
	/// Language code -> card title.
	pub titles: HashMap<String, String>,
	pub image_url: String,
}

impl CardRecord {
	pub fn english_title(&self) -> Option<&str> {
		self.titles.get("en").map(String::as_str)
	}

	pub fn attachment_name(&self) -> String {
		format!("{}{}", self.english_title().unwrap_or("card"), IMAGE_EXTENSION)
	}
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CardPage {
	pub total_count: u64,
	pub records: Vec<CardRecord>,
}

#[derive(Debug, Error)]
pub enum CardApiError {
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("response was not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("API reported errors: {0}")]
	GraphQl(String),
	#[error("response was missing {0}")]
	Malformed(&'static str),
}

#[async_trait]
pub trait CardSource: Send + Sync {
	async fn cards(&self, query: &CardQuery) -> Result<CardPage, CardApiError>;
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
	query: &'static str,
	variables: &'a CardQuery,
}

#[derive(Deserialize)]
struct GraphQlResponse {
	data: Option<CardsData>,
	#[serde(default)]
	errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
	message: String,
}

#[derive(Deserialize)]
struct CardsData {
	cards: Option<Cards>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cards {
	page_info: PageInfo,
	#[serde(default)]
	edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct PageInfo {
	count: u64,
}

#[derive(Deserialize)]
struct Edge {
	node: Node,
}

#[derive(Deserialize)]
struct Node {
	json: Value,
	image: String,
}

#[derive(Deserialize)]
struct CardJson {
	#[serde(default)]
	title: HashMap<String, String>,
}

/// GraphQL client for the public card database.
pub struct KardsApi {
	http: reqwest::Client,
	endpoint: String,
	image_base: String,
}

impl KardsApi {
	pub fn new(http: reqwest::Client, config: &ApiConfig) -> Self {
		Self {
			http,
			endpoint: config.endpoint.clone(),
			image_base: config.image_base.clone(),
		}
	}

	pub fn decode(&self, body: &str) -> Result<CardPage, CardApiError> {
		let resp: GraphQlResponse = serde_json::from_str(body)?;

		if !resp.errors.is_empty() {
			return Err(CardApiError::GraphQl(
				resp.errors
					.into_iter()
					.map(|e| e.message)
					.collect::<Vec<_>>()
					.join("; "),
			));
		}

		let cards = resp
			.data
			.and_then(|d| d.cards)
			.ok_or(CardApiError::Malformed("data.cards"))?;

		let records = cards
			.edges
			.into_iter()
			.map(|edge| self.to_record(edge.node))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(CardPage {
			total_count: cards.page_info.count,
			records,
		})
	}

	fn to_record(&self, node: Node) -> Result<CardRecord, CardApiError> {
		// The `json` scalar is sometimes delivered pre-encoded.
		let json = match node.json {
			Value::String(text) => serde_json::from_str(&text)?,
			other => other,
		};
		let card: CardJson = serde_json::from_value(json)?;

		Ok(CardRecord {
			titles: card.title,
			image_url: format!("{}{}", self.image_base, node.image),
		})
	}
}

#[async_trait]
impl CardSource for KardsApi {
	async fn cards(&self, query: &CardQuery) -> Result<CardPage, CardApiError> {
		let body = self
			.http
			.post(&self.endpoint)
			.json(&GraphQlRequest {
				query: CARDS_QUERY,
				variables: query,
			})
			.send()
			.await?
			.error_for_status()?
			.text()
			.await?;

		trace!("Card API replied: {}", body);

		self.decode(&body)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn api() -> KardsApi {
		KardsApi::new(reqwest::Client::new(), &ApiConfig::default())
	}

	#[test]
	fn decodes_cards_and_image_urls() {
		let body = r#"{"data": {"cards": {
			"pageInfo": {"count": 2, "hasNextPage": false},
			"edges": [
				{"node": {"json": {"title": {"en": "Tiger", "de": "Tiger"}}, "image": "/img/tiger.png"}},
				{"node": {"json": "{\"title\": {\"en\": \"T-34\"}}", "image": "/img/t34.png"}}
			]
		}}}"#;

		let page = api().decode(body).unwrap();

		assert_eq!(page.total_count, 2);
		assert_eq!(page.records.len(), 2);
		assert_eq!(page.records[0].image_url, "https://kards.com/img/tiger.png");
		assert_eq!(page.records[0].attachment_name(), "Tiger.png");
		assert_eq!(page.records[1].english_title(), Some("T-34"));
	}

	#[test]
	fn empty_result_has_zero_count() {
		let body = r#"{"data": {"cards": {"pageInfo": {"count": 0}, "edges": []}}}"#;

		assert_eq!(api().decode(body).unwrap(), CardPage::default());
	}

	#[test]
	fn api_errors_are_failures() {
		let body = r#"{"data": null, "errors": [{"message": "bad language"}]}"#;

		match api().decode(body) {
			Err(CardApiError::GraphQl(msg)) => assert_eq!(msg, "bad language"),
			other => panic!("expected GraphQL error, got {:?}", other),
		}

		assert!(matches!(
			api().decode(r#"{"data": {}}"#),
			Err(CardApiError::Malformed(_))
		));
	}

	#[test]
	fn request_carries_query_and_variables() {
		let query = CardQuery::by_name(crate::config::Language::English, "tank");
		let req = serde_json::to_value(&GraphQlRequest {
			query: CARDS_QUERY,
			variables: &query,
		})
		.unwrap();

		assert_eq!(req["variables"]["q"], "tank");
		assert_eq!(req["variables"]["first"], 1);
		assert!(req["query"].as_str().unwrap().contains("cards("));
	}
}
