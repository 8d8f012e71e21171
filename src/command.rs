use crate::{
	config::{ConfigParseError, Language, PageSize},
	constants::*,
	settings::SettingField,
};
use serenity::{model::id::ChannelId, utils::parse_channel_mention};
use tracing::debug;

const SETTINGS_PREFIX: &str = "[[[";
const FILTER_PREFIX: &str = "[[";
const NAME_PREFIX: &str = "[";

/// A message body, classified by its bracket prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command<'a> {
	Settings(&'a str),
	Filtered(&'a str),
	Name(&'a str),
}

impl<'a> Command<'a> {
	/// Returns `None` for anything which isn't addressed to us.
	pub fn classify(content: &'a str) -> Option<Self> {
		if content.starts_with(SETTINGS_PREFIX) {
			Some(Self::Settings(
				body_after(content, SETTINGS_PREFIX).trim_end_matches(']'),
			))
		} else if content.starts_with(FILTER_PREFIX) {
			Some(Self::Filtered(
				body_after(content, FILTER_PREFIX).trim_end_matches(']'),
			))
		} else if content.starts_with(NAME_PREFIX) {
			let body = body_after(content, NAME_PREFIX);
			Some(Self::Name(body.strip_suffix(']').unwrap_or(body)))
		} else {
			None
		}
	}
}

/// Text after `prefix`, up to (not including) its next occurrence.
fn body_after<'a>(content: &'a str, prefix: &str) -> &'a str {
	let rest = &content[prefix.len()..];
	rest.split(prefix).next().unwrap_or(rest)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChannelAction {
	Add,
	Remove,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettingsCommand {
	List,
	Fix,
	Set(SettingField),
	Channels(ChannelAction),
}

impl SettingsCommand {
	/// `Ok(None)` means there was nothing to act on.
	pub fn parse(args: &str) -> Result<Option<Self>, ConfigParseError> {
		let tokens = args.split_whitespace().collect::<Vec<_>>();

		let first = match tokens.first() {
			Some(t) => t.to_lowercase(),
			None => return Ok(None),
		};

		match first.as_str() {
			"list" => return Ok(Some(Self::List)),
			"fix" => return Ok(Some(Self::Fix)),
			_ => {},
		}

		if tokens.len() < 2 {
			return Err(ConfigParseError::ArgumentsIncorrect);
		}

		match first.as_str() {
			"language" => Language::from_str(tokens[1])
				.map(|l| Some(Self::Set(SettingField::Language(l))))
				.ok_or(ConfigParseError::InvalidLanguage),
			"page_size" => {
				let size = tokens[1]
					.parse::<i64>()
					.map_err(|_| ConfigParseError::BadNumber)?;

				PageSize::from_value(size)
					.map(|p| Some(Self::Set(SettingField::PageSize(p))))
					.ok_or(ConfigParseError::InvalidPageSize)
			},
			"channels" => {
				if tokens.len() < 3 {
					return Err(ConfigParseError::ArgumentsIncorrect);
				}

				match tokens[1].to_lowercase().as_str() {
					"add" => Ok(Some(Self::Channels(ChannelAction::Add))),
					"remove" => Ok(Some(Self::Channels(ChannelAction::Remove))),
					_ => Err(ConfigParseError::InvalidAction),
				}
			},
			_ => Ok(None),
		}
	}
}

/// Vocabulary used to validate `rarity=` and `type=` values.
///
/// The legacy vocabulary checks both against set names, which existing
/// servers rely on.
#[derive(Clone, Copy, Debug)]
pub struct FilterVocab {
	pub rarity: &'static [&'static str],
	pub kind: &'static [&'static str],
}

impl FilterVocab {
	pub const LEGACY: Self = Self {
		rarity: SETS,
		kind: SETS,
	};

	pub const STRICT: Self = Self {
		rarity: RARITIES,
		kind: TYPES,
	};

	pub fn new(strict: bool) -> Self {
		if strict {
			Self::STRICT
		} else {
			Self::LEGACY
		}
	}
}

impl Default for FilterVocab {
	fn default() -> Self {
		Self::LEGACY
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FilterKey {
	Nation,
	Page,
	Kredits,
	Set,
	Rarity,
	Type,
	Spawnable,
}

impl FilterKey {
	fn from_str(key: &str) -> Option<Self> {
		Some(match key {
			"nation" => Self::Nation,
			"page" => Self::Page,
			"kredits" => Self::Kredits,
			"set" => Self::Set,
			"rarity" => Self::Rarity,
			"type" => Self::Type,
			"spawnable" => Self::Spawnable,
			_ => return None,
		})
	}
}

/// One parsed `key=value` filter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterToken {
	Nation(Vec<String>),
	/// Always at least 1.
	Page(u32),
	/// Always within `KREDITS_MIN..=KREDITS_MAX`.
	Kredits(i32),
	Set(Vec<&'static str>),
	Rarity(Vec<&'static str>),
	Type(Vec<&'static str>),
	Spawnable(bool),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterSkip {
	MissingSeparator,
	UnknownKey(String),
	BadNumber(String),
}

impl FilterToken {
	pub fn parse(token: &str, vocab: FilterVocab) -> Result<Self, FilterSkip> {
		let (key, value) = token
			.split_once('=')
			.ok_or(FilterSkip::MissingSeparator)?;

		let key = FilterKey::from_str(key).ok_or_else(|| FilterSkip::UnknownKey(key.into()))?;

		Ok(match key {
			FilterKey::Nation => Self::Nation(value.split(',').map(String::from).collect()),
			FilterKey::Page => {
				let page = parse_number(value)?.max(1);
				Self::Page(page.min(i64::from(u32::MAX)) as u32)
			},
			FilterKey::Kredits => Self::Kredits(
				parse_number(value)?.clamp(i64::from(KREDITS_MIN), i64::from(KREDITS_MAX)) as i32,
			),
			FilterKey::Set => Self::Set(match_known(value, SETS)),
			FilterKey::Rarity => Self::Rarity(match_known(value, vocab.rarity)),
			FilterKey::Type => Self::Type(match_known(value, vocab.kind)),
			FilterKey::Spawnable => Self::Spawnable(matches!(
				value.to_lowercase().as_str(),
				"true" | "yes" | "y"
			)),
		})
	}
}

fn parse_number(value: &str) -> Result<i64, FilterSkip> {
	value
		.parse::<i64>()
		.map_err(|_| FilterSkip::BadNumber(value.into()))
}

/// Case-insensitive match of each comma-separated entry against `known`,
/// dropping anything unrecognised.
fn match_known(value: &str, known: &'static [&'static str]) -> Vec<&'static str> {
	value
		.split(',')
		.filter_map(|given| {
			known
				.iter()
				.find(|name| name.eq_ignore_ascii_case(given))
				.copied()
		})
		.collect()
}

/// Tokenizes the body of a `[[...]]` command. Bad tokens are dropped.
pub fn parse_filters(body: &str, vocab: FilterVocab) -> Vec<FilterToken> {
	body.split(' ')
		.filter(|token| !token.is_empty())
		.filter_map(|token| match FilterToken::parse(token, vocab) {
			Ok(filter) => Some(filter),
			Err(skip) => {
				debug!("Skipping filter {:?}: {:?}", token, skip);
				None
			},
		})
		.collect()
}

/// Every distinct `<#id>` channel mention in `content`, in order.
pub fn channel_mentions(content: &str) -> Vec<ChannelId> {
	let mut out = Vec::new();
	let mut rest = content;

	while let Some(start) = rest.find("<#") {
		let candidate = &rest[start..];
		let end = match candidate.find('>') {
			Some(end) => end,
			None => break,
		};

		match parse_channel_mention(&candidate[..=end]) {
			Some(chan) => {
				if !out.contains(&chan) {
					out.push(chan);
				}
				rest = &candidate[end + 1..];
			},
			// A later `<#` may still start a valid mention.
			None => rest = &candidate[2..],
		}
	}

	out
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn mode_priority_follows_bracket_count() {
		assert_eq!(Command::classify("[[[list"), Some(Command::Settings("list")));
		assert_eq!(
			Command::classify("[[kredits=3]]"),
			Some(Command::Filtered("kredits=3"))
		);
		assert_eq!(Command::classify("[tank]"), Some(Command::Name("tank")));
		assert_eq!(Command::classify("tank"), None);
		assert_eq!(Command::classify(" [tank]"), None);
	}

	#[test]
	fn name_search_strips_one_closing_bracket() {
		assert_eq!(Command::classify("[tank"), Some(Command::Name("tank")));
		assert_eq!(Command::classify("[tank]]"), Some(Command::Name("tank]")));
		assert_eq!(Command::classify("[]"), Some(Command::Name("")));
	}

	#[test]
	fn settings_subcommands() {
		assert_eq!(SettingsCommand::parse(""), Ok(None));
		assert_eq!(SettingsCommand::parse("LIST"), Ok(Some(SettingsCommand::List)));
		assert_eq!(SettingsCommand::parse("fix"), Ok(Some(SettingsCommand::Fix)));
		assert_eq!(
			SettingsCommand::parse("language"),
			Err(ConfigParseError::ArgumentsIncorrect)
		);
		assert_eq!(SettingsCommand::parse("colour red"), Ok(None));
	}

	#[test]
	fn settings_tokens_tolerate_extra_spaces() {
		assert_eq!(SettingsCommand::parse(" list"), Ok(Some(SettingsCommand::List)));
		assert_eq!(
			SettingsCommand::parse("language  de "),
			Ok(Some(SettingsCommand::Set(SettingField::Language(Language::German))))
		);
		assert_eq!(SettingsCommand::parse("   "), Ok(None));
	}

	#[test]
	fn language_setting_is_case_insensitive() {
		assert_eq!(
			SettingsCommand::parse("Language DE"),
			Ok(Some(SettingsCommand::Set(SettingField::Language(Language::German))))
		);
		assert_eq!(
			SettingsCommand::parse("language xx"),
			Err(ConfigParseError::InvalidLanguage)
		);
	}

	#[test]
	fn page_size_setting_validates() {
		assert_eq!(
			SettingsCommand::parse("page_size 10"),
			Ok(Some(SettingsCommand::Set(SettingField::PageSize(PageSize::Ten))))
		);
		assert_eq!(
			SettingsCommand::parse("page_size 7"),
			Err(ConfigParseError::InvalidPageSize)
		);
		assert_eq!(
			SettingsCommand::parse("page_size ten"),
			Err(ConfigParseError::BadNumber)
		);
	}

	#[test]
	fn channel_setting_needs_action_and_mentions() {
		assert_eq!(
			SettingsCommand::parse("channels add"),
			Err(ConfigParseError::ArgumentsIncorrect)
		);
		assert_eq!(
			SettingsCommand::parse("channels ADD <#1>"),
			Ok(Some(SettingsCommand::Channels(ChannelAction::Add)))
		);
		assert_eq!(
			SettingsCommand::parse("channels remove <#1>"),
			Ok(Some(SettingsCommand::Channels(ChannelAction::Remove)))
		);
		assert_eq!(
			SettingsCommand::parse("channels swap <#1>"),
			Err(ConfigParseError::InvalidAction)
		);
	}

	#[test]
	fn numeric_filters_clamp() {
		let vocab = FilterVocab::default();

		assert_eq!(FilterToken::parse("page=0", vocab), Ok(FilterToken::Page(1)));
		assert_eq!(FilterToken::parse("page=-4", vocab), Ok(FilterToken::Page(1)));
		assert_eq!(FilterToken::parse("page=3", vocab), Ok(FilterToken::Page(3)));
		assert_eq!(FilterToken::parse("kredits=9", vocab), Ok(FilterToken::Kredits(7)));
		assert_eq!(FilterToken::parse("kredits=0", vocab), Ok(FilterToken::Kredits(1)));
		assert_eq!(
			FilterToken::parse("kredits=lots", vocab),
			Err(FilterSkip::BadNumber("lots".into()))
		);
	}

	#[test]
	fn spawnable_is_always_explicit() {
		let vocab = FilterVocab::default();

		assert_eq!(
			FilterToken::parse("spawnable=Y", vocab),
			Ok(FilterToken::Spawnable(true))
		);
		assert_eq!(
			FilterToken::parse("spawnable=NO", vocab),
			Ok(FilterToken::Spawnable(false))
		);
		assert_eq!(
			FilterToken::parse("spawnable=", vocab),
			Ok(FilterToken::Spawnable(false))
		);
	}

	#[test]
	fn list_filters_match_known_names() {
		let vocab = FilterVocab::default();

		assert_eq!(
			FilterToken::parse("set=base,LEGIONS,nope", vocab),
			Ok(FilterToken::Set(vec!["Base", "Legions"]))
		);
		assert_eq!(
			FilterToken::parse("nation=ussr,germany", vocab),
			Ok(FilterToken::Nation(vec!["ussr".into(), "germany".into()]))
		);
	}

	#[test]
	fn legacy_vocab_checks_rarity_and_type_against_sets() {
		let legacy = FilterVocab::LEGACY;
		let strict = FilterVocab::STRICT;

		assert_eq!(
			FilterToken::parse("rarity=elite,allegiance", legacy),
			Ok(FilterToken::Rarity(vec!["Allegiance"]))
		);
		assert_eq!(
			FilterToken::parse("type=tank", legacy),
			Ok(FilterToken::Type(vec![]))
		);
		assert_eq!(
			FilterToken::parse("rarity=elite,allegiance", strict),
			Ok(FilterToken::Rarity(vec!["Elite"]))
		);
		assert_eq!(
			FilterToken::parse("type=TANK", strict),
			Ok(FilterToken::Type(vec!["tank"]))
		);
	}

	#[test]
	fn bad_tokens_do_not_abort_the_rest() {
		let filters = parse_filters("foo nation=ussr colour=red  page=2", FilterVocab::default());

		assert_eq!(
			filters,
			vec![
				FilterToken::Nation(vec!["ussr".into()]),
				FilterToken::Page(2),
			]
		);
	}

	#[test]
	fn filter_value_splits_on_first_equals() {
		assert_eq!(
			FilterToken::parse("nation=a=b", FilterVocab::default()),
			Ok(FilterToken::Nation(vec!["a=b".into()]))
		);
		assert_eq!(
			FilterToken::parse("foo", FilterVocab::default()),
			Err(FilterSkip::MissingSeparator)
		);
	}

	#[test]
	fn mentions_are_extracted_once_each() {
		let chans = channel_mentions("channels add <#10> <#20><#10> <#nope> <#30");

		assert_eq!(chans, vec![ChannelId::new(10), ChannelId::new(20)]);
	}

	#[test]
	fn broken_mention_does_not_hide_the_next() {
		assert_eq!(channel_mentions("<#<#12>"), vec![ChannelId::new(12)]);
		assert_eq!(
			channel_mentions("<#x <#13> <#<#<#14>"),
			vec![ChannelId::new(13), ChannelId::new(14)]
		);
	}
}
