use enum_primitive::*;

pub const QUERY_DIR: &str = "./queries";

enum_from_primitive! {
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Query {
	SelectSettings = 0,
	UpsertLanguage,
	UpsertPageSize,

	SelectChannels,
	UpsertChannel,
	DeleteChannel,
}
}

impl Query {
	pub const LAST: Self = Query::DeleteChannel;

	fn query_class(&self) -> &'static str {
		use Query::*;

		match self {
			SelectSettings | SelectChannels => "select",

			UpsertLanguage | UpsertPageSize | UpsertChannel => "upsert",

			DeleteChannel => "delete",
		}
	}

	fn query_subject(&self) -> &'static str {
		use Query::*;

		match self {
			SelectSettings => "settings",

			UpsertLanguage => "language",

			UpsertPageSize => "pagesize",

			SelectChannels | UpsertChannel | DeleteChannel => "channel",
		}
	}

	pub fn query_dir(&self) -> String {
		format!(
			"{}/{}-{}.sql",
			QUERY_DIR,
			self.query_class(),
			self.query_subject()
		)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn every_query_has_a_file() {
		for i in 0..=(Query::LAST as u32) {
			let query = Query::from_u32(i).unwrap();
			let path = format!(
				"{}/{}",
				env!("CARGO_MANIFEST_DIR"),
				query.query_dir().trim_start_matches("./")
			);

			assert!(
				std::path::Path::new(&path).exists(),
				"{:?} has no file at {}",
				query,
				path
			);
		}
	}
}
