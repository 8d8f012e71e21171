pub const SETS: &[&str] = &["Base", "Allegiance", "Breakthrough", "Legions", "TheatersOfWar"];

pub const RARITIES: &[&str] = &["Limited", "Standard", "Special", "Elite"];

pub const TYPES: &[&str] = &[
	"infantry",
	"artillery",
	"tank",
	"bomber",
	"fighter",
	"order",
	"countermeasure",
];

pub const KREDITS_MIN: i32 = 1;
pub const KREDITS_MAX: i32 = 7;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.kards.com/graphql";
pub const DEFAULT_IMAGE_BASE: &str = "https://kards.com";

pub const SETTINGS_COLOUR: u32 = 3447003;

pub const IMAGE_EXTENSION: &str = ".png";

/// Discord rejects messages carrying more files than this.
pub const MAX_ATTACHMENTS: usize = 10;
