use std::env;


pub static WEEKLY_SOURCE_VAR: &'static str = "COVID_WEEKLY_SOURCE";
pub static INDICATOR_SOURCE_VAR: &'static str = "COVID_INDICATOR_SOURCE";

static DEFAULT_WEEKLY_SOURCE: &'static str = "https://raw.githubusercontent.com/wany115/BMI-706-SKITTY-Final-Project/refs/heads/main/Cleaned%20Data/Weekly%20Data.csv";
static DEFAULT_INDICATOR_SOURCE: &'static str = "https://raw.githubusercontent.com/wany115/BMI-706-SKITTY-Final-Project/refs/heads/main/Cleaned%20Data/plot2.csv";


/// Locations of the two input tables. Each is either an `http(s)://` URL
/// or a local path (optionally gzipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub weekly_source: String,
	pub indicator_source: String,
}

impl Default for Config {
	fn default() -> Self {
		Self{
			weekly_source: DEFAULT_WEEKLY_SOURCE.into(),
			indicator_source: DEFAULT_INDICATOR_SOURCE.into(),
		}
	}
}

impl Config {
	pub fn from_env() -> Self {
		Self::from_lookup(|name| env::var(name).ok())
	}

	fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
		let default = Self::default();
		Self{
			weekly_source: lookup(WEEKLY_SOURCE_VAR).unwrap_or(default.weekly_source),
			indicator_source: lookup(INDICATOR_SOURCE_VAR).unwrap_or(default.indicator_source),
		}
	}
}
