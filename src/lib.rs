mod error;
mod config;
mod ioutil;
mod cache;
mod epiweek;
pub mod weekly;
pub mod indicators;
pub mod query;
pub mod stats;
pub mod factors;

pub use error::*;
pub use config::*;
pub use ioutil::{magic_open, open_source};
pub use cache::Cached;
pub use epiweek::*;
pub use weekly::{CountryCode, LongObservation, Metric, Unit, WeeklyRecord};
pub use indicators::{Column, IndicatorRecord};
pub use query::{CountryMean, Selection};
pub use stats::LinearFit;
pub use factors::{CorrelationCell, ScatterSummary};


/// Default `RUST_LOG` filter for the binaries.
pub static DEFAULT_LOGGING_LEVEL: &'static str = "info";

pub fn init_logging() {
	if std::env::var_os("RUST_LOG").is_none() {
		std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL);
	}
	pretty_env_logger::init_timed();
}
