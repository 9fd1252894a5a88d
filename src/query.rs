//! Views over the long weekly table.
//!
//! Everything in here borrows from the base table and never modifies it;
//! callers re-run the whole chain whenever a selection changes.

use std::collections::BTreeMap;

use log::warn;

use smartstring::alias::{String as SmartString};

use super::epiweek::WeekRange;
use super::weekly::{CountryCode, LongObservation, Metric, Unit};


pub static MAX_SELECTED_COUNTRIES: usize = 7;

pub static DEFAULT_COUNTRIES: [&'static str; 7] = [
	"Canada",
	"Nigeria",
	"Iceland",
	"Russia",
	"Sweden",
	"China",
	"US",
];


/// Rows whose MMWR week lies in `start..=end`. An inverted range selects
/// nothing.
pub fn filter_weeks<'x, I: IntoIterator<Item = &'x LongObservation>>(rows: I, start: u32, end: u32) -> Vec<&'x LongObservation> {
	let range = WeekRange::new(start, end);
	rows.into_iter().filter(|o| range.contains(o.mmwr_week)).collect()
}

pub fn filter_countries<'x, I: IntoIterator<Item = &'x LongObservation>, S: AsRef<str>>(rows: I, countries: &[S]) -> Vec<&'x LongObservation> {
	rows.into_iter()
		.filter(|o| countries.iter().any(|c| c.as_ref() == o.country.as_str()))
		.collect()
}

pub fn filter_metric<'x, I: IntoIterator<Item = &'x LongObservation>>(rows: I, metric: Metric) -> Vec<&'x LongObservation> {
	rows.into_iter().filter(|o| o.metric == metric).collect()
}

pub fn filter_unit<'x, I: IntoIterator<Item = &'x LongObservation>>(rows: I, unit: Unit) -> Vec<&'x LongObservation> {
	rows.into_iter().filter(|o| o.unit == unit).collect()
}


/// What the weekly part of the dashboard currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
	pub weeks: WeekRange,
	countries: Vec<SmartString>,
	pub metric: Metric,
	pub unit: Unit,
}

impl Selection {
	/// Countries beyond [`MAX_SELECTED_COUNTRIES`] are ignored.
	pub fn new<S: AsRef<str>>(weeks: WeekRange, countries: &[S], metric: Metric, unit: Unit) -> Self {
		if countries.len() > MAX_SELECTED_COUNTRIES {
			warn!("{} countries selected, keeping the first {}", countries.len(), MAX_SELECTED_COUNTRIES);
		}
		Self{
			weeks,
			countries: countries.iter()
				.take(MAX_SELECTED_COUNTRIES)
				.map(|c| SmartString::from(c.as_ref()))
				.collect(),
			metric,
			unit,
		}
	}

	pub fn countries(&self) -> &[SmartString] {
		&self.countries
	}

	/// Week range, then countries, then metric, then unit.
	pub fn apply<'x, I: IntoIterator<Item = &'x LongObservation>>(&self, rows: I) -> Vec<&'x LongObservation> {
		let rows = filter_weeks(rows, self.weeks.start, self.weeks.end);
		let rows = filter_countries(rows, &self.countries[..]);
		let rows = filter_metric(rows, self.metric);
		filter_unit(rows, self.unit)
	}
}

impl Default for Selection {
	fn default() -> Self {
		Self::new(
			super::epiweek::week_range_2020(),
			&DEFAULT_COUNTRIES[..],
			Metric::Confirmed,
			Unit::WeeklyCase,
		)
	}
}


#[derive(Debug, Clone, PartialEq)]
pub struct CountryMean {
	pub country: SmartString,
	pub country_code: CountryCode,
	pub mean: f64,
}

/// Mean value per (country, country code), ordered by that key.
///
/// NaN values are left out of the average; a group with nothing but NaN
/// reports NaN. Countries without rows do not appear at all.
pub fn mean_by_country<'x, I: IntoIterator<Item = &'x LongObservation>>(rows: I) -> Vec<CountryMean> {
	let mut groups: BTreeMap<(&'x str, &'x CountryCode), (f64, usize)> = BTreeMap::new();
	for o in rows {
		let acc = groups.entry((o.country.as_str(), &o.country_code)).or_insert((0.0, 0));
		if !o.value.is_nan() {
			acc.0 += o.value;
			acc.1 += 1;
		}
	}
	groups.into_iter()
		.map(|((country, code), (sum, n))| CountryMean{
			country: country.into(),
			country_code: code.clone(),
			mean: if n == 0 { f64::NAN } else { sum / n as f64 },
		})
		.collect()
}
