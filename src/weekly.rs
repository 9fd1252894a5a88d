use std::fmt;
use std::io;
use std::str::FromStr;

use log::{debug, info, warn};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use chrono::naive::NaiveDate;

use enum_map::{enum_map, Enum, EnumMap};

use smartstring::alias::{String as SmartString};

use super::cache::Cached;
use super::config::Config;
use super::error::{Error, SchemaError};
use super::ioutil::open_source;


/// Trailing metadata columns of the weekly file which are never used.
pub static DROPPED_TRAILING_COLUMNS: usize = 7;

pub static REQUIRED_COLUMNS: [&'static str; 10] = [
	"Country_Region",
	"country-code",
	"Population",
	"Density (P/Km²)",
	"Week_Start_Date",
	"MMWR_week",
	"Confirmed",
	"Deaths",
	"Recovered",
	"Active",
];


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Enum)]
pub enum Metric {
	Confirmed,
	Deaths,
	Recovered,
	Active,
}

impl Metric {
	pub const ALL: [Metric; 4] = [Metric::Confirmed, Metric::Deaths, Metric::Recovered, Metric::Active];

	pub fn label(&self) -> &'static str {
		match self {
			Self::Confirmed => "Confirmed",
			Self::Deaths => "Deaths",
			Self::Recovered => "Recovered",
			Self::Active => "Active",
		}
	}
}

impl fmt::Display for Metric {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for Metric {
	type Err = UnknownLabel;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL.iter().copied().find(|m| m.label() == s).ok_or_else(|| UnknownLabel(s.into()))
	}
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Enum)]
pub enum Unit {
	WeeklyCase,
	WeeklyCasePer100k,
	WeeklyCasePerKm2,
}

impl Unit {
	pub const ALL: [Unit; 3] = [Unit::WeeklyCase, Unit::WeeklyCasePer100k, Unit::WeeklyCasePerKm2];

	pub fn label(&self) -> &'static str {
		match self {
			Self::WeeklyCase => "Weekly Case",
			Self::WeeklyCasePer100k => "Weekly Case per 100k",
			Self::WeeklyCasePerKm2 => "Weekly Case per km2",
		}
	}
}

impl fmt::Display for Unit {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for Unit {
	type Err = UnknownLabel;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL.iter().copied().find(|u| u.label() == s).ok_or_else(|| UnknownLabel(s.into()))
	}
}

macro_rules! serialize_as_label {
	($t:ty) => {
		impl Serialize for $t {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_str(self.label())
			}
		}
	}
}

serialize_as_label!(Metric);
serialize_as_label!(Unit);


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub SmartString);

impl fmt::Display for UnknownLabel {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "unknown label {:?}", self.0)
	}
}

impl std::error::Error for UnknownLabel {}


/// Numeric country code as the map layer joins on it: at least three
/// characters, left-padded with zeroes.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode(SmartString);

impl CountryCode {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl FromStr for CountryCode {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		// integral floats ("12.0") show up when the column had gaps upstream
		let digits = match s.split_once('.') {
			Some((int, frac)) if !int.is_empty() && frac.bytes().all(|b| b == b'0') => int,
			_ => s,
		};
		// zfill: a leading sign stays in front of the padding, "" becomes "000"
		let (sign, body) = match digits.strip_prefix(|c: char| c == '-' || c == '+') {
			Some(rest) => (&digits[..1], rest),
			None => ("", digits),
		};
		let mut padded = SmartString::from(sign);
		for _ in digits.chars().count()..3 {
			padded.push('0');
		}
		padded.push_str(body);
		Ok(CountryCode(padded))
	}
}

impl fmt::Display for CountryCode {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de>
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

impl Serialize for CountryCode {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}


/// Numeric cell which degrades to NaN instead of failing the row.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
	where D: Deserializer<'de>
{
	let s = String::deserialize(deserializer)?;
	Ok(s.trim().parse::<f64>().unwrap_or(f64::NAN))
}


fn week_number_compat<'de, D>(deserializer: D) -> Result<u32, D::Error>
	where D: Deserializer<'de>
{
	let s = String::deserialize(deserializer)?;
	let s = s.trim();
	if let Ok(week) = s.parse::<u32>() {
		return Ok(week)
	}
	// "1.0" when the column was carried as float upstream
	match s.parse::<f64>() {
		Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
		_ => Err(de::Error::custom(format!("invalid MMWR week: {:?}", s))),
	}
}


fn week_start_compat<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
	where D: Deserializer<'de>
{
	let s = String::deserialize(deserializer)?;
	let s = s.trim();
	if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
		return Ok(d)
	}
	// YYYY/MM/DD, possibly followed by a time
	if let Some(prefix) = s.get(..10) {
		if let Ok(d) = NaiveDate::parse_from_str(&prefix.replace("/", "-"), "%Y-%m-%d") {
			return Ok(d)
		}
	}
	NaiveDate::parse_from_str(s, "%m/%d/%Y").map_err(de::Error::custom)
}


#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyRecord {
	#[serde(rename = "Country_Region")]
	pub country: SmartString,
	#[serde(rename = "country-code")]
	pub country_code: CountryCode,
	#[serde(rename = "Population", deserialize_with = "lenient_f64")]
	pub population: f64,
	#[serde(rename = "Density (P/Km²)", deserialize_with = "lenient_f64")]
	pub density: f64,
	#[serde(rename = "Week_Start_Date", deserialize_with = "week_start_compat")]
	pub week_start: NaiveDate,
	#[serde(rename = "MMWR_week", deserialize_with = "week_number_compat")]
	pub mmwr_week: u32,
	#[serde(rename = "Confirmed", deserialize_with = "lenient_f64")]
	pub confirmed: f64,
	#[serde(rename = "Deaths", deserialize_with = "lenient_f64")]
	pub deaths: f64,
	#[serde(rename = "Recovered", deserialize_with = "lenient_f64")]
	pub recovered: f64,
	#[serde(rename = "Active", deserialize_with = "lenient_f64")]
	pub active: f64,
}

impl WeeklyRecord {
	pub fn raw(&self, metric: Metric) -> f64 {
		match metric {
			Metric::Confirmed => self.confirmed,
			Metric::Deaths => self.deaths,
			Metric::Recovered => self.recovered,
			Metric::Active => self.active,
		}
	}

	/// Raw count and its population-normalised variants. Population is
	/// not checked: zero yields NaN or infinity.
	pub fn variants(&self, metric: Metric) -> EnumMap<Unit, f64> {
		let raw = self.raw(metric);
		enum_map! {
			Unit::WeeklyCase => raw,
			Unit::WeeklyCasePer100k => raw / self.population * 100000.0,
			Unit::WeeklyCasePerKm2 => raw / self.population * self.density,
		}
	}
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongObservation {
	#[serde(rename = "Country_Region")]
	pub country: SmartString,
	#[serde(rename = "country-code")]
	pub country_code: CountryCode,
	#[serde(rename = "Population")]
	pub population: f64,
	#[serde(rename = "Density (P/Km²)")]
	pub density: f64,
	#[serde(rename = "Week_Start_Date")]
	pub week_start: NaiveDate,
	#[serde(rename = "MMWR_week")]
	pub mmwr_week: u32,
	#[serde(rename = "Metric")]
	pub metric: Metric,
	#[serde(rename = "Case_Category")]
	pub unit: Unit,
	#[serde(rename = "Case")]
	pub value: f64,
}


/// Read the weekly table. The trailing metadata columns are discarded
/// before the header is checked.
pub fn read_weekly<R: io::Read>(r: R) -> Result<Vec<WeeklyRecord>, Error> {
	let mut r = csv::Reader::from_reader(r);
	let full_headers = r.headers()?.clone();
	let keep = full_headers.len().saturating_sub(DROPPED_TRAILING_COLUMNS);
	let headers: csv::StringRecord = full_headers.iter().take(keep).collect();
	debug!("dropping trailing columns {:?}", full_headers.iter().skip(keep).collect::<Vec<_>>());

	let missing: Vec<String> = REQUIRED_COLUMNS.iter()
		.filter(|name| !headers.iter().any(|h| h == **name))
		.map(|name| name.to_string())
		.collect();
	if missing.len() > 0 {
		return Err(SchemaError::MissingColumns(missing).into())
	}

	let mut result = Vec::new();
	let mut row = csv::StringRecord::new();
	while r.read_record(&mut row)? {
		let mut kept: csv::StringRecord = row.iter().take(keep).collect();
		kept.set_position(row.position().cloned());
		result.push(kept.deserialize(Some(&headers))?);
	}
	info!("read {} weekly records", result.len());
	Ok(result)
}


/// Unpivot the weekly table into one row per (record, metric, unit).
///
/// Blocks are emitted per metric in [`Metric::ALL`] order. Within a block
/// all raw values come first, then all per-100k values, then all per-km²
/// values, each in input order.
pub fn reshape(records: &[WeeklyRecord]) -> Vec<LongObservation> {
	let nonpositive = records.iter().filter(|rec| !(rec.population > 0.0)).count();
	if nonpositive > 0 {
		warn!("{} weekly records have no positive population, their normalised values are undefined", nonpositive);
	}

	let mut result = Vec::with_capacity(records.len() * Metric::ALL.len() * Unit::ALL.len());
	for metric in Metric::ALL.iter().copied() {
		let variants: Vec<EnumMap<Unit, f64>> = records.iter().map(|rec| rec.variants(metric)).collect();
		for unit in Unit::ALL.iter().copied() {
			for (rec, values) in records.iter().zip(variants.iter()) {
				result.push(LongObservation{
					country: rec.country.clone(),
					country_code: rec.country_code.clone(),
					population: rec.population,
					density: rec.density,
					week_start: rec.week_start,
					mmwr_week: rec.mmwr_week,
					metric,
					unit,
					value: values[unit],
				});
			}
		}
	}
	result
}


pub fn load_from(location: &str) -> Result<Vec<LongObservation>, Error> {
	let records = read_weekly(open_source(location)?)?;
	Ok(reshape(&records))
}

static WEEKLY: Cached<Vec<LongObservation>> = Cached::new();

/// The long weekly table for this process, loaded from the configured
/// source on first use.
pub fn load() -> Result<&'static [LongObservation], Error> {
	let table = WEEKLY.get_or_load(|| {
		let config = Config::from_env();
		let table = load_from(&config.weekly_source)?;
		info!("cached {} weekly observations", table.len());
		Ok::<_, Error>(table)
	})?;
	Ok(&table[..])
}


/// Distinct country names in order of first appearance.
pub fn unique_countries<'x, I: IntoIterator<Item = &'x LongObservation>>(rows: I) -> Vec<SmartString> {
	let mut result: Vec<SmartString> = Vec::new();
	for row in rows {
		if !result.iter().any(|c| *c == row.country) {
			result.push(row.country.clone());
		}
	}
	result
}
