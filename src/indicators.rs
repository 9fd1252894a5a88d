use std::fmt;
use std::io;
use std::str::FromStr;

use log::{debug, info};

use serde::{Deserialize, Serialize, Serializer};

use smartstring::alias::{String as SmartString};

use super::cache::Cached;
use super::config::Config;
use super::error::{Error, SchemaError};
use super::ioutil::open_source;
use super::weekly::{lenient_f64, UnknownLabel};


/// Canonical names, by position, of the indicator file's columns.
pub static INDICATOR_COLUMNS: [&'static str; 15] = [
	"country",
	"health_expenditure",
	"death_rate",
	"GDP",
	"life_expectancy",
	"literacy_rate",
	"net_migration",
	"poverty_ratio",
	"unemployment",
	"population",
	"density",
	"confirmed",
	"deaths",
	"recovered",
	"active",
];


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
	HealthExpenditure,
	DeathRate,
	Gdp,
	LifeExpectancy,
	LiteracyRate,
	NetMigration,
	PovertyRatio,
	Unemployment,
	Population,
	Density,
	Confirmed,
	Deaths,
	Recovered,
	Active,
	ConfirmedRatio,
	DeathsRatio,
	RecoveredRatio,
	ActiveRatio,
}

impl Column {
	pub const ALL: [Column; 18] = [
		Column::HealthExpenditure,
		Column::DeathRate,
		Column::Gdp,
		Column::LifeExpectancy,
		Column::LiteracyRate,
		Column::NetMigration,
		Column::PovertyRatio,
		Column::Unemployment,
		Column::Population,
		Column::Density,
		Column::Confirmed,
		Column::Deaths,
		Column::Recovered,
		Column::Active,
		Column::ConfirmedRatio,
		Column::DeathsRatio,
		Column::RecoveredRatio,
		Column::ActiveRatio,
	];

	/// Socioeconomic factors offered on the x and y axes.
	pub const FACTORS: [Column; 8] = [
		Column::HealthExpenditure,
		Column::DeathRate,
		Column::Gdp,
		Column::LifeExpectancy,
		Column::LiteracyRate,
		Column::NetMigration,
		Column::PovertyRatio,
		Column::Unemployment,
	];

	pub const CASE_TOTALS: [Column; 4] = [
		Column::Confirmed,
		Column::Deaths,
		Column::Recovered,
		Column::Active,
	];

	pub const RATIOS: [Column; 4] = [
		Column::ConfirmedRatio,
		Column::DeathsRatio,
		Column::RecoveredRatio,
		Column::ActiveRatio,
	];

	pub const HEATMAP_COLUMNS: [Column; 14] = [
		Column::HealthExpenditure,
		Column::DeathRate,
		Column::Gdp,
		Column::LifeExpectancy,
		Column::LiteracyRate,
		Column::NetMigration,
		Column::PovertyRatio,
		Column::Unemployment,
		Column::Population,
		Column::Density,
		Column::ConfirmedRatio,
		Column::DeathsRatio,
		Column::RecoveredRatio,
		Column::ActiveRatio,
	];

	pub fn name(&self) -> &'static str {
		match self {
			Self::HealthExpenditure => "health_expenditure",
			Self::DeathRate => "death_rate",
			Self::Gdp => "GDP",
			Self::LifeExpectancy => "life_expectancy",
			Self::LiteracyRate => "literacy_rate",
			Self::NetMigration => "net_migration",
			Self::PovertyRatio => "poverty_ratio",
			Self::Unemployment => "unemployment",
			Self::Population => "population",
			Self::Density => "density",
			Self::Confirmed => "confirmed",
			Self::Deaths => "deaths",
			Self::Recovered => "recovered",
			Self::Active => "active",
			Self::ConfirmedRatio => "covid_confirmed_ratio",
			Self::DeathsRatio => "covid_deaths_ratio",
			Self::RecoveredRatio => "covid_recovered_ratio",
			Self::ActiveRatio => "covid_active_ratio",
		}
	}

	/// Axis title: underscores become spaces and every word is
	/// capitalised, the rest lowercased (so `GDP` reads `Gdp`).
	pub fn title(&self) -> String {
		self.name()
			.split('_')
			.map(|word| {
				let mut chars = word.chars();
				match chars.next() {
					Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
					None => String::new(),
				}
			})
			.collect::<Vec<String>>()
			.join(" ")
	}

	/// The raw total a ratio is derived from.
	pub fn ratio_source(&self) -> Option<Column> {
		match self {
			Self::ConfirmedRatio => Some(Self::Confirmed),
			Self::DeathsRatio => Some(Self::Deaths),
			Self::RecoveredRatio => Some(Self::Recovered),
			Self::ActiveRatio => Some(Self::Active),
			_ => None,
		}
	}
}

impl fmt::Display for Column {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl Serialize for Column {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.name())
	}
}

impl FromStr for Column {
	type Err = UnknownLabel;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL.iter().copied().find(|c| c.name() == s).ok_or_else(|| UnknownLabel(s.into()))
	}
}


#[derive(Debug, Clone, Deserialize)]
struct RawIndicatorRow {
	country: SmartString,
	#[serde(deserialize_with = "lenient_f64")]
	health_expenditure: f64,
	#[serde(deserialize_with = "lenient_f64")]
	death_rate: f64,
	#[serde(rename = "GDP", deserialize_with = "lenient_f64")]
	gdp: f64,
	#[serde(deserialize_with = "lenient_f64")]
	life_expectancy: f64,
	#[serde(deserialize_with = "lenient_f64")]
	literacy_rate: f64,
	#[serde(deserialize_with = "lenient_f64")]
	net_migration: f64,
	#[serde(deserialize_with = "lenient_f64")]
	poverty_ratio: f64,
	#[serde(deserialize_with = "lenient_f64")]
	unemployment: f64,
	#[serde(deserialize_with = "lenient_f64")]
	population: f64,
	#[serde(deserialize_with = "lenient_f64")]
	density: f64,
	#[serde(deserialize_with = "lenient_f64")]
	confirmed: f64,
	#[serde(deserialize_with = "lenient_f64")]
	deaths: f64,
	#[serde(deserialize_with = "lenient_f64")]
	recovered: f64,
	#[serde(deserialize_with = "lenient_f64")]
	active: f64,
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRecord {
	pub country: SmartString,
	pub health_expenditure: f64,
	pub death_rate: f64,
	#[serde(rename = "GDP")]
	pub gdp: f64,
	pub life_expectancy: f64,
	pub literacy_rate: f64,
	pub net_migration: f64,
	pub poverty_ratio: f64,
	pub unemployment: f64,
	pub population: f64,
	pub density: f64,
	pub confirmed: f64,
	pub deaths: f64,
	pub recovered: f64,
	pub active: f64,
	#[serde(rename = "covid_confirmed_ratio")]
	pub confirmed_ratio: f64,
	#[serde(rename = "covid_deaths_ratio")]
	pub deaths_ratio: f64,
	#[serde(rename = "covid_recovered_ratio")]
	pub recovered_ratio: f64,
	#[serde(rename = "covid_active_ratio")]
	pub active_ratio: f64,
}

impl From<RawIndicatorRow> for IndicatorRecord {
	fn from(raw: RawIndicatorRow) -> Self {
		// zero population is not guarded, see reshape() for the weekly data
		let population = raw.population;
		Self{
			confirmed_ratio: raw.confirmed / population,
			deaths_ratio: raw.deaths / population,
			recovered_ratio: raw.recovered / population,
			active_ratio: raw.active / population,
			country: raw.country,
			health_expenditure: raw.health_expenditure,
			death_rate: raw.death_rate,
			gdp: raw.gdp,
			life_expectancy: raw.life_expectancy,
			literacy_rate: raw.literacy_rate,
			net_migration: raw.net_migration,
			poverty_ratio: raw.poverty_ratio,
			unemployment: raw.unemployment,
			population,
			density: raw.density,
			confirmed: raw.confirmed,
			deaths: raw.deaths,
			recovered: raw.recovered,
			active: raw.active,
		}
	}
}

impl IndicatorRecord {
	pub fn value(&self, column: Column) -> f64 {
		match column {
			Column::HealthExpenditure => self.health_expenditure,
			Column::DeathRate => self.death_rate,
			Column::Gdp => self.gdp,
			Column::LifeExpectancy => self.life_expectancy,
			Column::LiteracyRate => self.literacy_rate,
			Column::NetMigration => self.net_migration,
			Column::PovertyRatio => self.poverty_ratio,
			Column::Unemployment => self.unemployment,
			Column::Population => self.population,
			Column::Density => self.density,
			Column::Confirmed => self.confirmed,
			Column::Deaths => self.deaths,
			Column::Recovered => self.recovered,
			Column::Active => self.active,
			Column::ConfirmedRatio => self.confirmed_ratio,
			Column::DeathsRatio => self.deaths_ratio,
			Column::RecoveredRatio => self.recovered_ratio,
			Column::ActiveRatio => self.active_ratio,
		}
	}
}


// Columns that cannot be negative. A negative finite value there almost
// certainly means the source columns moved.
static NON_NEGATIVE: [Column; 6] = [
	Column::Population,
	Column::Density,
	Column::Confirmed,
	Column::Deaths,
	Column::Recovered,
	Column::Active,
];

fn check_ranges(records: &[IndicatorRecord]) -> Result<(), SchemaError> {
	for (row, rec) in records.iter().enumerate() {
		for column in NON_NEGATIVE.iter() {
			let value = rec.value(*column);
			if value.is_finite() && value < 0.0 {
				return Err(SchemaError::ValueRange{column: column.name(), row, value})
			}
		}
		let literacy = rec.literacy_rate;
		if literacy.is_finite() && !(0.0..=100.0).contains(&literacy) {
			return Err(SchemaError::ValueRange{column: Column::LiteracyRate.name(), row, value: literacy})
		}
	}
	Ok(())
}


/// Read the indicator table, renaming its header by position.
///
/// Source headers are not looked at beyond their count: the n-th column
/// is taken to be `INDICATOR_COLUMNS[n]`. The rename is refused when the
/// count is off or when a value-range check fails.
pub fn read_indicators<R: io::Read>(r: R) -> Result<Vec<IndicatorRecord>, Error> {
	let mut r = csv::Reader::from_reader(r);
	let source_headers = r.headers()?.clone();
	if source_headers.len() != INDICATOR_COLUMNS.len() {
		return Err(SchemaError::ColumnCount{
			expected: INDICATOR_COLUMNS.len(),
			found: source_headers.len(),
		}.into())
	}
	for (old, new) in source_headers.iter().zip(INDICATOR_COLUMNS.iter()) {
		if old != *new {
			debug!("renaming column {:?} to {:?}", old, new);
		}
	}
	let headers = csv::StringRecord::from(&INDICATOR_COLUMNS[..]);

	let mut result = Vec::new();
	for row in r.records() {
		let raw: RawIndicatorRow = row?.deserialize(Some(&headers))?;
		result.push(IndicatorRecord::from(raw));
	}
	check_ranges(&result)?;
	info!("read {} indicator records", result.len());
	Ok(result)
}


pub fn load_from(location: &str) -> Result<Vec<IndicatorRecord>, Error> {
	read_indicators(open_source(location)?)
}

static INDICATORS: Cached<Vec<IndicatorRecord>> = Cached::new();

/// The indicator table for this process, loaded from the configured
/// source on first use.
pub fn load() -> Result<&'static [IndicatorRecord], Error> {
	let table = INDICATORS.get_or_load(|| {
		let config = Config::from_env();
		let table = load_from(&config.indicator_source)?;
		info!("cached {} indicator records", table.len());
		Ok::<_, Error>(table)
	})?;
	Ok(&table[..])
}


#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	pub(crate) static SAMPLE: &'static str = "\
Country Name,Health exp,Death rate,GDP (US$),Life exp,Literacy,Net migration,Poverty,Unemployment,Pop,Density,Confirmed,Deaths,Recovered,Active
A,5.5,7.1,1000,71,90,-100,10,5,500,20,50,5,40,5
B,8.0,9.0,3000,80,99,200,2,4,2000,100,100,10,0,90
C,3.2,11.5,500,60,50,-50,40,12,1000,50,0,0,0,0
";

	pub(crate) fn sample() -> Vec<IndicatorRecord> {
		read_indicators(SAMPLE.as_bytes()).unwrap()
	}

	#[test]
	fn ratios_are_appended() {
		let records = sample();
		assert_eq!(records.len(), 3);
		let a = &records[0];
		assert_eq!(a.country.as_str(), "A");
		assert_eq!(a.confirmed_ratio, 0.1);
		assert_eq!(a.deaths_ratio, 0.01);
		assert_eq!(a.recovered_ratio, 0.08);
		assert_eq!(a.active_ratio, 0.01);
		// raw totals are kept
		assert_eq!(a.confirmed, 50.0);
		assert_eq!(a.population, 500.0);
	}

	#[test]
	fn zero_totals_yield_zero_ratios() {
		let c = &sample()[2];
		for ratio in Column::RATIOS.iter() {
			assert_eq!(c.value(*ratio), 0.0);
		}
	}

	#[test]
	fn rename_is_positional() {
		let b = &sample()[1];
		assert_eq!(b.value(Column::HealthExpenditure), 8.0);
		assert_eq!(b.value(Column::Gdp), 3000.0);
		assert_eq!(b.value(Column::NetMigration), 200.0);
		assert_eq!(b.value(Column::Active), 90.0);
	}

	#[test]
	fn serialized_record_has_nineteen_canonical_columns() {
		let mut w = csv::Writer::from_writer(Vec::new());
		w.serialize(&sample()[0]).unwrap();
		let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
		let header: Vec<&str> = text.lines().next().unwrap().split(',').collect();
		assert_eq!(header.len(), 19);
		assert_eq!(&header[..15], &INDICATOR_COLUMNS[..]);
		assert_eq!(&header[15..], &["covid_confirmed_ratio", "covid_deaths_ratio", "covid_recovered_ratio", "covid_active_ratio"][..]);
	}

	#[test]
	fn wrong_column_count_is_a_schema_error() {
		let text = "country,GDP,population\nA,1,2\n";
		match read_indicators(text.as_bytes()) {
			Err(Error::Schema(SchemaError::ColumnCount{expected: 15, found: 3})) => (),
			other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
		}
	}

	#[test]
	fn shifted_columns_fail_the_range_check() {
		// net migration ended up where population should be
		let text = "\
a,b,c,d,e,f,g,h,i,j,k,l,m,n,o
A,5.5,7.1,1000,71,90,10,5,500,-100,20,50,5,40,5
";
		match read_indicators(text.as_bytes()) {
			Err(Error::Schema(SchemaError::ValueRange{column, row, value})) => {
				assert_eq!(column, "population");
				assert_eq!(row, 0);
				assert_eq!(value, -100.0);
			},
			other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
		}
	}

	#[test]
	fn literacy_outside_percent_range_is_refused() {
		// literacy is the sixth column
		let above = "\
a,b,c,d,e,f,g,h,i,j,k,l,m,n,o
A,5.5,7.1,1000,71,90,-100,10,5,500,20,50,5,40,5
B,8.0,9.0,3000,80,150,200,2,4,2000,100,100,10,0,90
";
		match read_indicators(above.as_bytes()) {
			Err(Error::Schema(SchemaError::ValueRange{column, row, value})) => {
				assert_eq!(column, "literacy_rate");
				assert_eq!(row, 1);
				assert_eq!(value, 150.0);
			},
			other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
		}

		let below = "\
a,b,c,d,e,f,g,h,i,j,k,l,m,n,o
A,5.5,7.1,1000,71,-1,-100,10,5,500,20,50,5,40,5
";
		match read_indicators(below.as_bytes()) {
			Err(Error::Schema(SchemaError::ValueRange{column, row, value})) => {
				assert_eq!(column, "literacy_rate");
				assert_eq!(row, 0);
				assert_eq!(value, -1.0);
			},
			other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
		}
	}

	#[test]
	fn literacy_at_the_bounds_is_accepted() {
		let text = "\
a,b,c,d,e,f,g,h,i,j,k,l,m,n,o
A,5.5,7.1,1000,71,0,-100,10,5,500,20,50,5,40,5
B,8.0,9.0,3000,80,100,200,2,4,2000,100,100,10,0,90
";
		assert_eq!(read_indicators(text.as_bytes()).unwrap().len(), 2);
	}

	#[test]
	fn missing_values_are_nan_and_pass_the_range_check() {
		let text = "\
a,b,c,d,e,f,g,h,i,j,k,l,m,n,o
A,,7.1,1000,71,,10,5,500,1000,20,50,5,40,5
";
		let records = read_indicators(text.as_bytes()).unwrap();
		assert!(records[0].health_expenditure.is_nan());
		assert!(records[0].literacy_rate.is_nan());
	}

	#[test]
	fn load_reads_the_configured_source_once() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("plot2.csv");
		std::fs::write(&path, SAMPLE).unwrap();
		std::env::set_var(crate::config::INDICATOR_SOURCE_VAR, &path);

		let first = load().unwrap();
		assert_eq!(first.len(), 3);
		std::fs::remove_file(&path).unwrap();
		let second = load().unwrap();
		assert!(std::ptr::eq(first, second));
	}

	#[test]
	fn titles() {
		assert_eq!(Column::HealthExpenditure.title(), "Health Expenditure");
		assert_eq!(Column::Gdp.title(), "Gdp");
		assert_eq!(Column::ConfirmedRatio.title(), "Covid Confirmed Ratio");
	}

	#[test]
	fn columns_parse_by_canonical_name() {
		for column in Column::ALL.iter() {
			assert_eq!(column.name().parse::<Column>().unwrap(), *column);
		}
		assert_eq!("covid_active_ratio".parse::<Column>().unwrap().ratio_source(), Some(Column::Active));
		assert!("gdp".parse::<Column>().is_err());
	}
}
