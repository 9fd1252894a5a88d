use std::fmt;
use std::io;


#[derive(Debug)]
pub enum SchemaError {
	MissingColumns(Vec<String>),
	ColumnCount{expected: usize, found: usize},
	ValueRange{column: &'static str, row: usize, value: f64},
}

impl fmt::Display for SchemaError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::MissingColumns(cols) => write!(f, "missing required columns: {}", cols.join(", ")),
			Self::ColumnCount{expected, found} => write!(f, "expected {} columns, found {}", expected, found),
			Self::ValueRange{column, row, value} => write!(f, "implausible value {} in column {} at row {}, refusing positional rename", value, column, row),
		}
	}
}

impl std::error::Error for SchemaError {}


#[derive(Debug)]
pub enum Error {
	Schema(SchemaError),
	Io(io::Error),
	Csv(csv::Error),
	Request(reqwest::Error),
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Schema(e) => write!(f, "schema error: {}", e),
			Self::Io(e) => fmt::Display::fmt(e, f),
			Self::Csv(e) => fmt::Display::fmt(e, f),
			Self::Request(e) => fmt::Display::fmt(e, f),
		}
	}
}

impl From<SchemaError> for Error {
	fn from(err: SchemaError) -> Self {
		Self::Schema(err)
	}
}

impl From<io::Error> for Error {
	fn from(err: io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<csv::Error> for Error {
	fn from(err: csv::Error) -> Self {
		Self::Csv(err)
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Self::Request(err)
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Schema(e) => Some(e),
			Self::Io(e) => Some(e),
			Self::Csv(e) => Some(e),
			Self::Request(e) => Some(e),
		}
	}
}
