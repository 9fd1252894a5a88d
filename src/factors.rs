//! Views over the indicator table: country subsets, the scatter summary,
//! the correlation heatmap and the bar chart ordering.

use std::cmp::Ordering;

use serde::Serialize;

use super::indicators::{Column, IndicatorRecord};
use super::stats::{linear_fit, pearson, LinearFit};


pub fn select_countries<'x, S: AsRef<str>>(records: &'x [IndicatorRecord], countries: &[S]) -> Vec<&'x IndicatorRecord> {
	records.iter()
		.filter(|rec| countries.iter().any(|c| c.as_ref() == rec.country.as_str()))
		.collect()
}

fn column_values(records: &[&IndicatorRecord], column: Column) -> Vec<f64> {
	records.iter().map(|rec| rec.value(column)).collect()
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterSummary {
	pub correlation: f64,
	pub fit: LinearFit<f64>,
}

/// Correlation and regression line of `y` against `x` over the given
/// subset.
pub fn scatter(records: &[&IndicatorRecord], x: Column, y: Column) -> ScatterSummary {
	let xs = column_values(records, x);
	let ys = column_values(records, y);
	ScatterSummary{
		correlation: pearson(&xs, &ys),
		fit: linear_fit(&xs, &ys),
	}
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationCell {
	#[serde(rename = "Variable 1")]
	pub variable_1: Column,
	#[serde(rename = "Variable 2")]
	pub variable_2: Column,
	#[serde(rename = "Correlation")]
	pub correlation: f64,
}

/// Pairwise correlations in long form, one cell per (first, second)
/// column pair. Cells are grouped by the second variable.
pub fn correlation_matrix(records: &[IndicatorRecord], columns: &[Column]) -> Vec<CorrelationCell> {
	let values: Vec<Vec<f64>> = columns.iter()
		.map(|c| records.iter().map(|rec| rec.value(*c)).collect())
		.collect();
	let mut result = Vec::with_capacity(columns.len() * columns.len());
	for (j, second) in columns.iter().enumerate() {
		for (i, first) in columns.iter().enumerate() {
			result.push(CorrelationCell{
				variable_1: *first,
				variable_2: *second,
				correlation: pearson(&values[i], &values[j]),
			});
		}
	}
	result
}


/// Finite minimum and maximum of a column.
pub fn extent(records: &[IndicatorRecord], column: Column) -> Option<(f64, f64)> {
	let mut finite = records.iter().map(|rec| rec.value(column)).filter(|v| v.is_finite());
	let first = finite.next()?;
	Some(finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Records whose `column` lies in `lo..=hi`.
pub fn filter_range(records: &[IndicatorRecord], column: Column, lo: f64, hi: f64) -> Vec<&IndicatorRecord> {
	records.iter()
		.filter(|rec| {
			let v = rec.value(column);
			lo <= v && v <= hi
		})
		.collect()
}

/// Largest first, NaN at the end; ties keep their input order.
pub fn rank_by<'x>(records: &[&'x IndicatorRecord], column: Column) -> Vec<&'x IndicatorRecord> {
	let mut result = records.to_vec();
	result.sort_by(|a, b| {
		let (a, b) = (a.value(column), b.value(column));
		match (a.is_nan(), b.is_nan()) {
			(true, true) => Ordering::Equal,
			(true, false) => Ordering::Greater,
			(false, true) => Ordering::Less,
			(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
		}
	});
	result
}


#[cfg(test)]
mod tests {
	use super::*;

	use crate::indicators::tests::sample;

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() <= 1e-9
	}

	#[test]
	fn scatter_on_selected_subset() {
		let records = sample();
		let all = select_countries(&records, &["A", "B", "C"][..]);
		let summary = scatter(&all, Column::Gdp, Column::Gdp);
		assert!(close(summary.correlation, 1.0));
		assert!(close(summary.fit.slope, 1.0));
		assert!(close(summary.fit.intercept, 0.0));

		let two = select_countries(&records, &["A", "B"][..]);
		let summary = scatter(&two, Column::HealthExpenditure, Column::ConfirmedRatio);
		// A: (5.5, 0.1), B: (8.0, 0.05)
		assert!(close(summary.correlation, -1.0));
		assert!(close(summary.fit.slope, -0.02));
	}

	#[test]
	fn fewer_than_two_countries_is_undefined() {
		let records = sample();
		let one = select_countries(&records, &["B"][..]);
		let summary = scatter(&one, Column::Gdp, Column::DeathsRatio);
		assert!(summary.correlation.is_nan());
		assert!(!summary.fit.is_defined());
		assert!(select_countries(&records, &["Atlantis"][..]).is_empty());
	}

	#[test]
	fn heatmap_is_long_and_symmetric() {
		let records = sample();
		let cells = correlation_matrix(&records, &Column::HEATMAP_COLUMNS);
		let n = Column::HEATMAP_COLUMNS.len();
		assert_eq!(cells.len(), n * n);
		assert_eq!(cells[0].variable_1, Column::HealthExpenditure);
		assert_eq!(cells[1].variable_1, Column::DeathRate);
		assert_eq!(cells[1].variable_2, Column::HealthExpenditure);
		assert_eq!(cells[n].variable_2, Column::DeathRate);
		for cell in cells.iter() {
			let mirror = cells.iter()
				.find(|c| c.variable_1 == cell.variable_2 && c.variable_2 == cell.variable_1)
				.unwrap();
			assert!((cell.correlation.is_nan() && mirror.correlation.is_nan()) || close(cell.correlation, mirror.correlation));
			if cell.variable_1 == cell.variable_2 && !cell.correlation.is_nan() {
				assert!(close(cell.correlation, 1.0));
			}
		}
	}

	#[test]
	fn heatmap_cells_serialize_with_chart_headers() {
		let records = sample();
		let cells = correlation_matrix(&records, &[Column::Gdp, Column::Population]);
		let mut w = csv::Writer::from_writer(Vec::new());
		w.serialize(&cells[1]).unwrap();
		let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
		let mut lines = text.lines();
		assert_eq!(lines.next(), Some("Variable 1,Variable 2,Correlation"));
		assert!(lines.next().unwrap().starts_with("population,GDP,"));
	}

	#[test]
	fn slider_extent_and_range_filter() {
		let records = sample();
		assert_eq!(extent(&records, Column::Gdp), Some((500.0, 3000.0)));
		let picked = filter_range(&records, Column::Gdp, 500.0, 1000.0);
		let names: Vec<&str> = picked.iter().map(|r| r.country.as_str()).collect();
		assert_eq!(names, vec!["A", "C"]);
		assert!(filter_range(&records, Column::Gdp, 2000.0, 1000.0).is_empty());
	}

	#[test]
	fn extent_of_empty_table() {
		assert_eq!(extent(&[], Column::Gdp), None);
	}

	#[test]
	fn bars_are_ranked_descending() {
		let records = sample();
		let all: Vec<&IndicatorRecord> = records.iter().collect();
		let ranked = rank_by(&all, Column::Active);
		let names: Vec<&str> = ranked.iter().map(|r| r.country.as_str()).collect();
		assert_eq!(names, vec!["B", "A", "C"]);
	}

	#[test]
	fn nan_bars_go_last() {
		let mut records = sample();
		records[1].active = f64::NAN;
		let all: Vec<&IndicatorRecord> = records.iter().collect();
		let ranked = rank_by(&all, Column::Active);
		let names: Vec<&str> = ranked.iter().map(|r| r.country.as_str()).collect();
		assert_eq!(names, vec!["A", "C", "B"]);
	}
}
