use std::io;

use csv;

use log::info;

use covid_factors::{factors, indicators, Column, Config, IndicatorRecord};


fn main() -> Result<(), Box<dyn std::error::Error>> {
	covid_factors::init_logging();
	let argv: Vec<String> = std::env::args().collect();
	if argv.len() < 3 {
		eprintln!("usage: {} X_COLUMN Y_COLUMN [SOURCE]", argv[0]);
		std::process::exit(2);
	}
	let x: Column = argv[1].parse()?;
	let y: Column = argv[2].parse()?;
	let loaded;
	let records: &[IndicatorRecord] = match argv.get(3) {
		Some(source) => {
			loaded = indicators::load_from(source)?;
			&loaded
		},
		None => {
			info!("no source given, using {}", Config::from_env().indicator_source);
			indicators::load()?
		},
	};
	let all: Vec<&IndicatorRecord> = records.iter().collect();
	let summary = factors::scatter(&all, x, y);
	println!("{} vs {} over {} countries", x.title(), y.title(), all.len());
	println!("correlation: {:.2}", summary.correlation);
	println!("fit: slope={} intercept={}", summary.fit.slope, summary.fit.intercept);
	let xs: Vec<f64> = all.iter().map(|rec| rec.value(x)).collect();
	if let Some(((x0, y0), (x1, y1))) = summary.fit.span(&xs) {
		println!("line: ({}, {}) -> ({}, {})", x0, y0, x1, y1);
	}

	let mut w = csv::Writer::from_writer(io::stdout().lock());
	for cell in factors::correlation_matrix(records, &Column::HEATMAP_COLUMNS) {
		w.serialize(cell)?;
	}
	w.flush()?;
	Ok(())
}
