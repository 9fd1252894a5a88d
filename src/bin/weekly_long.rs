use std::fs::File;
use std::io;

use csv;

use log::info;

use covid_factors::{weekly, Config, LongObservation};


fn write_long<W: io::Write>(w: W, rows: &[LongObservation]) -> Result<(), csv::Error> {
	let mut w = csv::Writer::from_writer(w);
	for row in rows.iter() {
		w.serialize(row)?;
	}
	w.flush()?;
	Ok(())
}


fn main() -> Result<(), Box<dyn std::error::Error>> {
	covid_factors::init_logging();
	let argv: Vec<String> = std::env::args().collect();
	let loaded;
	let rows: &[LongObservation] = match argv.get(1) {
		Some(source) => {
			loaded = weekly::load_from(source)?;
			&loaded
		},
		None => {
			info!("no source given, using {}", Config::from_env().weekly_source);
			weekly::load()?
		},
	};
	info!("{} countries, {} long rows", weekly::unique_countries(rows).len(), rows.len());
	match argv.get(2) {
		Some(out) => {
			info!("writing {}", out);
			write_long(File::create(out)?, rows)?;
		},
		None => write_long(io::stdout().lock(), rows)?,
	}
	Ok(())
}
