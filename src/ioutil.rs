use std::io;
use std::io::Read;
use std::fs;
use std::path::Path;

use log::info;

use flate2;

use super::error::Error;


pub fn magic_open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
	let path = path.as_ref();
	match path.extension() {
		Some(x) if x == "gz" => {
			Ok(Box::new(flate2::read::GzDecoder::new(fs::File::open(path)?)))
		},
		_ => Ok(Box::new(fs::File::open(path)?)),
	}
}


fn is_url(location: &str) -> bool {
	location.starts_with("http://") || location.starts_with("https://")
}


/// Open a table source: URLs are fetched with a single blocking request,
/// anything else goes through [`magic_open`].
pub fn open_source(location: &str) -> Result<Box<dyn Read>, Error> {
	if is_url(location) {
		info!("fetching {}", location);
		let resp = reqwest::blocking::get(location)?.error_for_status()?;
		Ok(Box::new(resp))
	} else {
		info!("opening {}", location);
		Ok(magic_open(location)?)
	}
}
