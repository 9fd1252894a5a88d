use chrono::{Datelike, Duration, NaiveDate};


/// First day (a Sunday) of MMWR week 1 of `year`.
///
/// Week 1 is the first Sunday-started week with at least four of its days
/// in `year`, i.e. the week containing the first Wednesday of January.
pub fn mmwr_year_start(year: i32) -> Option<NaiveDate> {
	let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
	let offset = jan1.weekday().num_days_from_sunday() as i64;
	if offset <= 3 {
		Some(jan1 - Duration::days(offset))
	} else {
		Some(jan1 + Duration::days(7 - offset))
	}
}

/// MMWR (epidemiological) week number of `date`.
///
/// Days before week 1 of their calendar year count towards the last week
/// of the previous MMWR year; late December days may already be week 1.
pub fn mmwr_week(date: NaiveDate) -> u32 {
	let year = date.year();
	let start = match (mmwr_year_start(year + 1), mmwr_year_start(year)) {
		(Some(next), _) if date >= next => next,
		(_, Some(this)) if date >= this => this,
		_ => match mmwr_year_start(year - 1) {
			Some(prev) => prev,
			// outside of chrono's range, nothing sensible to report
			None => return 0,
		},
	};
	((date - start).num_days() / 7 + 1) as u32
}


/// Inclusive range of MMWR week numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
	pub start: u32,
	pub end: u32,
}

impl WeekRange {
	pub fn new(start: u32, end: u32) -> Self {
		Self{start, end}
	}

	/// Week range covered by a calendar date range. Dates are converted
	/// individually, so an inverted or year-crossing range may come out
	/// empty.
	pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
		Self::new(mmwr_week(start), mmwr_week(end))
	}

	pub fn contains(&self, week: u32) -> bool {
		self.start <= week && week <= self.end
	}

	pub fn is_empty(&self) -> bool {
		self.start > self.end
	}
}

pub fn dashboard_first_day() -> NaiveDate {
	NaiveDate::from_ymd(2020, 1, 1)
}

pub fn dashboard_last_day() -> NaiveDate {
	NaiveDate::from_ymd(2020, 12, 31)
}

/// The full 2020 range the date slider starts out with.
pub fn week_range_2020() -> WeekRange {
	WeekRange::from_dates(dashboard_first_day(), dashboard_last_day())
}
