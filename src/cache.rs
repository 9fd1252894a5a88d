use once_cell::sync::OnceCell;


/// A value computed at most once per process.
///
/// The first successful `get_or_load` stores the result; later calls hand
/// out the stored value without running the loader. A failing loader
/// leaves the cache empty, so the error reaches the caller and nothing is
/// remembered. There is no invalidation.
pub struct Cached<T> {
	cell: OnceCell<T>,
}

impl<T> Cached<T> {
	pub const fn new() -> Self {
		Self{
			cell: OnceCell::new(),
		}
	}

	pub fn get_or_load<E, F: FnOnce() -> Result<T, E>>(&self, f: F) -> Result<&T, E> {
		self.cell.get_or_try_init(f)
	}

	pub fn get(&self) -> Option<&T> {
		self.cell.get()
	}
}

impl<T> Default for Cached<T> {
	fn default() -> Self {
		Self::new()
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	use std::cell::Cell;

	#[test]
	fn loader_runs_once() {
		let calls = Cell::new(0);
		let cache: Cached<Vec<u32>> = Cached::new();
		for _ in 0..3 {
			let v = cache.get_or_load(|| -> Result<_, ()> {
				calls.set(calls.get() + 1);
				Ok(vec![1, 2, 3])
			}).unwrap();
			assert_eq!(v, &vec![1, 2, 3]);
		}
		assert_eq!(calls.get(), 1);
	}

	#[test]
	fn failures_are_not_remembered() {
		let cache: Cached<u32> = Cached::new();
		assert_eq!(cache.get_or_load(|| Err("unreachable")), Err("unreachable"));
		assert!(cache.get().is_none());
		assert_eq!(cache.get_or_load(|| -> Result<_, &str> { Ok(7) }), Ok(&7));
		assert_eq!(cache.get(), Some(&7));
	}
}
