use num_traits::Float;


// Pairs where both sides are numbers; anything with a NaN is dropped.
fn complete_pairs<'x, F: Float>(xs: &'x [F], ys: &'x [F]) -> impl Iterator<Item = (F, F)> + 'x {
	xs.iter().copied().zip(ys.iter().copied()).filter(|(x, y)| !x.is_nan() && !y.is_nan())
}

struct Moments<F> {
	n: usize,
	mean_x: F,
	mean_y: F,
	sxx: F,
	syy: F,
	sxy: F,
}

impl<F: Float> Moments<F> {
	fn of(xs: &[F], ys: &[F]) -> Self {
		let mut n = 0usize;
		let mut sum_x = F::zero();
		let mut sum_y = F::zero();
		for (x, y) in complete_pairs(xs, ys) {
			n += 1;
			sum_x = sum_x + x;
			sum_y = sum_y + y;
		}
		let count = F::from(n).unwrap_or_else(F::nan);
		let mean_x = sum_x / count;
		let mean_y = sum_y / count;

		let mut sxx = F::zero();
		let mut syy = F::zero();
		let mut sxy = F::zero();
		for (x, y) in complete_pairs(xs, ys) {
			let dx = x - mean_x;
			let dy = y - mean_y;
			sxx = sxx + dx * dx;
			syy = syy + dy * dy;
			sxy = sxy + dx * dy;
		}
		Self{n, mean_x, mean_y, sxx, syy, sxy}
	}
}


/// Pearson correlation coefficient of `xs` and `ys`.
///
/// Positions where either side is NaN are ignored. Returns NaN when fewer
/// than two pairs remain or either side has no variance.
pub fn pearson<F: Float>(xs: &[F], ys: &[F]) -> F {
	let m = Moments::of(xs, ys);
	if m.n < 2 || m.sxx == F::zero() || m.syy == F::zero() {
		return F::nan()
	}
	let r = m.sxy / (m.sxx * m.syy).sqrt();
	r.max(-F::one()).min(F::one())
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit<F> {
	pub slope: F,
	pub intercept: F,
}

impl<F: Float> LinearFit<F> {
	pub fn predict(&self, x: F) -> F {
		self.intercept + self.slope * x
	}

	pub fn is_defined(&self) -> bool {
		!self.slope.is_nan() && !self.intercept.is_nan()
	}

	/// End points of the fitted line across the finite extent of `xs`.
	pub fn span(&self, xs: &[F]) -> Option<((F, F), (F, F))> {
		if !self.is_defined() {
			return None
		}
		let mut finite = xs.iter().copied().filter(|x| x.is_finite());
		let first = finite.next()?;
		let (lo, hi) = finite.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
		Some(((lo, self.predict(lo)), (hi, self.predict(hi))))
	}
}

/// Ordinary least squares fit of `ys` on `xs`, with the same pair
/// filtering as [`pearson`]. Undefined fits have NaN slope and intercept.
pub fn linear_fit<F: Float>(xs: &[F], ys: &[F]) -> LinearFit<F> {
	let m = Moments::of(xs, ys);
	if m.n < 2 || m.sxx == F::zero() {
		return LinearFit{slope: F::nan(), intercept: F::nan()}
	}
	let slope = m.sxy / m.sxx;
	LinearFit{
		slope,
		intercept: m.mean_y - slope * m.mean_x,
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() <= 1e-9
	}

	#[test]
	fn identical_columns_correlate_perfectly() {
		let xs = [1.0, 4.0, 2.5, 9.0, -3.0];
		assert!(close(pearson(&xs, &xs), 1.0));
	}

	#[test]
	fn negated_column_anticorrelates() {
		let xs = [1.0, 2.0, 3.0, 4.0];
		let ys: Vec<f64> = xs.iter().map(|x| -2.0 * x + 1.0).collect();
		assert!(close(pearson(&xs, &ys), -1.0));
	}

	#[test]
	fn constant_column_is_nan() {
		let xs = [3.0, 3.0, 3.0];
		let ys = [1.0, 2.0, 7.0];
		assert!(pearson(&xs, &ys).is_nan());
		assert!(pearson(&ys, &xs).is_nan());
	}

	#[test]
	fn too_few_pairs_is_nan() {
		assert!(pearson::<f64>(&[], &[]).is_nan());
		assert!(pearson(&[1.0], &[2.0]).is_nan());
		// only one complete pair survives
		assert!(pearson(&[1.0, f64::NAN, 3.0], &[2.0, 5.0, f64::NAN]).is_nan());
	}

	#[test]
	fn known_value() {
		let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
		let ys = [2.0, 4.0, 5.0, 4.0, 5.0];
		// sxy = 6, sxx = 10, syy = 6
		assert!(close(pearson(&xs, &ys), 6.0 / 60.0f64.sqrt()));
	}

	#[test]
	fn nan_pairs_are_dropped() {
		let xs = [1.0, 2.0, f64::NAN, 3.0];
		let ys = [2.0, 4.0, 100.0, 6.0];
		assert!(close(pearson(&xs, &ys), 1.0));
		let fit = linear_fit(&xs, &ys);
		assert!(close(fit.slope, 2.0));
		assert!(close(fit.intercept, 0.0));
	}

	#[test]
	fn least_squares_fit() {
		let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
		let ys = [2.0, 4.0, 5.0, 4.0, 5.0];
		let fit = linear_fit(&xs, &ys);
		assert!(close(fit.slope, 0.6));
		assert!(close(fit.intercept, 2.2));
		assert!(close(fit.predict(10.0), 8.2));
	}

	#[test]
	fn fit_without_variance_is_undefined() {
		let fit = linear_fit(&[2.0, 2.0], &[1.0, 5.0]);
		assert!(!fit.is_defined());
		assert!(fit.span(&[2.0, 2.0]).is_none());
	}

	#[test]
	fn span_covers_finite_extent() {
		let fit = LinearFit{slope: 2.0, intercept: 1.0};
		let span = fit.span(&[3.0, f64::NAN, -1.0, f64::INFINITY, 2.0]).unwrap();
		assert_eq!(span, ((-1.0, -1.0), (3.0, 7.0)));
	}

	#[test]
	fn works_on_f32() {
		let xs = [1.0f32, 2.0, 3.0];
		assert!((pearson(&xs, &xs) - 1.0).abs() < 1e-6);
	}
}
