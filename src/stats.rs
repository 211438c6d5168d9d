//! Small array helpers
//!
//! Median selection and the sampling helpers used to lay out regular grids and
//! wavelength chunks.

/// Median of the data, the mean of the two central values for an even length
///
/// Returns `None` for empty data and NaN if any value is NaN.
pub fn median(data: &[f64]) -> Option<f64> {
    if data.iter().any(|x| x.is_nan()) {
        return Some(f64::NAN);
    }
    let mut values = data.to_vec();
    let n = values.len();
    if n == 0 {
        return None;
    }
    let (lower, &mut upper, _) = values.select_nth_unstable_by(n / 2, f64::total_cmp);
    if n % 2 == 1 {
        Some(upper)
    } else {
        let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((below + upper) / 2.)
    }
}

/// Median of the values whose mask is `false`, `None` if all are masked
pub fn masked_median(data: impl IntoIterator<Item = (f64, bool)>) -> Option<f64> {
    let valid: Vec<f64> = data
        .into_iter()
        .filter_map(|(x, masked)| (!masked).then_some(x))
        .collect();
    median(&valid)
}

/// Evenly spaced values in `[start, stop)` with the given `step`
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).ceil().max(0.) as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// `n` evenly spaced values from `start` to `stop` inclusive
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Splits `0..len` into `n` contiguous ranges of near-equal lengths
///
/// The first `len % n` ranges hold one extra element; trailing ranges are
/// empty when `n > len`.
pub fn array_split(len: usize, n: usize) -> Vec<std::ops::Range<usize>> {
    let n = n.max(1);
    let (size, extra) = (len / n, len % n);
    let mut start = 0;
    (0..n)
        .map(|i| {
            let end = start + size + usize::from(i < extra);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}
