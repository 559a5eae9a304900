/// Floating point type used throughout system
pub type Real = f64;

/// Replace a non-finite value with `fallback`.
#[inline]
pub fn finite_or(v: Real, fallback: Real) -> Real {
    if v.is_finite() { v } else { fallback }
}

/// `n` evenly spaced samples over the closed interval `[start, end]`.
pub fn linspace(start: Real, end: Real, n: usize) -> Vec<Real> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as Real;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as Real })
                .collect()
        }
    }
}

/// True when every element is strictly greater than its predecessor.
pub fn strictly_increasing(values: &[Real]) -> bool {
    values.windows(2).all(|w| w[1] > w[0])
}
