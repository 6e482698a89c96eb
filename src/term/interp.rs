/// Interpolate `ys` at `x` over the ascending grid `xs`.
///
/// - Exact matches (within 1e-10) return stored values directly.
/// - Before the first or after the last node: flat extrapolation.
/// - Between nodes: linear.
///
/// `xs` must be non-empty, strictly increasing and the same length as `ys`.
pub(crate) fn linear_flat(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len();

    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    if let Some(i) = xs.iter().position(|&node| (x - node).abs() < 1e-10) {
        return ys[i];
    }

    let right = xs.partition_point(|&node| node < x);
    let left = right - 1;
    let alpha = (x - xs[left]) / (xs[right] - xs[left]);
    (1.0 - alpha) * ys[left] + alpha * ys[right]
}
