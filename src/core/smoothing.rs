// smoothing.rs - Force-directed relaxation of a mass distribution
//
// Each point is pulled towards its observed mass (strongly for large
// deviations) and towards the average of its neighbours. The neighbour pull
// is weak near zero distance, so a sharp low-distance peak survives while
// the noisy tail is smoothed.

/// Weight of the neighbour-averaging force at index `i`, ~0 near zero and
/// approaching 1 for large indices.
pub fn neighbour_force_scale(i: usize) -> f64 {
    let s = 2.0_f64.powf(-100.0 / (i as f64 + 5.0)) - 0.0005;
    s.max(0.0)
}

/// Relax `masses` for `iterations` rounds and renormalise to a total of 1.
/// Updates are applied in place, so later indices see their lower neighbour's
/// value from the current round.
pub fn smooth_distribution(masses: &[f64], iterations: usize) -> Vec<f64> {
    let n = masses.len();
    let mut smoothed = masses.to_vec();
    let scales: Vec<f64> = (0..n).map(neighbour_force_scale).collect();

    for _ in 0..iterations {
        for i in 0..n {
            let deviation = masses[i] - smoothed[i];
            let restoring = deviation * deviation.abs();
            let neighbour = if i > 0 && i + 1 < n {
                let neighbour_mean = (smoothed[i - 1] + smoothed[i + 1]) / 2.0;
                scales[i] * (neighbour_mean - smoothed[i])
            } else {
                0.0
            };
            smoothed[i] += restoring + neighbour;
        }
    }

    let total: f64 = smoothed.iter().sum();
    if total > 0.0 {
        for m in smoothed.iter_mut() {
            *m /= total;
        }
    }
    smoothed
}
