// kernel.rs - Adaptive-bandwidth Epanechnikov smoothing for threshold search

use crate::core::settings::KernelSettings;

/// Bandwidth at index `i`: grows as sqrt(i), clamped to `[min_bw, max_bw]`
pub fn smoothing_bandwidth(i: usize, min_bw: f64, max_bw: f64) -> f64 {
    (i as f64).sqrt().max(min_bw).min(max_bw)
}

/// Epanechnikov kernel weight (unnormalised). A zero bandwidth only weights
/// the point itself.
pub fn epanechnikov_weight(bandwidth: f64, offset: f64) -> f64 {
    if bandwidth <= 0.0 {
        return if offset == 0.0 { 1.0 } else { 0.0 };
    }
    let u = offset / bandwidth;
    (1.0 - u * u).max(0.0)
}

/// Kernel-weighted average of the masses around index `i`
pub fn smoothed_mass(masses: &[f64], i: usize, bandwidth: f64) -> f64 {
    if masses.is_empty() {
        return 0.0;
    }
    let reach = bandwidth.max(0.0).ceil() as usize;
    let lo = i.saturating_sub(reach);
    let hi = (i + reach).min(masses.len() - 1);

    let (mut weighted, mut total_weight) = (0.0, 0.0);
    for (j, &m) in masses.iter().enumerate().take(hi + 1).skip(lo) {
        let w = epanechnikov_weight(bandwidth, j as f64 - i as f64);
        weighted += m * w;
        total_weight += w;
    }
    if total_weight == 0.0 {
        0.0
    } else {
        weighted / total_weight
    }
}

/// Smooth every index with its own bandwidth
pub fn kernel_smooth(masses: &[f64], settings: &KernelSettings) -> Vec<f64> {
    (0..masses.len())
        .map(|i| {
            let bw = smoothing_bandwidth(i, settings.min_bandwidth, settings.max_bandwidth);
            smoothed_mass(masses, i, bw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_smoothing_bandwidth() {
        assert_abs_diff_eq!(smoothing_bandwidth(0, 2.0, 10.0), 2.0);
        assert_abs_diff_eq!(smoothing_bandwidth(9, 2.0, 10.0), 3.0);
        assert_abs_diff_eq!(smoothing_bandwidth(400, 2.0, 10.0), 10.0);
        let widths: Vec<f64> = (0..200).map(|i| smoothing_bandwidth(i, 1.0, 8.0)).collect();
        assert!(widths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_epanechnikov_weight() {
        assert_abs_diff_eq!(epanechnikov_weight(0.0, 0.0), 1.0);
        assert_abs_diff_eq!(epanechnikov_weight(0.0, 0.5), 0.0);
        assert_abs_diff_eq!(epanechnikov_weight(0.0, -0.5), 0.0);
        assert_abs_diff_eq!(epanechnikov_weight(0.0, 5.0), 0.0);

        assert_abs_diff_eq!(epanechnikov_weight(1.0, 0.0), 1.0);
        assert_abs_diff_eq!(epanechnikov_weight(1.0, 0.5), 0.75);
        assert_abs_diff_eq!(epanechnikov_weight(1.0, 1.0), 0.0);
        assert_abs_diff_eq!(epanechnikov_weight(1.0, 5.0), 0.0);
        assert_abs_diff_eq!(epanechnikov_weight(1.0, -0.5), 0.75);
        assert_abs_diff_eq!(epanechnikov_weight(1.0, -5.0), 0.0);

        assert_abs_diff_eq!(epanechnikov_weight(5.0, 2.5), 0.75);
        assert_abs_diff_eq!(epanechnikov_weight(5.0, -2.5), 0.75);
        assert_abs_diff_eq!(epanechnikov_weight(5.0, 5.0), 0.0);
        assert_abs_diff_eq!(epanechnikov_weight(5.0, -10.0), 0.0);
    }

    #[test]
    fn test_smoothed_mass_of_flat_distribution() {
        let masses = [0.1; 11];
        for &i in &[0, 3, 10] {
            for &bw in &[0.0, 1.0, 5.0] {
                assert_abs_diff_eq!(smoothed_mass(&masses, i, bw), 0.1, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_smoothed_mass_spreads_spike() {
        let masses = [0.0, 0.0, 1.0, 0.0, 0.0];
        assert_abs_diff_eq!(smoothed_mass(&masses, 2, 0.0), 1.0);
        // bw 2: weights 0, 0.75, 1, 0.75, 0 -> 1 / 2.5
        assert_abs_diff_eq!(smoothed_mass(&masses, 2, 2.0), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed_mass(&masses, 3, 2.0), 0.75 / 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed_mass(&[], 0, 2.0), 0.0);
    }

    #[test]
    fn test_kernel_smooth_flattens_tail() {
        let mut masses = vec![0.0; 120];
        masses[3] = 0.6;
        for i in (100..110).step_by(2) {
            masses[i] = 0.08;
        }
        let settings = KernelSettings::default();
        let smoothed = kernel_smooth(&masses, &settings);
        assert_eq!(smoothed.len(), masses.len());
        assert!((smoothed[104] - smoothed[105]).abs() < (masses[104] - masses[105]).abs());
    }
}
