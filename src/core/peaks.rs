// peaks.rs - Peak detection and turning-point search over mass arrays

/// Dominant peak of a distribution together with the extent of its mass
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSummary {
    pub peak: usize,
    pub left: usize,
    pub right: usize,
    pub total_mass: f64,
    /// One line per detected peak with its share of the total mass
    pub log: Vec<String>,
}

/// Sub-index offset of a peak at `b` given its neighbours `a` (left) and `c`
/// (right). Ranges from -0.5 to 0.5; a flat neighbourhood gives 0.
pub fn interpolate(a: f64, b: f64, c: f64) -> f64 {
    let denominator = 2.0 * (b - a.min(c));
    if denominator == 0.0 {
        return 0.0;
    }
    (c - a) / denominator
}

/// Indices of all local maxima. A plateau is reported once, at its
/// rounded-down midpoint, and only when every neighbour it has is lower.
pub fn find_peaks(masses: &[f64]) -> Vec<usize> {
    let n = masses.len();
    let mut peaks = Vec::new();
    let mut start = 0;
    while start < n {
        let mut end = start;
        while end + 1 < n && masses[end + 1] == masses[start] {
            end += 1;
        }
        let value = masses[start];
        let left = if start > 0 { Some(masses[start - 1]) } else { None };
        let right = if end + 1 < n { Some(masses[end + 1]) } else { None };
        let has_neighbour = left.is_some() || right.is_some();
        let left_lower = left.map_or(true, |m| m < value);
        let right_lower = right.map_or(true, |m| m < value);
        if has_neighbour && left_lower && right_lower {
            peaks.push((start + end) / 2);
        }
        start = end + 1;
    }
    peaks
}

/// Hill-climb from `start`. Moves right only to a strictly higher point that
/// also beats the left neighbour; otherwise moves left whenever the left
/// neighbour is at least as high, so ties resolve to the lower index.
pub fn climb_to_peak(masses: &[f64], start: usize) -> usize {
    if masses.is_empty() {
        return 0;
    }
    let mut i = start.min(masses.len() - 1);
    loop {
        let here = masses[i];
        let left = if i > 0 { Some(masses[i - 1]) } else { None };
        let right = masses.get(i + 1).copied();

        let go_right = match (left, right) {
            (_, None) => false,
            (None, Some(r)) => r > here,
            (Some(l), Some(r)) => r > here && r > l,
        };
        if go_right {
            i += 1;
            continue;
        }
        let go_left = match (left, right) {
            (None, _) => false,
            (Some(l), None) => l >= here,
            (Some(l), Some(r)) => l >= here && l >= r,
        };
        if go_left {
            i -= 1;
            continue;
        }
        return i;
    }
}

/// Mass of the hill around `peak`: extends outwards while the curve does not
/// rise. Returns `(total_mass, left_bound, right_bound)`, bounds inclusive.
pub fn get_peak_total_mass(masses: &[f64], peak: usize) -> (f64, usize, usize) {
    if peak >= masses.len() {
        return (0.0, peak, peak);
    }
    let mut total = masses[peak];

    let mut left = peak;
    while left > 0 && masses[left - 1] <= masses[left] {
        left -= 1;
        total += masses[left];
    }
    let mut right = peak;
    while right + 1 < masses.len() && masses[right + 1] <= masses[right] {
        right += 1;
        total += masses[right];
    }
    (total, left, right)
}

/// The peak holding the most mass. Ties keep the lower-index peak.
pub fn get_peak_distance(masses: &[f64]) -> PeakSummary {
    let mut peaks = find_peaks(masses);
    if peaks.is_empty() {
        peaks.push(climb_to_peak(masses, 0));
    }
    let grand_total: f64 = masses.iter().sum();

    let log = Vec::with_capacity(peaks.len());
    let first = peaks[0];
    let (first_mass, first_left, first_right) = get_peak_total_mass(masses, first);
    let ((peak, total_mass, left, right), log) = peaks.iter().fold(
        ((first, first_mass, first_left, first_right), log),
        |(best, mut log), &p| {
            let (mass, left, right) = get_peak_total_mass(masses, p);
            let share = if grand_total > 0.0 { 100.0 * mass / grand_total } else { 0.0 };
            log.push(format!("peak at {} ({}-{}): {:.1}% of mass", p, left, right, share));
            let best = if mass > best.1 { (p, mass, left, right) } else { best };
            (best, log)
        },
    );

    PeakSummary { peak, left, right, total_mass, log }
}

/// Walk right while the curve falls (or stays flat); the index where it
/// starts to rise. `None` if the walk reaches the end of the array.
pub fn find_local_minimum_to_right(masses: &[f64], start: usize) -> Option<usize> {
    let mut i = start;
    while i + 1 < masses.len() {
        if masses[i + 1] > masses[i] {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn find_local_minimum_to_left(masses: &[f64], start: usize) -> Option<usize> {
    if start >= masses.len() {
        return None;
    }
    let mut i = start;
    while i > 0 {
        if masses[i - 1] > masses[i] {
            return Some(i);
        }
        i -= 1;
    }
    None
}

/// Walk right while the curve rises (or stays flat); the index where it
/// starts to fall. `None` if the walk reaches the end of the array.
pub fn find_local_maximum_to_right(masses: &[f64], start: usize) -> Option<usize> {
    let mut i = start;
    while i + 1 < masses.len() {
        if masses[i + 1] < masses[i] {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn find_local_maximum_to_left(masses: &[f64], start: usize) -> Option<usize> {
    if start >= masses.len() {
        return None;
    }
    let mut i = start;
    while i > 0 {
        if masses[i - 1] < masses[i] {
            return Some(i);
        }
        i -= 1;
    }
    None
}
