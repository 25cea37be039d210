// window.rs - Sliding window sampling over transformed edit traces

use crate::core::cigar::MATCH;

/// Largest step tried when choosing a window size; window size is always 100 * step.
pub const MAX_WINDOW_STEP: usize = 1000;
const WINDOW_SIZE_PER_STEP: usize = 100;

/// Pick the largest window (and its step) that still yields more than
/// `target_window_count` windows across all traces.
pub fn choose_window<T: AsRef<[u8]>>(traces: &[T], target_window_count: usize) -> (usize, usize) {
    for window_step in (1..=MAX_WINDOW_STEP).rev() {
        let window_size = window_step * WINDOW_SIZE_PER_STEP;
        if window_count(traces, window_size, window_step) > target_window_count {
            return (window_size, window_step);
        }
    }
    (WINDOW_SIZE_PER_STEP, 1)
}

/// Total number of full windows across all traces
pub fn window_count<T: AsRef<[u8]>>(traces: &[T], window_size: usize, window_step: usize) -> usize {
    if window_size == 0 || window_step == 0 {
        return 0;
    }
    traces
        .iter()
        .map(|t| {
            let len = t.as_ref().len();
            if len < window_size {
                0
            } else {
                1 + (len - window_size) / window_step
            }
        })
        .sum()
}

/// `(offset, difference count)` for every full window of one trace
pub fn window_differences(trace: &[u8], window_size: usize, window_step: usize) -> Vec<(usize, usize)> {
    if window_size == 0 || window_step == 0 || trace.len() < window_size {
        return Vec::new();
    }

    // prefix[i] = differences in trace[..i]
    let mut prefix = Vec::with_capacity(trace.len() + 1);
    prefix.push(0usize);
    let mut running = 0;
    for &op in trace {
        if op != MATCH {
            running += 1;
        }
        prefix.push(running);
    }

    (0..=trace.len() - window_size)
        .step_by(window_step)
        .map(|start| (start, prefix[start + window_size] - prefix[start]))
        .collect()
}

/// Difference counts of every window, in trace order then offset order,
/// along with the largest count seen (0 when there are no windows).
pub fn sample<T: AsRef<[u8]>>(traces: &[T], window_size: usize, window_step: usize) -> (Vec<usize>, usize) {
    let mut samples = Vec::with_capacity(window_count(traces, window_size, window_step));
    let mut max_sample = 0;
    for trace in traces {
        for (_, count) in window_differences(trace.as_ref(), window_size, window_step) {
            max_sample = max_sample.max(count);
            samples.push(count);
        }
    }
    (samples, max_sample)
}
