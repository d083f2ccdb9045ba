// ============================================================
// Layer 4 — Inference Windowing
// ============================================================
// The network only accepts fixed-length inputs, so a full trace
// is cut into consecutive windows of num_timesteps:
//
//   trace:   |---------------------------|
//   windows: |-----|-----|-----|-----|
//                                 |-----|   ← last one right-aligned
//
// The last window is shifted back so it ends exactly at the end
// of the trace instead of being padded. Only a trace shorter
// than one window gets padded, by repeating its final value.
//
// `stitch` reverses the cut: each window contributes the steps
// not already covered by the windows before it.

/// One window and the offset of its first step in the trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub start:  usize,
    pub values: Vec<f32>,
}

pub fn split_windows(trace: &[f32], num_timesteps: usize) -> Vec<Window> {
    assert!(num_timesteps > 0, "window length must be positive");

    if trace.is_empty() {
        return Vec::new();
    }

    if trace.len() < num_timesteps {
        let mut values = trace.to_vec();
        let last = trace[trace.len() - 1];
        values.resize(num_timesteps, last);
        return vec![Window { start: 0, values }];
    }

    let mut windows = Vec::new();
    let mut start = 0;
    while start + num_timesteps <= trace.len() {
        windows.push(Window { start, values: trace[start..start + num_timesteps].to_vec() });
        start += num_timesteps;
    }
    if start < trace.len() {
        let start = trace.len() - num_timesteps;
        windows.push(Window { start, values: trace[start..].to_vec() });
    }
    windows
}

/// Reassemble per-window outputs into one sequence of `trace_len` steps.
pub fn stitch<T: Copy>(windows: &[Window], outputs: &[Vec<T>], trace_len: usize) -> Vec<T> {
    let mut stitched = Vec::with_capacity(trace_len);
    for (window, out) in windows.iter().zip(outputs) {
        // Skip what an earlier window already produced
        let skip = stitched.len().saturating_sub(window.start);
        for &v in out.iter().skip(skip) {
            if stitched.len() == trace_len {
                break;
            }
            stitched.push(v);
        }
    }
    stitched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    #[test]
    fn test_exact_multiple() {
        let w = split_windows(&trace(6), 3);
        assert_eq!(w.len(), 2);
        assert_eq!(w[1].start, 3);
        assert_eq!(w[1].values, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_last_window_is_right_aligned() {
        let w = split_windows(&trace(7), 3);
        assert_eq!(w.len(), 3);
        assert_eq!(w[2].start, 4);
        assert_eq!(w[2].values, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_short_trace_is_edge_padded() {
        let w = split_windows(&[1.0, 2.0], 4);
        assert_eq!(w, vec![Window { start: 0, values: vec![1.0, 2.0, 2.0, 2.0] }]);
    }

    #[test]
    fn test_empty_trace_gives_no_windows() {
        assert!(split_windows(&[], 4).is_empty());
    }

    #[test]
    fn test_stitch_recovers_trace() {
        for len in [1, 2, 5, 7, 9, 10] {
            let t = trace(len);
            let windows = split_windows(&t, 3);
            let outputs: Vec<Vec<f32>> = windows.iter().map(|w| w.values.clone()).collect();
            assert_eq!(stitch(&windows, &outputs, len), t, "len={len}");
        }
    }
}
