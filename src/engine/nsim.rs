//! Distance half of the bundled kernel: time alignment followed by a
//! neurogram-similarity (NSIM) score over the aligned frames.

use serde::{Deserialize, Serialize};

use super::spectrogram::Spectrogram;
use crate::error::{try_zeroed, Error, Result};

/// Stabilising constants of the NSIM terms, on the dB scale of the analysis.
const INTENSITY_C1: f64 = 0.64;
const STRUCTURE_C2: f64 = 5.76;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NsimConfig {
    /// Alignment slack, in frames, either side of the proportional diagonal.
    pub warp_window: usize,
    pub time_window: usize,
    pub channel_window: usize,
}

impl Default for NsimConfig {
    fn default() -> Self {
        Self {
            warp_window: 50,
            time_window: 8,
            channel_window: 8,
        }
    }
}

/// Upper bound on DTW cells, checked before the cost matrix is allocated.
pub const MAX_ALIGNMENT_CELLS: usize = 1 << 26;

// Columns of `b` open to each row of `a`: `warp_window` frames either side of
// the line from the first frame pair to the last. Consecutive rows touch, so a
// path always exists.
struct Band {
    n: usize,
    m: usize,
    warp_window: usize,
}

impl Band {
    fn lo(&self, i: usize) -> usize {
        if self.n == 1 {
            return 0;
        }
        (i * (self.m - 1) / (self.n - 1)).saturating_sub(self.warp_window)
    }

    fn hi(&self, i: usize) -> usize {
        if self.n == 1 {
            return self.m - 1;
        }
        let (num, den) = (self.m - 1, self.n - 1);
        let centre = (i * num)
            .div_ceil(den)
            .max(((i + 1) * num).div_ceil(den).saturating_sub(1));
        centre.saturating_add(self.warp_window).min(self.m - 1)
    }

    fn value(&self, rows: &[Vec<f64>], i: usize, j: usize) -> f64 {
        if j < self.lo(i) || j > self.hi(i) {
            f64::INFINITY
        } else {
            rows[i][j - self.lo(i)]
        }
    }

    fn cells(&self) -> Option<usize> {
        (0..self.n).try_fold(0usize, |acc, i| acc.checked_add(self.hi(i) - self.lo(i) + 1))
    }
}

/// Frame index pairs `(a, b)` of a monotone alignment from the first frames
/// to the last ones.
pub fn align(a: &Spectrogram, b: &Spectrogram, warp_window: usize) -> Result<Vec<(usize, usize)>> {
    let n = a.num_frames();
    let m = b.num_frames();
    if n == 0 || m == 0 {
        return Ok(Vec::new());
    }
    let band = Band { n, m, warp_window };
    match band.cells() {
        Some(cells) if cells <= MAX_ALIGNMENT_CELLS => {}
        _ => {
            return Err(Error::AllocationFailure(format!(
                "aligning {n} x {m} frames with warp window {warp_window} exceeds {MAX_ALIGNMENT_CELLS} cells"
            )))
        }
    }

    // Cumulative costs, one row per frame of `a`.
    let mut rows: Vec<Vec<f64>> = Vec::new();
    rows.try_reserve_exact(n)?;
    for i in 0..n {
        let (lo, hi) = (band.lo(i), band.hi(i));
        let mut row = try_zeroed::<f64>(hi - lo + 1)?;
        for j in lo..=hi {
            let cost = frame_distance(a.frame(i), b.frame(j));
            let best = if i == 0 && j == 0 {
                0.0
            } else {
                let diag = if i > 0 && j > 0 { band.value(&rows, i - 1, j - 1) } else { f64::INFINITY };
                let up = if i > 0 { band.value(&rows, i - 1, j) } else { f64::INFINITY };
                let left = if j > lo { row[j - 1 - lo] } else { f64::INFINITY };
                diag.min(up).min(left)
            };
            row[j - lo] = cost + best;
        }
        rows.push(row);
    }

    let mut path = Vec::new();
    path.try_reserve(n + m)?;
    let (mut i, mut j) = (n - 1, m - 1);
    path.push((i, j));
    while i > 0 || j > 0 {
        // Ties prefer the diagonal, then the step in `a`.
        let diag = if i > 0 && j > 0 { band.value(&rows, i - 1, j - 1) } else { f64::INFINITY };
        let up = if i > 0 { band.value(&rows, i - 1, j) } else { f64::INFINITY };
        let left = if j > 0 { band.value(&rows, i, j - 1) } else { f64::INFINITY };
        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
        path.push((i, j));
    }
    path.reverse();
    Ok(path)
}

fn frame_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Mean NSIM over all windows of the aligned frame pairs, in [-1, 1].
pub fn mean_nsim(
    a: &Spectrogram,
    b: &Spectrogram,
    path: &[(usize, usize)],
    config: &NsimConfig,
) -> Result<f64> {
    let num_channels = a.num_channels();
    if a.num_channels() != b.num_channels() {
        return Err(Error::ChannelCountMismatch {
            left: a.num_channels(),
            right: b.num_channels(),
        });
    }
    if path.is_empty() {
        return Ok(1.0);
    }

    let time_window = config.time_window.max(1);
    let channel_window = config.channel_window.max(1);
    let mut total = 0.0f64;
    let mut windows = 0usize;

    for t in 0..path.len() {
        let t_end = (t + time_window).min(path.len());
        for c in 0..num_channels {
            let c_end = (c + channel_window).min(num_channels);
            let count = ((t_end - t) * (c_end - c)) as f64;

            let (mut sum_a, mut sum_b) = (0.0f64, 0.0f64);
            for &(ia, ib) in &path[t..t_end] {
                let (fa, fb) = (a.frame(ia), b.frame(ib));
                for ch in c..c_end {
                    sum_a += fa[ch] as f64;
                    sum_b += fb[ch] as f64;
                }
            }
            let mean_a = sum_a / count;
            let mean_b = sum_b / count;

            let (mut var_a, mut var_b, mut cov) = (0.0f64, 0.0f64, 0.0f64);
            for &(ia, ib) in &path[t..t_end] {
                let (fa, fb) = (a.frame(ia), b.frame(ib));
                for ch in c..c_end {
                    let da = fa[ch] as f64 - mean_a;
                    let db = fb[ch] as f64 - mean_b;
                    var_a += da * da;
                    var_b += db * db;
                    cov += da * db;
                }
            }
            var_a /= count;
            var_b /= count;
            cov /= count;

            let intensity = (2.0 * mean_a * mean_b + INTENSITY_C1)
                / (mean_a * mean_a + mean_b * mean_b + INTENSITY_C1);
            let structure = (cov + STRUCTURE_C2) / ((var_a * var_b).sqrt() + STRUCTURE_C2);
            total += intensity * structure;
            windows += 1;
        }
    }

    Ok(total / windows as f64)
}
