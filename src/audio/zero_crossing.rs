//! Zero-crossing search used to place splice points where the signal is
//! (nearly) silent, so concatenated clips do not click.
//!
//! A sample is *on a crossing* when its amplitude is within [`ZERO_EPSILON`]
//! of zero or when either neighbour has the opposite sign. Every such sample
//! is a fixed point of the search: starting there returns it unchanged.

use std::ops::RangeInclusive;

use serde::Serialize;

/// Amplitudes at or below this magnitude count as zero.
pub const ZERO_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchDirection {
    /// Towards higher sample indices.
    Forward,
    /// Towards lower sample indices.
    Backward,
    /// Both ways, alternating backward then forward at each distance.
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Crossing,
    NearestToZero,
    /// A directional search ran into the edge of its bounds without finding a
    /// crossing or a quieter sample; the edge index is returned.
    BoundaryReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroCrossing {
    pub index: usize,
    pub kind: SnapKind,
}

impl ZeroCrossing {
    pub fn is_crossing(&self) -> bool {
        self.kind == SnapKind::Crossing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroCrossingLocator {
    max_search_samples: usize,
}

impl ZeroCrossingLocator {
    pub fn new(max_search_samples: usize) -> Self {
        Self { max_search_samples }
    }

    pub fn max_search_samples(&self) -> usize {
        self.max_search_samples
    }

    /// Searches the whole buffer.
    pub fn locate(&self, samples: &[f32], center: usize, direction: SearchDirection) -> ZeroCrossing {
        self.locate_within(samples, center, direction, 0..=usize::MAX)
    }

    /// Repeats [`Self::step`] until the index stops moving. The result is a
    /// fixed point, so re-running the search on it returns the same index.
    pub fn locate_within(
        &self,
        samples: &[f32],
        center: usize,
        direction: SearchDirection,
        bounds: RangeInclusive<usize>,
    ) -> ZeroCrossing {
        let mut current = self.step(samples, center, direction, bounds.clone());
        loop {
            let next = self.step(samples, current.index, direction, bounds.clone());
            if next.index == current.index {
                return next;
            }
            current = next;
        }
    }

    /// One bounded scan of at most `max_search_samples` from `center`.
    pub fn step(
        &self,
        samples: &[f32],
        center: usize,
        direction: SearchDirection,
        bounds: RangeInclusive<usize>,
    ) -> ZeroCrossing {
        if samples.is_empty() {
            return ZeroCrossing {
                index: 0,
                kind: SnapKind::BoundaryReached,
            };
        }
        let last = samples.len() - 1;
        let lo = (*bounds.start()).min(last);
        let hi = (*bounds.end()).min(last).max(lo);
        let c = center.clamp(lo, hi);

        if is_on_crossing(samples, c) {
            return ZeroCrossing {
                index: c,
                kind: SnapKind::Crossing,
            };
        }

        let mut best = c;
        let mut best_amp = samples[c].abs();
        let radius = self.max_search_samples;

        let (edge, edge_reached) = match direction {
            SearchDirection::Forward => (hi, hi - c <= radius),
            SearchDirection::Backward => (lo, c - lo <= radius),
            SearchDirection::Nearest => (c, false),
        };

        for distance in 1..=radius {
            let backward = (c >= lo + distance).then(|| c - distance);
            let forward = (c + distance <= hi).then(|| c + distance);
            let steps = match direction {
                SearchDirection::Forward => [forward, None],
                SearchDirection::Backward => [backward, None],
                SearchDirection::Nearest => [backward, forward],
            };
            if steps.iter().all(Option::is_none) {
                break;
            }
            for i in steps.into_iter().flatten() {
                if is_on_crossing(samples, i) {
                    return ZeroCrossing {
                        index: quieter_side_of_crossing(samples, c, i, lo, hi),
                        kind: SnapKind::Crossing,
                    };
                }
                let amp = samples[i].abs();
                if amp < best_amp {
                    best = i;
                    best_amp = amp;
                }
            }
        }

        if best == c && edge_reached && edge != c {
            return ZeroCrossing {
                index: edge,
                kind: SnapKind::BoundaryReached,
            };
        }
        if best == c && edge_reached {
            return ZeroCrossing {
                index: c,
                kind: SnapKind::BoundaryReached,
            };
        }
        ZeroCrossing {
            index: best,
            kind: SnapKind::NearestToZero,
        }
    }
}

pub fn is_on_crossing(samples: &[f32], i: usize) -> bool {
    let Some(&x) = samples.get(i) else {
        return false;
    };
    if x.abs() <= ZERO_EPSILON {
        return true;
    }
    let positive = x > 0.0;
    let prev_differs = i > 0 && (samples[i - 1] > 0.0) != positive;
    let next_differs = samples.get(i + 1).is_some_and(|&n| (n > 0.0) != positive);
    prev_differs || next_differs
}

/// `i` is the first crossing sample met while scanning away from `c`; its
/// partner on the far side of the sign change may sit closer to zero.
fn quieter_side_of_crossing(samples: &[f32], c: usize, i: usize, lo: usize, hi: usize) -> usize {
    let partner = if i > c {
        (i < hi).then(|| i + 1)
    } else {
        (i > lo).then(|| i - 1)
    };
    match partner {
        Some(p)
            if (samples[p] > 0.0) != (samples[i] > 0.0)
                && samples[p].abs() < samples[i].abs() =>
        {
            p
        }
        _ => i,
    }
}
