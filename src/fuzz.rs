// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interval fuzzing, so that cards learned together do not stay due together.

use crate::fsrs::T;
use crate::types::card_hash::CardHash;
use crate::types::timestamp::Timestamp;

/// Intervals shorter than this are never fuzzed.
pub const MIN_FUZZ_INTERVAL: T = 2.5;

struct FuzzRange {
    start: T,
    end: T,
    factor: f64,
}

const FUZZ_RANGES: [FuzzRange; 3] = [
    FuzzRange {
        start: 2.5,
        end: 7.0,
        factor: 0.15,
    },
    FuzzRange {
        start: 7.0,
        end: 20.0,
        factor: 0.1,
    },
    FuzzRange {
        start: 20.0,
        end: f64::INFINITY,
        factor: 0.05,
    },
];

/// The inclusive range of whole-day intervals a fuzzed interval may take.
pub fn fuzz_bounds(interval: T, elapsed_days: T, maximum_interval: u32, scale: f64) -> (u32, u32) {
    let maximum = maximum_interval.max(1) as f64;
    // The spread follows the interval actually scheduled, not the raw one.
    let interval = interval.min(maximum);
    let mut delta = 1.0;
    for range in FUZZ_RANGES.iter() {
        delta += range.factor * (interval.min(range.end) - range.start).max(0.0);
    }
    let delta = delta * scale;
    let mut lo = (interval - delta).round().max(2.0);
    let hi = (interval + delta).round().min(maximum);
    if interval > elapsed_days {
        lo = lo.max(elapsed_days.floor() + 1.0);
    }
    let lo = lo.min(hi);
    (lo as u32, hi as u32)
}

/// Round and clamp `interval` to `[1, maximum_interval]`, spreading it over
/// the fuzz range when `enabled`. `factor` picks the point in the range and
/// must lie in [0, 1).
pub fn apply_fuzz(
    interval: T,
    elapsed_days: T,
    maximum_interval: u32,
    scale: f64,
    enabled: bool,
    factor: f64,
) -> u32 {
    let maximum = maximum_interval.max(1) as f64;
    if !enabled || interval < MIN_FUZZ_INTERVAL {
        return interval.round().clamp(1.0, maximum) as u32;
    }
    let (lo, hi) = fuzz_bounds(interval, elapsed_days, maximum_interval, scale);
    let span = (hi - lo + 1) as f64;
    let fuzzed = (factor * span + lo as f64).floor() as u32;
    fuzzed.clamp(lo.max(1), hi.max(1))
}

/// A deterministic fraction in [0, 1) for one review of one card.
pub fn fuzz_factor(card_id: CardHash, reviewed_at: Timestamp, reps: u32) -> f64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(card_id.as_bytes());
    hasher.update(reviewed_at.to_string().as_bytes());
    hasher.update(&reps.to_le_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    // Keep 53 bits, the precision of an f64 mantissa.
    (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
}
