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

//! The FSRS memory model: pure functions over stability, difficulty and
//! retrievability.
//!
//! - Retrievability: R = (1 + FACTOR * t / S)^DECAY
//! - Interval: t = S / FACTOR * (R^(1/DECAY) - 1)

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// Recall probability, in (0, 1].
pub type R = f64;
/// Memory stability, in days.
pub type Stability = f64;
/// Item difficulty, in [1, 10].
pub type Difficulty = f64;
/// Time, in days.
pub type T = f64;

pub const WEIGHT_COUNT: usize = 19;

pub type Weights = [f64; WEIGHT_COUNT];

/// Default FSRS-5 weights.
pub const DEFAULT_WEIGHTS: Weights = [
    0.40255, 1.18385, 3.173, 15.69105, // w0-w3: initial stability per grade
    7.1949, 0.5345, // w4-w5: initial difficulty
    1.4604, 0.0046, // w6-w7: difficulty update and mean reversion
    1.54575, 0.1192, 1.01925, // w8-w10: recall stability
    1.9395, 0.11, 0.29605, 2.2698, // w11-w14: forget stability
    0.2315, 2.9898, // w15-w16: hard penalty, easy bonus
    0.51655, 0.6621, // w17-w18: short-term stability
];

/// The range each weight may take. Outside these the formulas overflow or
/// invert the ordering of the grades.
pub const WEIGHT_BOUNDS: [(f64, f64); WEIGHT_COUNT] = [
    (MIN_STABILITY, 100.0),
    (MIN_STABILITY, 100.0),
    (MIN_STABILITY, 100.0),
    (MIN_STABILITY, 100.0),
    (1.0, 10.0),
    (0.001, 4.0),
    (0.001, 4.0),
    (0.001, 0.75),
    (0.0, 4.5),
    (0.0, 0.8),
    (0.001, 3.5),
    (0.001, 5.0),
    (0.001, 0.25),
    (0.001, 0.9),
    (0.0, 4.0),
    (0.0, 1.0),
    (1.0, 6.0),
    (0.0, 2.0),
    (0.0, 2.0),
];

pub const DECAY: f64 = -0.5;
pub const FACTOR: f64 = 19.0 / 81.0;

pub const MIN_STABILITY: Stability = 0.01;
pub const MAX_STABILITY: Stability = 36500.0;
pub const MIN_DIFFICULTY: Difficulty = 1.0;
pub const MAX_DIFFICULTY: Difficulty = 10.0;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    /// The numeric rating, 1 through 4.
    pub fn value(self) -> f64 {
        match self {
            Grade::Again => 1.0,
            Grade::Hard => 2.0,
            Grade::Good => 3.0,
            Grade::Easy => 4.0,
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Grade {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "again" | "1" => Ok(Grade::Again),
            "hard" | "2" => Ok(Grade::Hard),
            "good" | "3" => Ok(Grade::Good),
            "easy" | "4" => Ok(Grade::Easy),
            _ => fail(format!("Invalid grade: {value}")),
        }
    }
}

impl ToSql for Grade {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Grade {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Grade::try_from(string.as_str()).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The pair of quantities the model tracks for a reviewed card.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MemoryState {
    pub stability: Stability,
    pub difficulty: Difficulty,
}

/// Probability of recall after `t` days for a memory of stability `s`.
pub fn retrievability(t: T, s: Stability) -> R {
    (1.0 + FACTOR * t.max(0.0) / s).powf(DECAY)
}

/// The raw interval, in days, after which retrievability decays to `r`.
pub fn interval(r: R, s: Stability) -> T {
    (s / FACTOR) * (r.powf(1.0 / DECAY) - 1.0)
}

/// The interval for stability `s` at retention `r`, rounded to whole days
/// and clamped to `[1, maximum_interval]`.
pub fn interval_from_stability(s: Stability, r: R, maximum_interval: u32) -> u32 {
    let maximum = maximum_interval.max(1) as f64;
    interval(r, s).round().clamp(1.0, maximum) as u32
}

pub fn initial_stability(w: &Weights, g: Grade) -> Stability {
    let s = match g {
        Grade::Again => w[0],
        Grade::Hard => w[1],
        Grade::Good => w[2],
        Grade::Easy => w[3],
    };
    s.max(MIN_STABILITY)
}

pub fn initial_difficulty(w: &Weights, g: Grade) -> Difficulty {
    let d = w[4] - (w[5] * (g.value() - 1.0)).exp() + 1.0;
    clamp_difficulty(d)
}

pub fn new_difficulty(w: &Weights, d: Difficulty, g: Grade) -> Difficulty {
    let delta = -w[6] * (g.value() - 3.0);
    // Linear damping: the closer to the ceiling, the smaller the step.
    let d_prime = d + delta * (MAX_DIFFICULTY - d) / 9.0;
    let target = initial_difficulty(w, Grade::Easy);
    clamp_difficulty(w[7] * target + (1.0 - w[7]) * d_prime)
}

/// Stability after a successful recall (Hard, Good or Easy).
pub fn recall_stability(w: &Weights, d: Difficulty, s: Stability, r: R, g: Grade) -> Stability {
    let hard_penalty = if g == Grade::Hard { w[15] } else { 1.0 };
    let easy_bonus = if g == Grade::Easy { w[16] } else { 1.0 };
    let growth = w[8].exp()
        * (11.0 - d)
        * s.powf(-w[9])
        * (((1.0 - r) * w[10]).exp() - 1.0)
        * hard_penalty
        * easy_bonus;
    clamp_stability(s * (1.0 + growth))
}

/// Stability after a lapse. Strictly below `s` whenever `s` is above the
/// floor.
pub fn forget_stability(w: &Weights, d: Difficulty, s: Stability, r: R) -> Stability {
    let long_term =
        w[11] * d.powf(-w[12]) * ((s + 1.0).powf(w[13]) - 1.0) * ((1.0 - r) * w[14]).exp();
    let ceiling = s / (w[17] * w[18]).exp();
    clamp_stability(long_term.min(ceiling))
}

/// Stability after a same-day review.
pub fn short_term_stability(w: &Weights, s: Stability, g: Grade) -> Stability {
    let mut increase = (w[17] * (g.value() - 3.0 + w[18])).exp();
    if g >= Grade::Good {
        increase = increase.max(1.0);
    }
    clamp_stability(s * increase)
}

pub fn new_stability(w: &Weights, d: Difficulty, s: Stability, r: R, g: Grade) -> Stability {
    match g {
        Grade::Again => forget_stability(w, d, s, r),
        _ => recall_stability(w, d, s, r, g),
    }
}

/// Advance a memory state by one review along the forgetting curve.
///
/// A card without a memory state is initialized from the grade-indexed
/// weights.
pub fn next_memory_state(
    w: &Weights,
    current: Option<MemoryState>,
    g: Grade,
    elapsed_days: T,
) -> MemoryState {
    match current {
        None => MemoryState {
            stability: initial_stability(w, g),
            difficulty: initial_difficulty(w, g),
        },
        Some(MemoryState {
            stability,
            difficulty,
        }) => {
            let r = retrievability(elapsed_days, stability);
            MemoryState {
                stability: new_stability(w, difficulty, stability, r, g),
                difficulty: new_difficulty(w, difficulty, g),
            }
        }
    }
}

/// Advance a memory state by a review on the same day as the previous one.
///
/// The long-term model ignores same-day repetitions, so stability is kept
/// unless `short_term` is set.
pub fn same_day_memory_state(
    w: &Weights,
    current: MemoryState,
    g: Grade,
    short_term: bool,
) -> MemoryState {
    let stability = if short_term {
        short_term_stability(w, current.stability, g)
    } else {
        current.stability
    };
    MemoryState {
        stability,
        difficulty: new_difficulty(w, current.difficulty, g),
    }
}

fn clamp_stability(s: Stability) -> Stability {
    s.clamp(MIN_STABILITY, MAX_STABILITY)
}

fn clamp_difficulty(d: Difficulty) -> Difficulty {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: Weights = DEFAULT_WEIGHTS;

    fn assert_approx(a: f64, b: f64) {
        assert!((a - b).abs() < 0.01, "{a} != {b}");
    }

    #[test]
    fn test_retrievability_is_one_at_zero() {
        assert_eq!(retrievability(0.0, 5.0), 1.0);
        assert_eq!(retrievability(0.0, MIN_STABILITY), 1.0);
    }

    #[test]
    fn test_retrievability_range() {
        for s in [MIN_STABILITY, 0.5, 1.0, 10.0, 365.0, MAX_STABILITY] {
            for t in [0.001, 1.0, 30.0, 1000.0, 100_000.0] {
                let r = retrievability(t, s);
                assert!(r > 0.0 && r < 1.0, "r={r} for t={t}, s={s}");
            }
        }
    }

    #[test]
    fn test_retrievability_at_stability_is_target() {
        // Stability is the number of days after which R drops to 90%.
        assert_approx(retrievability(10.0, 10.0), 0.9);
    }

    #[test]
    fn test_interval_inverts_retrievability() {
        let s = 7.0;
        let t = interval(0.8, s);
        assert_approx(retrievability(t, s), 0.8);
        assert_approx(interval(0.9, s), s);
    }

    #[test]
    fn test_interval_from_stability_bounds() {
        for s in [MIN_STABILITY, 0.3, 2.0, 50.0, 5000.0, MAX_STABILITY] {
            for max in [1, 7, 365, 36500] {
                let i = interval_from_stability(s, 0.9, max);
                assert!(i >= 1 && i <= max, "i={i} for s={s}, max={max}");
            }
        }
    }

    #[test]
    fn test_initial_stability_is_lookup() {
        assert_eq!(initial_stability(&W, Grade::Again), W[0]);
        assert_eq!(initial_stability(&W, Grade::Hard), W[1]);
        assert_eq!(initial_stability(&W, Grade::Good), W[2]);
        assert_eq!(initial_stability(&W, Grade::Easy), W[3]);
    }

    #[test]
    fn test_initial_difficulty_ordering() {
        let again = initial_difficulty(&W, Grade::Again);
        let hard = initial_difficulty(&W, Grade::Hard);
        let good = initial_difficulty(&W, Grade::Good);
        let easy = initial_difficulty(&W, Grade::Easy);
        assert!(again > hard && hard > good && good > easy);
        assert!(easy >= MIN_DIFFICULTY && again <= MAX_DIFFICULTY);
    }

    #[test]
    fn test_new_difficulty_clamped() {
        let mut d = 5.0;
        for _ in 0..100 {
            d = new_difficulty(&W, d, Grade::Again);
        }
        assert!(d <= MAX_DIFFICULTY);
        for _ in 0..100 {
            d = new_difficulty(&W, d, Grade::Easy);
        }
        assert!(d >= MIN_DIFFICULTY);
    }

    #[test]
    fn test_again_makes_difficulty_harder() {
        let d = 5.0;
        assert!(new_difficulty(&W, d, Grade::Again) > d);
        assert!(new_difficulty(&W, d, Grade::Easy) < d);
    }

    #[test]
    fn test_recall_stability_ordering() {
        let (d, s) = (5.0, 10.0);
        let r = retrievability(10.0, s);
        let hard = recall_stability(&W, d, s, r, Grade::Hard);
        let good = recall_stability(&W, d, s, r, Grade::Good);
        let easy = recall_stability(&W, d, s, r, Grade::Easy);
        assert!(s < hard && hard < good && good < easy);
    }

    #[test]
    fn test_forget_stability_decreases() {
        for s in [0.02, 0.5, 3.0, 10.0, 100.0, 10_000.0] {
            for t in [0.0, 1.0, 10.0, 100.0] {
                let r = retrievability(t, s);
                let next = forget_stability(&W, 5.0, s, r);
                assert!(next < s, "next={next} for s={s}");
                assert!(next >= MIN_STABILITY);
            }
        }
    }

    #[test]
    fn test_forget_stability_at_floor() {
        let next = forget_stability(&W, 5.0, MIN_STABILITY, 1.0);
        assert_eq!(next, MIN_STABILITY);
    }

    #[test]
    fn test_short_term_stability() {
        let s = 3.0;
        assert!(short_term_stability(&W, s, Grade::Again) < s);
        assert!(short_term_stability(&W, s, Grade::Good) >= s);
        assert!(short_term_stability(&W, s, Grade::Easy) > s);
    }

    #[test]
    fn test_next_memory_state_initializes() {
        let state = next_memory_state(&W, None, Grade::Good, 0.0);
        assert_eq!(state.stability, W[2]);
        assert_eq!(state.difficulty, initial_difficulty(&W, Grade::Good));
    }

    #[test]
    fn test_recall_at_zero_elapsed_keeps_stability() {
        let current = MemoryState {
            stability: 4.0,
            difficulty: 5.0,
        };
        let next = next_memory_state(&W, Some(current), Grade::Good, 0.0);
        assert_eq!(next.stability, 4.0);
        assert!(next_memory_state(&W, Some(current), Grade::Again, 0.0).stability < 4.0);
    }

    #[test]
    fn test_same_day_memory_state() {
        let current = MemoryState {
            stability: W[2],
            difficulty: 5.0,
        };
        let ignored = same_day_memory_state(&W, current, Grade::Good, false);
        assert_eq!(ignored.stability, W[2]);
        assert_eq!(ignored.difficulty, new_difficulty(&W, 5.0, Grade::Good));
        let short_term = same_day_memory_state(&W, current, Grade::Good, true);
        assert!(short_term.stability > W[2]);
    }

    #[test]
    fn test_grade_parse() {
        assert_eq!(Grade::try_from("good").ok(), Some(Grade::Good));
        assert_eq!(Grade::try_from("AGAIN").ok(), Some(Grade::Again));
        assert_eq!(Grade::try_from("4").ok(), Some(Grade::Easy));
        assert!(Grade::try_from("5").is_err());
    }

    #[test]
    fn test_grade_ordering() {
        assert!(Grade::Again < Grade::Hard);
        assert!(Grade::Hard < Grade::Good);
        assert!(Grade::Good < Grade::Easy);
    }
}
