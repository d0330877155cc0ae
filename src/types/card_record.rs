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

use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SchedulerError;
use crate::fsrs::Difficulty;
use crate::fsrs::MAX_DIFFICULTY;
use crate::fsrs::MIN_DIFFICULTY;
use crate::fsrs::MemoryState;
use crate::fsrs::R;
use crate::fsrs::Stability;
use crate::fsrs::T;
use crate::fsrs::retrievability;
use crate::types::card_hash::CardHash;
use crate::types::state::State;
use crate::types::timestamp::Timestamp;

/// Everything the scheduler knows about a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub state: State,
    /// When the card becomes eligible for review.
    pub due: Timestamp,
    /// Absent while the card is new.
    pub stability: Option<Stability>,
    /// Absent while the card is new.
    pub difficulty: Option<Difficulty>,
    /// Days between the previous review and the latest one.
    pub elapsed_days: T,
    /// The interval scheduled at the latest review, in days. Minute-level
    /// learning steps are stored as fractions of a day.
    pub scheduled_days: T,
    /// Index into the learning or relearning step table.
    pub learning_steps: u32,
    /// Successful reviews while in the review state.
    pub reps: u32,
    /// Times the card was forgotten while in the review state.
    pub lapses: u32,
    pub last_review: Option<Timestamp>,
}

impl SchedulingState {
    /// The state of a card that has never been reviewed.
    pub fn new(now: Timestamp) -> Self {
        Self {
            state: State::New,
            due: now,
            stability: None,
            difficulty: None,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            learning_steps: 0,
            reps: 0,
            lapses: 0,
            last_review: None,
        }
    }

    /// Check that the fields are consistent with the state.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let invalid = |msg: String| -> Result<(), SchedulerError> {
            Err(SchedulerError::InvalidCardRecord(msg))
        };
        if !(self.elapsed_days.is_finite() && self.elapsed_days >= 0.0) {
            return invalid(format!("elapsed_days is {}", self.elapsed_days));
        }
        if !(self.scheduled_days.is_finite() && self.scheduled_days >= 0.0) {
            return invalid(format!("scheduled_days is {}", self.scheduled_days));
        }
        match self.state {
            State::New => {
                if self.stability.is_some() || self.difficulty.is_some() {
                    return invalid("new card has a memory state".to_string());
                }
                if self.last_review.is_some() {
                    return invalid("new card has a last review".to_string());
                }
                if self.reps != 0 || self.lapses != 0 || self.learning_steps != 0 {
                    return invalid("new card has review counters".to_string());
                }
            }
            State::Learning | State::Review | State::Relearning => {
                match self.stability {
                    Some(s) if s.is_finite() && s > 0.0 => {}
                    Some(s) => return invalid(format!("stability is {s}")),
                    None => return invalid(format!("{} card has no stability", self.state)),
                }
                match self.difficulty {
                    Some(d) if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) => {}
                    Some(d) => return invalid(format!("difficulty is {d}")),
                    None => return invalid(format!("{} card has no difficulty", self.state)),
                }
                match self.last_review {
                    Some(last_review) if self.due < last_review => {
                        return invalid("card is due before its last review".to_string());
                    }
                    Some(_) => {}
                    None => return invalid(format!("{} card has no last review", self.state)),
                }
            }
        }
        Ok(())
    }

    /// The memory state, or `None` for a new card.
    pub fn memory_state(&self) -> Result<Option<MemoryState>, SchedulerError> {
        match (self.state, self.stability, self.difficulty) {
            (State::New, _, _) => Ok(None),
            (_, Some(stability), Some(difficulty)) => Ok(Some(MemoryState {
                stability,
                difficulty,
            })),
            (state, _, _) => Err(SchedulerError::InvalidState(format!(
                "{state} card without stability or difficulty"
            ))),
        }
    }

    /// Days since the last review, clamped to zero when the clock reads
    /// earlier than the last review.
    pub fn elapsed_days_at(&self, now: Timestamp) -> T {
        match self.last_review {
            Some(last_review) => now.days_since(last_review).max(0.0),
            None => 0.0,
        }
    }
}

/// A card's identifier together with its scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardHash,
    pub scheduling: SchedulingState,
}

impl CardRecord {
    /// An empty card, due immediately.
    pub fn new(id: CardHash, now: Timestamp) -> Self {
        Self {
            id,
            scheduling: SchedulingState::new(now),
        }
    }

    pub fn state(&self) -> State {
        self.scheduling.state
    }

    pub fn due(&self) -> Timestamp {
        self.scheduling.due
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.scheduling.due <= now
    }

    /// Signed time until the card is due. Negative when overdue.
    pub fn time_until_due(&self, now: Timestamp) -> Duration {
        self.scheduling.due.since(now)
    }

    /// The current probability of recall, or `None` for a new card.
    pub fn retrievability_at(&self, now: Timestamp) -> Option<R> {
        let stability = self.scheduling.stability?;
        Some(retrievability(self.scheduling.elapsed_days_at(now), stability))
    }

    /// A human-readable description of when the card is due.
    pub fn format_due(&self, now: Timestamp) -> String {
        let until = self.time_until_due(now);
        if until < Duration::zero() {
            let overdue_days = (-until).num_days();
            if overdue_days > 0 {
                return format!("{} overdue", plural(overdue_days, "day"));
            }
            return "Due now".to_string();
        }
        let days = until.num_days();
        let hours = until.num_hours() % 24;
        let minutes = until.num_minutes() % 60;
        if days > 0 {
            format!("Due in {}", plural(days, "day"))
        } else if hours > 0 {
            format!("Due in {}", plural(hours, "hour"))
        } else if minutes > 0 {
            format!("Due in {}", plural(minutes, "minute"))
        } else {
            "Due soon".to_string()
        }
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
