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

//! The card-state machine.
//!
//! New, Learning and Relearning cards walk a table of minute-level steps.
//! Review cards are scheduled in whole days by the memory model. Every call
//! is a pure function of the card, the grade and the review instant: the
//! scheduler holds no card state between calls.

use std::collections::BTreeMap;

use crate::error::SchedulerError;
use crate::fsrs;
use crate::fsrs::Grade;
use crate::fsrs::MemoryState;
use crate::fsrs::Stability;
use crate::fsrs::T;
use crate::fuzz::apply_fuzz;
use crate::fuzz::fuzz_factor;
use crate::params::Parameters;
use crate::types::card_record::CardRecord;
use crate::types::card_record::SchedulingState;
use crate::types::review_log::ReviewLog;
use crate::types::state::State;
use crate::types::timestamp::Timestamp;

const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    params: Parameters,
}

/// What happens to a card if it is given a particular grade.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub card: CardRecord,
    pub log: ReviewLog,
    /// Time from the review to the new due date, in days.
    pub interval_days: T,
}

/// The outcomes of all four grades from the same starting point.
#[derive(Clone, Debug, PartialEq)]
pub struct Preview {
    outcomes: [Outcome; 4],
}

impl Preview {
    pub fn get(&self, grade: Grade) -> &Outcome {
        &self.outcomes[grade as usize]
    }

    pub fn into_outcome(self, grade: Grade) -> Outcome {
        let [again, hard, good, easy] = self.outcomes;
        match grade {
            Grade::Again => again,
            Grade::Hard => hard,
            Grade::Good => good,
            Grade::Easy => easy,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Grade, &Outcome)> {
        Grade::ALL.into_iter().zip(self.outcomes.iter())
    }

    /// The hypothetical card and interval for each grade.
    pub fn to_map(&self) -> BTreeMap<Grade, (CardRecord, T)> {
        self.iter()
            .map(|(grade, outcome)| (grade, (outcome.card.clone(), outcome.interval_days)))
            .collect()
    }
}

/// Where a step table sends a card.
#[derive(Clone, Copy, PartialEq, Debug)]
enum Step {
    /// Stay in the step table at `index`, due again in `minutes`.
    Stay { index: u32, minutes: f64 },
    /// Leave the step table for the review state.
    Graduate,
}

impl Scheduler {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Compute the outcome of each grade without committing to any of them.
    pub fn schedule_preview(
        &self,
        card: &CardRecord,
        now: Timestamp,
    ) -> Result<Preview, SchedulerError> {
        let before = &card.scheduling;
        before.validate()?;
        let memory = before.memory_state()?;
        let elapsed_days = before.elapsed_days_at(now);
        let w = self.params.weights();

        let in_steps = matches!(before.state, State::Learning | State::Relearning);
        let next: [MemoryState; 4] = Grade::ALL.map(|grade| match memory {
            Some(current) if in_steps && elapsed_days < 1.0 => {
                fsrs::same_day_memory_state(w, current, grade, self.params.enable_short_term())
            }
            _ => fsrs::next_memory_state(w, memory, grade, elapsed_days),
        });

        let factor = fuzz_factor(card.id, now, before.reps);
        let again_interval = self.interval(next[0].stability, elapsed_days, factor);
        let [hard_interval, good_interval, easy_interval] = self.review_intervals(
            [next[1].stability, next[2].stability, next[3].stability],
            elapsed_days,
            factor,
            before.state == State::Review,
        );

        let outcomes = Grade::ALL.map(|grade| {
            let review_interval = match grade {
                Grade::Again => again_interval,
                Grade::Hard => hard_interval,
                Grade::Good => good_interval,
                Grade::Easy => easy_interval,
            };
            self.transition(
                card,
                grade,
                now,
                elapsed_days,
                next[grade as usize],
                review_interval,
            )
        });
        Ok(Preview { outcomes })
    }

    /// Apply a grade to a card. The result is identical to the matching
    /// entry of [`Scheduler::schedule_preview`].
    ///
    /// Nothing is persisted: the caller must hold the returned record until
    /// its store accepts it.
    pub fn commit_review(
        &self,
        card: &CardRecord,
        grade: Grade,
        now: Timestamp,
    ) -> Result<(CardRecord, ReviewLog), SchedulerError> {
        let outcome = self.schedule_preview(card, now)?.into_outcome(grade);
        let after = &outcome.card.scheduling;
        if let (Some(stability), Some(difficulty)) = (after.stability, after.difficulty) {
            let diff_percent = ((difficulty - 1.0) / 9.0) * 100.0;
            log::debug!(
                "{} {} {}->{} S={:.2}d D={:.2}% due={}",
                &card.id.to_hex()[..8],
                grade,
                card.state(),
                after.state,
                stability,
                diff_percent,
                after.due
            );
        }
        Ok((outcome.card, outcome.log))
    }

    fn transition(
        &self,
        card: &CardRecord,
        grade: Grade,
        now: Timestamp,
        elapsed_days: T,
        memory: MemoryState,
        review_interval: u32,
    ) -> Outcome {
        let before = &card.scheduling;
        let mut after = SchedulingState {
            stability: Some(memory.stability),
            difficulty: Some(memory.difficulty),
            elapsed_days,
            last_review: Some(now),
            ..before.clone()
        };

        let step = match before.state {
            State::New | State::Learning => next_step(
                self.params.learning_steps(),
                before.learning_steps,
                grade,
                false,
            ),
            State::Relearning => next_step(
                self.params.relearning_steps(),
                before.learning_steps,
                grade,
                true,
            ),
            State::Review => match grade {
                Grade::Again => {
                    after.lapses += 1;
                    next_step(self.params.relearning_steps(), 0, grade, true)
                }
                Grade::Hard | Grade::Good | Grade::Easy => {
                    after.reps += 1;
                    Step::Graduate
                }
            },
        };

        match step {
            Step::Stay { index, minutes } => {
                after.state = match before.state {
                    State::New | State::Learning => State::Learning,
                    State::Review | State::Relearning => State::Relearning,
                };
                after.learning_steps = index;
                after.scheduled_days = minutes / MINUTES_PER_DAY;
                after.due = now.plus_minutes(minutes);
            }
            Step::Graduate => {
                after.state = State::Review;
                after.learning_steps = 0;
                after.scheduled_days = review_interval as f64;
                after.due = now.plus_days(review_interval);
            }
        }

        let interval_days = after.due.days_since(now);
        let log = ReviewLog {
            card_id: card.id,
            grade,
            reviewed_at: now,
            before: before.clone(),
            after: after.clone(),
        };
        Outcome {
            card: CardRecord {
                id: card.id,
                scheduling: after,
            },
            log,
            interval_days,
        }
    }

    /// Whole-day interval for a stability, fuzzed when enabled.
    fn interval(&self, stability: Stability, elapsed_days: T, factor: f64) -> u32 {
        let p = &self.params;
        if !p.enable_fuzz() {
            return fsrs::interval_from_stability(
                stability,
                p.request_retention(),
                p.maximum_interval(),
            );
        }
        apply_fuzz(
            fsrs::interval(p.request_retention(), stability),
            elapsed_days,
            p.maximum_interval(),
            p.fuzz_scale(),
            true,
            factor,
        )
    }

    /// Intervals for Hard, Good and Easy, ordered so that a better grade never
    /// schedules a card sooner. Outside the review state Hard does not compete
    /// with Good, since it usually repeats a step instead of graduating.
    fn review_intervals(
        &self,
        stabilities: [Stability; 3],
        elapsed_days: T,
        factor: f64,
        in_review: bool,
    ) -> [u32; 3] {
        let [hard, good, easy] = stabilities.map(|s| self.interval(s, elapsed_days, factor));
        let hard = hard.min(good);
        let good = if in_review { good.max(hard + 1) } else { good };
        let easy = easy.max(good + 1);
        let maximum = self.params.maximum_interval();
        [hard.min(maximum), good.min(maximum), easy.min(maximum)]
    }
}

/// Walk a step table (durations in minutes) from `index`.
///
/// Again restarts the table. Hard waits between the first two steps when on
/// the first step, and repeats the current step otherwise. Good advances,
/// graduating past the last step. Easy always graduates. With an empty
/// relearning table Again re-presents the card immediately; with any other
/// empty table the card graduates.
fn next_step(steps: &[f64], index: u32, grade: Grade, relearning: bool) -> Step {
    if steps.is_empty() {
        return if relearning && grade == Grade::Again {
            Step::Stay {
                index: 0,
                minutes: 0.0,
            }
        } else {
            Step::Graduate
        };
    }
    match grade {
        Grade::Again => Step::Stay {
            index: 0,
            minutes: steps[0],
        },
        Grade::Hard => {
            // The index can be stale if the table was shortened.
            let index = (index as usize).min(steps.len() - 1);
            let minutes = if index == 0 {
                match steps.get(1) {
                    Some(next) => (steps[0] + next) / 2.0,
                    None => steps[0] * 1.5,
                }
            } else {
                steps[index]
            };
            Step::Stay {
                index: index as u32,
                minutes,
            }
        }
        Grade::Good => {
            let next = index as usize + 1;
            match steps.get(next) {
                Some(minutes) => Step::Stay {
                    index: next as u32,
                    minutes: *minutes,
                },
                None => Step::Graduate,
            }
        }
        Grade::Easy => Step::Graduate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;
    use crate::fsrs::DEFAULT_WEIGHTS;
    use crate::fsrs::WEIGHT_BOUNDS;
    use crate::fsrs::interval_from_stability;
    use crate::params::ParameterConfig;
    use crate::types::card_hash::CardHash;

    fn t0() -> Fallible<Timestamp> {
        Timestamp::parse("2025-06-01T09:00:00Z")
    }

    fn new_card(now: Timestamp) -> CardRecord {
        CardRecord::new(CardHash::hash_bytes(b"capital of france"), now)
    }

    fn review_card(now: Timestamp, stability: f64, difficulty: f64, elapsed: u32) -> CardRecord {
        let last_review = now.plus_minutes(-(elapsed as f64) * MINUTES_PER_DAY);
        CardRecord {
            id: CardHash::hash_bytes(b"review card"),
            scheduling: SchedulingState {
                state: State::Review,
                due: last_review.plus_days(elapsed),
                stability: Some(stability),
                difficulty: Some(difficulty),
                elapsed_days: 1.0,
                scheduled_days: elapsed as f64,
                learning_steps: 0,
                reps: 3,
                lapses: 0,
                last_review: Some(last_review),
            },
        }
    }

    fn scheduler_with(config: ParameterConfig) -> Fallible<Scheduler> {
        Ok(Scheduler::new(Parameters::try_from(config)?))
    }

    #[test]
    fn test_new_card_good_enters_learning() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let (card, log) = scheduler.commit_review(&new_card(now), Grade::Good, now)?;
        let s = &card.scheduling;
        assert_eq!(s.state, State::Learning);
        assert_eq!(s.learning_steps, 1);
        assert_eq!(s.due, now.plus_minutes(10.0));
        assert_eq!(s.stability, Some(DEFAULT_WEIGHTS[2]));
        assert_eq!(s.last_review, Some(now));
        assert_eq!((s.reps, s.lapses), (0, 0));
        assert_eq!(log.before.state, State::New);
        assert_eq!(log.after, card.scheduling);
        assert_eq!(log.grade, Grade::Good);
        assert_eq!(log.reviewed_at, now);
        Ok(())
    }

    #[test]
    fn test_learning_card_graduates_on_good() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let (card, _) = scheduler.commit_review(&new_card(now), Grade::Good, now)?;
        let later = now.plus_minutes(10.0);
        let (card, _) = scheduler.commit_review(&card, Grade::Good, later)?;
        let s = &card.scheduling;
        assert_eq!(s.state, State::Review);
        assert_eq!(s.learning_steps, 0);
        assert_eq!(s.stability, Some(DEFAULT_WEIGHTS[2]));
        let interval = interval_from_stability(DEFAULT_WEIGHTS[2], 0.9, 36500);
        assert_eq!(s.due, later.plus_days(interval));
        assert_eq!(s.scheduled_days, interval as f64);
        assert_eq!((s.reps, s.lapses), (0, 0));
        Ok(())
    }

    #[test]
    fn test_review_again_lapses() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let card = review_card(now, 10.0, 5.0, 10);
        let (next, _) = scheduler.commit_review(&card, Grade::Again, now)?;
        let s = &next.scheduling;
        assert_eq!(s.state, State::Relearning);
        assert_eq!(s.learning_steps, 0);
        assert_eq!(s.lapses, card.scheduling.lapses + 1);
        assert_eq!(s.reps, card.scheduling.reps);
        assert_eq!(s.elapsed_days, 10.0);
        assert!(s.stability.unwrap() < 10.0);
        assert!(s.stability.unwrap() > 0.0);
        assert_eq!(s.due, now.plus_minutes(10.0));
        Ok(())
    }

    #[test]
    fn test_clock_skew() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let mut card = review_card(now, 10.0, 5.0, 10);
        // The last review is one second after the current instant.
        card.scheduling.last_review = Some(now.plus_minutes(1.0 / 60.0));
        card.scheduling.due = now.plus_days(10);
        let preview = scheduler.schedule_preview(&card, now)?;
        for (_, outcome) in preview.iter() {
            let s = &outcome.card.scheduling;
            assert_eq!(s.elapsed_days, 0.0);
            assert!(s.due >= now);
            assert!(s.scheduled_days >= 0.0);
            assert!(outcome.interval_days >= 0.0);
            assert!(outcome.log.overdue_days().is_finite());
        }
        let good = &preview.get(Grade::Good).card.scheduling;
        assert_eq!(good.stability, Some(10.0));
        Ok(())
    }

    #[test]
    fn test_new_card_never_relearning() -> Fallible<()> {
        let now = t0()?;
        let configs = [
            ParameterConfig::default(),
            ParameterConfig {
                learning_steps: Some(vec![]),
                ..Default::default()
            },
            ParameterConfig {
                learning_steps: Some(vec![5.0]),
                relearning_steps: Some(vec![]),
                ..Default::default()
            },
        ];
        for config in configs {
            let scheduler = scheduler_with(config)?;
            let preview = scheduler.schedule_preview(&new_card(now), now)?;
            for (grade, outcome) in preview.iter() {
                let state = outcome.card.state();
                assert!(
                    state == State::Learning || state == State::Review,
                    "{grade} -> {state}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_empty_learning_steps_graduate() -> Fallible<()> {
        let now = t0()?;
        let scheduler = scheduler_with(ParameterConfig {
            learning_steps: Some(vec![]),
            ..Default::default()
        })?;
        let preview = scheduler.schedule_preview(&new_card(now), now)?;
        for (_, outcome) in preview.iter() {
            assert_eq!(outcome.card.state(), State::Review);
            assert!(outcome.interval_days >= 1.0);
        }
        Ok(())
    }

    #[test]
    fn test_empty_relearning_steps_represent_immediately() -> Fallible<()> {
        let now = t0()?;
        let scheduler = scheduler_with(ParameterConfig {
            relearning_steps: Some(vec![]),
            ..Default::default()
        })?;
        let card = review_card(now, 10.0, 5.0, 10);
        let (card, _) = scheduler.commit_review(&card, Grade::Again, now)?;
        assert_eq!(card.state(), State::Relearning);
        assert_eq!(card.due(), now);
        assert!(card.is_due(now));
        let (card, _) = scheduler.commit_review(&card, Grade::Good, now)?;
        assert_eq!(card.state(), State::Review);
        assert!(card.due() >= now.plus_days(1));
        Ok(())
    }

    #[test]
    fn test_learning_steps_table() -> Fallible<()> {
        let now = t0()?;
        let scheduler = scheduler_with(ParameterConfig {
            learning_steps: Some(vec![1.0, 10.0, 60.0]),
            ..Default::default()
        })?;
        let card = new_card(now);

        let again = scheduler.schedule_preview(&card, now)?;
        let again = &again.get(Grade::Again).card;
        assert_eq!(again.state(), State::Learning);
        assert_eq!(again.scheduling.learning_steps, 0);
        assert_eq!(again.due(), now.plus_minutes(1.0));

        let hard = scheduler.schedule_preview(&card, now)?;
        let hard = &hard.get(Grade::Hard).card;
        assert_eq!(hard.scheduling.learning_steps, 0);
        assert_eq!(hard.due(), now.plus_minutes(5.5));

        let (card, _) = scheduler.commit_review(&card, Grade::Good, now)?;
        let (card, _) = scheduler.commit_review(&card, Grade::Good, now.plus_minutes(10.0))?;
        assert_eq!(card.scheduling.learning_steps, 2);
        assert_eq!(card.due(), now.plus_minutes(70.0));

        // Hard repeats the current step.
        let later = now.plus_minutes(70.0);
        let (hard, _) = scheduler.commit_review(&card, Grade::Hard, later)?;
        assert_eq!(hard.scheduling.learning_steps, 2);
        assert_eq!(hard.due(), later.plus_minutes(60.0));

        // Again restarts.
        let (again, _) = scheduler.commit_review(&card, Grade::Again, later)?;
        assert_eq!(again.state(), State::Learning);
        assert_eq!(again.scheduling.learning_steps, 0);
        assert_eq!(again.due(), later.plus_minutes(1.0));
        Ok(())
    }

    #[test]
    fn test_easy_skips_steps() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let preview = scheduler.schedule_preview(&new_card(now), now)?;
        let easy = preview.get(Grade::Easy);
        assert_eq!(easy.card.state(), State::Review);
        let good_interval = interval_from_stability(DEFAULT_WEIGHTS[2], 0.9, 36500) as f64;
        assert!(easy.interval_days > good_interval);
        Ok(())
    }

    #[test]
    fn test_relearning_graduates() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let card = review_card(now, 10.0, 5.0, 10);
        let (card, _) = scheduler.commit_review(&card, Grade::Again, now)?;
        let lapsed_stability = card.scheduling.stability;
        let later = now.plus_minutes(10.0);

        let (hard, _) = scheduler.commit_review(&card, Grade::Hard, later)?;
        assert_eq!(hard.state(), State::Relearning);
        assert_eq!(hard.due(), later.plus_minutes(15.0));

        let (again, _) = scheduler.commit_review(&card, Grade::Again, later)?;
        assert_eq!(again.state(), State::Relearning);
        assert_eq!(again.scheduling.lapses, 1);

        let (good, _) = scheduler.commit_review(&card, Grade::Good, later)?;
        assert_eq!(good.state(), State::Review);
        assert_eq!(good.scheduling.stability, lapsed_stability);
        assert_eq!((good.scheduling.reps, good.scheduling.lapses), (3, 1));
        Ok(())
    }

    #[test]
    fn test_counters() -> Fallible<()> {
        let mut now = t0()?;
        let scheduler = Scheduler::default();
        let mut card = new_card(now);
        let grades = [
            Grade::Good,
            Grade::Again,
            Grade::Good,
            Grade::Good,
            Grade::Good,
            Grade::Hard,
            Grade::Again,
            Grade::Again,
            Grade::Good,
            Grade::Easy,
            Grade::Again,
        ];
        for grade in grades {
            let (reps, lapses) = (card.scheduling.reps, card.scheduling.lapses);
            let state = card.state();
            let (next, _) = scheduler.commit_review(&card, grade, now)?;
            let s = &next.scheduling;
            match (state, grade) {
                (State::Review, Grade::Again) => {
                    assert_eq!((s.reps, s.lapses), (reps, lapses + 1));
                }
                (State::Review, _) => {
                    assert_eq!((s.reps, s.lapses), (reps + 1, lapses));
                }
                _ => {
                    assert_eq!((s.reps, s.lapses), (reps, lapses));
                }
            }
            now = next.due();
            card = next;
        }
        assert!(card.scheduling.lapses >= 2);
        Ok(())
    }

    #[test]
    fn test_interval_bounds() -> Fallible<()> {
        let now = t0()?;
        for max in [1, 2, 5, 36500] {
            for enable_fuzz in [false, true] {
                let scheduler = scheduler_with(ParameterConfig {
                    maximum_interval: Some(max),
                    enable_fuzz: Some(enable_fuzz),
                    ..Default::default()
                })?;
                for stability in [0.01, 1.0, 10.0, 500.0, 36500.0] {
                    let card = review_card(now, stability, 5.0, 3);
                    let preview = scheduler.schedule_preview(&card, now)?;
                    for grade in [Grade::Hard, Grade::Good, Grade::Easy] {
                        let days = preview.get(grade).interval_days;
                        assert!(days >= 1.0 && days <= max as f64, "{days} for max={max}");
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_low_retention_stays_within_maximum() -> Fallible<()> {
        let now = t0()?;
        for enable_fuzz in [false, true] {
            let scheduler = scheduler_with(ParameterConfig {
                request_retention: Some(0.01),
                maximum_interval: Some(36500),
                enable_fuzz: Some(enable_fuzz),
                ..Default::default()
            })?;
            let card = review_card(now, 36500.0, 5.0, 3);
            let preview = scheduler.schedule_preview(&card, now)?;
            for grade in [Grade::Hard, Grade::Good, Grade::Easy] {
                let outcome = preview.get(grade);
                let days = outcome.interval_days;
                assert!(days <= 36500.0, "{days}");
                if enable_fuzz {
                    assert!(days >= 34000.0, "{days}");
                } else {
                    assert_eq!(days, 36500.0);
                    assert_eq!(outcome.card.due(), now.plus_days(36500));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_extreme_weights_give_finite_intervals() -> Fallible<()> {
        let now = t0()?;
        let lows: Vec<f64> = WEIGHT_BOUNDS.iter().map(|(lo, _)| *lo).collect();
        let highs: Vec<f64> = WEIGHT_BOUNDS.iter().map(|(_, hi)| *hi).collect();
        for weights in [lows, highs] {
            let scheduler = scheduler_with(ParameterConfig {
                weights: Some(weights),
                ..Default::default()
            })?;
            for elapsed in [0, 1, 400] {
                for stability in [0.01, 5.0, 36500.0] {
                    let card = review_card(now, stability, 5.0, elapsed);
                    for (grade, outcome) in scheduler.schedule_preview(&card, now)?.iter() {
                        let s = &outcome.card.scheduling;
                        assert!(s.stability.is_some_and(f64::is_finite), "{grade}");
                        assert!(s.difficulty.is_some_and(f64::is_finite), "{grade}");
                        if s.state == State::Review {
                            assert!(outcome.interval_days >= 1.0, "{grade}");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_review_intervals_monotonic() -> Fallible<()> {
        let now = t0()?;
        for enable_fuzz in [false, true] {
            let scheduler = scheduler_with(ParameterConfig {
                enable_fuzz: Some(enable_fuzz),
                ..Default::default()
            })?;
            for stability in [0.5, 2.0, 10.0, 80.0, 900.0] {
                for difficulty in [1.0, 5.0, 9.5] {
                    for elapsed in [0, 1, 10, 100] {
                        let card = review_card(now, stability, difficulty, elapsed);
                        let preview = scheduler.schedule_preview(&card, now)?;
                        let hard = preview.get(Grade::Hard).interval_days;
                        let good = preview.get(Grade::Good).interval_days;
                        let easy = preview.get(Grade::Easy).interval_days;
                        assert!(hard <= good && good <= easy, "{hard} {good} {easy}");
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_preview_is_idempotent() -> Fallible<()> {
        let now = t0()?;
        let scheduler = scheduler_with(ParameterConfig {
            enable_fuzz: Some(true),
            ..Default::default()
        })?;
        let card = review_card(now, 25.0, 4.0, 30);
        let snapshot = card.clone();
        let a = scheduler.schedule_preview(&card, now)?;
        let b = scheduler.schedule_preview(&card, now)?;
        assert_eq!(a, b);
        assert_eq!(card, snapshot);
        assert_eq!(a.to_map().len(), 4);
        Ok(())
    }

    #[test]
    fn test_commit_matches_preview() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let card = review_card(now, 25.0, 4.0, 30);
        let preview = scheduler.schedule_preview(&card, now)?;
        for grade in Grade::ALL {
            let (next, log) = scheduler.commit_review(&card, grade, now)?;
            assert_eq!(&next, &preview.get(grade).card);
            assert_eq!(&log, &preview.get(grade).log);
        }
        Ok(())
    }

    #[test]
    fn test_due_never_before_review() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let cards = [
            new_card(now),
            review_card(now, 0.01, 10.0, 0),
            review_card(now, 3.0, 2.0, 40),
        ];
        for card in cards {
            for (_, outcome) in scheduler.schedule_preview(&card, now)?.iter() {
                assert!(outcome.card.due() >= now);
            }
        }
        Ok(())
    }

    #[test]
    fn test_inconsistent_card_rejected() -> Fallible<()> {
        let now = t0()?;
        let scheduler = Scheduler::default();
        let mut card = review_card(now, 10.0, 5.0, 10);
        card.scheduling.stability = None;
        let result = scheduler.commit_review(&card, Grade::Good, now);
        assert!(matches!(result, Err(SchedulerError::InvalidCardRecord(_))));
        Ok(())
    }

    #[test]
    fn test_json_round_trip() -> Fallible<()> {
        let now = t0()?;
        let scheduler = scheduler_with(ParameterConfig {
            enable_fuzz: Some(true),
            ..Default::default()
        })?;
        let mut card = new_card(now);
        let mut at = now;
        for grade in [Grade::Good, Grade::Good, Grade::Hard, Grade::Again] {
            let (next, _) = scheduler.commit_review(&card, grade, at)?;
            at = next.due().plus_minutes(37.0);
            card = next;
        }
        let json = serde_json::to_string(&card)?;
        let restored: CardRecord = serde_json::from_str(&json)?;
        assert_eq!(restored, card);
        for grade in Grade::ALL {
            assert_eq!(
                scheduler.commit_review(&restored, grade, at)?,
                scheduler.commit_review(&card, grade, at)?
            );
        }
        Ok(())
    }

    #[test]
    fn test_scheduler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Scheduler>();
        assert_send_sync::<Preview>();
    }
}
