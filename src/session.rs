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

//! Ties the scheduler to a clock and a store.

use crate::clock::Clock;
use crate::error::Fallible;
use crate::fsrs::Grade;
use crate::scheduler::Preview;
use crate::scheduler::Scheduler;
use crate::store::Store;
use crate::types::card_hash::CardHash;
use crate::types::card_record::CardRecord;
use crate::types::review_log::ReviewLog;
use crate::types::timestamp::Timestamp;

pub struct ReviewSession<S: Store, C: Clock> {
    scheduler: Scheduler,
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> ReviewSession<S, C> {
    pub fn new(scheduler: Scheduler, store: S, clock: C) -> Self {
        Self {
            scheduler,
            store,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// What each grade would do to the card right now.
    pub fn preview(&self, card_id: CardHash) -> Fallible<Preview> {
        let card = self.store.load(card_id)?;
        let now = self.now_for(&card);
        Ok(self.scheduler.schedule_preview(&card, now)?)
    }

    /// Grade a card and persist the result.
    ///
    /// The record and its log entry are committed together. If the commit
    /// fails, the stored card is left as it was before the review.
    pub fn review(&mut self, card_id: CardHash, grade: Grade) -> Fallible<(CardRecord, ReviewLog)> {
        let card = self.store.load(card_id)?;
        let now = self.now_for(&card);
        let (next, log) = self.scheduler.commit_review(&card, grade, now)?;
        self.store.commit(&next, &log)?;
        Ok((next, log))
    }

    fn now_for(&self, card: &CardRecord) -> Timestamp {
        let now = self.clock.now();
        if let Some(last_review) = card.scheduling.last_review {
            if now < last_review {
                log::warn!(
                    "Clock reads {now}, before the last review of {} at {last_review}. Treating elapsed time as zero.",
                    card.id
                );
            }
        }
        now
    }
}
