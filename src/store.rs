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

//! The persistence port used by review sessions.

use std::collections::HashMap;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::card_hash::CardHash;
use crate::types::card_record::CardRecord;
use crate::types::review_log::ReviewLog;

/// Where card records and review logs live.
///
/// A store is not a transaction manager. Two sessions that load the same
/// card, review it, and save it race: the last `save` wins and the other
/// review survives only in the log.
pub trait Store {
    /// Load the current record of a card. Fails if the card is unknown.
    fn load(&self, card_id: CardHash) -> Fallible<CardRecord>;

    /// Insert or replace a card's record.
    fn save(&mut self, card: &CardRecord) -> Fallible<()>;

    /// Append an entry to the review log.
    fn append_log(&mut self, log: &ReviewLog) -> Fallible<()>;

    /// Save a reviewed card together with the log entry of that review. Either
    /// both are stored or neither is.
    fn commit(&mut self, card: &CardRecord, log: &ReviewLog) -> Fallible<()>;
}

/// A store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    cards: HashMap<CardHash, CardRecord>,
    logs: Vec<ReviewLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The review log of one card, oldest first.
    pub fn logs_for(&self, card_id: CardHash) -> Vec<&ReviewLog> {
        self.logs.iter().filter(|log| log.card_id == card_id).collect()
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }
}

impl Store for MemoryStore {
    fn load(&self, card_id: CardHash) -> Fallible<CardRecord> {
        match self.cards.get(&card_id) {
            Some(card) => Ok(card.clone()),
            None => fail(format!("no card with hash {card_id}.")),
        }
    }

    fn save(&mut self, card: &CardRecord) -> Fallible<()> {
        self.cards.insert(card.id, card.clone());
        Ok(())
    }

    fn append_log(&mut self, log: &ReviewLog) -> Fallible<()> {
        self.logs.push(log.clone());
        Ok(())
    }

    fn commit(&mut self, card: &CardRecord, log: &ReviewLog) -> Fallible<()> {
        if log.card_id != card.id {
            return fail(format!("log entry for {} committed with card {}.", log.card_id, card.id));
        }
        self.save(card)?;
        self.append_log(log)
    }
}
