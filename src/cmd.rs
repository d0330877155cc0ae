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

pub mod add;
pub mod check;
pub mod decks;
pub mod delete_card;
pub mod due;
pub mod export;
pub mod preview;
pub mod review;
pub mod stats;

use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::card_hash::CardHash;

/// Find the card whose hash starts with `prefix`.
pub fn resolve_card(db: &Database, prefix: &str) -> Fallible<CardHash> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return fail("card hash is empty.");
    }
    let matches: Vec<CardHash> = db
        .cards(None)?
        .into_iter()
        .map(|(card, _)| card.hash())
        .filter(|hash| hash.to_hex().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [hash] => Ok(*hash),
        [] => fail(format!("no card matches '{prefix}'.")),
        _ => fail(format!(
            "'{prefix}' matches {} cards; use a longer prefix.",
            matches.len()
        )),
    }
}
