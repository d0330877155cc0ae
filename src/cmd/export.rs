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

use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::fsrs::Grade;
use crate::types::card_hash::CardHash;
use crate::types::card_record::SchedulingState;
use crate::types::timestamp::Timestamp;

pub fn export_collection(coll: &Collection) -> Fallible<()> {
    let export: Export = get_export(coll)?;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    decks: Vec<DeckExport>,
    cards: Vec<CardExport>,
    reviews: Vec<ReviewExport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeckExport {
    name: String,
    description: Option<String>,
    updated_at: Timestamp,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardExport {
    hash: CardHash,
    deck_name: String,
    front: String,
    back: String,
    scheduling: SchedulingState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewExport {
    hash: CardHash,
    reviewed_at: Timestamp,
    grade: Grade,
    before: SchedulingState,
    after: SchedulingState,
}

fn get_export(coll: &Collection) -> Fallible<Export> {
    let decks: Vec<DeckExport> = coll
        .db
        .list_decks()?
        .into_iter()
        .map(|deck| DeckExport {
            name: deck.name,
            description: deck.description,
            updated_at: deck.updated_at,
        })
        .collect();
    let cards: Vec<CardExport> = coll
        .db
        .cards(None)?
        .into_iter()
        .map(|(card, record)| CardExport {
            hash: card.hash(),
            deck_name: card.deck_name().to_owned(),
            front: card.front().to_owned(),
            back: card.back().to_owned(),
            scheduling: record.scheduling,
        })
        .collect();
    let reviews: Vec<ReviewExport> = coll
        .db
        .all_logs()?
        .into_iter()
        .map(|log| ReviewExport {
            hash: log.card_id,
            reviewed_at: log.reviewed_at,
            grade: log.grade,
            before: log.before,
            after: log.after,
        })
        .collect();
    Ok(Export {
        decks,
        cards,
        reviews,
    })
}
