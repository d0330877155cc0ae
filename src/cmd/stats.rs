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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::clock::Clock;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::state::State;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone, Copy)]
pub enum StatsFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(coll: &Collection, format: StatsFormat, clock: &impl Clock) -> Fallible<()> {
    let stats = get_stats(coll, clock.now())?;
    match format {
        StatsFormat::Text => {
            println!("Decks:       {}", stats.deck_count);
            println!("Cards:       {}", stats.card_count);
            println!("  new:       {}", stats.new_count);
            println!("  learning:  {}", stats.learning_count);
            println!("  review:    {}", stats.review_count);
            println!("  relearning:{}", stats.relearning_count);
            println!("Due now:     {}", stats.due_count);
            println!("Reviews:     {}", stats.review_log_count);
            if let Some(r) = stats.average_retrievability {
                println!("Average retrievability: {:.1}%", r * 100.0);
            }
        }
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    deck_count: usize,
    card_count: usize,
    new_count: usize,
    learning_count: usize,
    review_count: usize,
    relearning_count: usize,
    due_count: usize,
    review_log_count: usize,
    /// Mean probability of recall over cards that have been reviewed.
    average_retrievability: Option<f64>,
}

fn get_stats(coll: &Collection, now: Timestamp) -> Fallible<Stats> {
    let cards = coll.db.cards(None)?;
    let count_state = |state: State| {
        cards
            .iter()
            .filter(|(_, record)| record.state() == state)
            .count()
    };
    let retrievabilities: Vec<f64> = cards
        .iter()
        .filter_map(|(_, record)| record.retrievability_at(now))
        .collect();
    let average_retrievability = if retrievabilities.is_empty() {
        None
    } else {
        Some(retrievabilities.iter().sum::<f64>() / retrievabilities.len() as f64)
    };
    Ok(Stats {
        deck_count: coll.db.list_decks()?.len(),
        card_count: cards.len(),
        new_count: count_state(State::New),
        learning_count: count_state(State::Learning),
        review_count: count_state(State::Review),
        relearning_count: count_state(State::Relearning),
        due_count: cards.iter().filter(|(_, record)| record.is_due(now)).count(),
        review_log_count: coll.db.review_count()?,
        average_retrievability,
    })
}
