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

use clap::Parser;
use clap::Subcommand;

use crate::clock::Clock;
use crate::clock::FixedClock;
use crate::clock::SystemClock;
use crate::cmd::add::add_card;
use crate::cmd::check::check_collection;
use crate::cmd::decks::delete_deck;
use crate::cmd::decks::list_decks;
use crate::cmd::decks::save_deck;
use crate::cmd::delete_card::delete_card;
use crate::cmd::due::list_due;
use crate::cmd::export::export_collection;
use crate::cmd::preview::preview_card;
use crate::cmd::review::review_card;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::fsrs::Grade;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the collection directory. Defaults to the current directory.
    #[arg(long, short, global = true)]
    directory: Option<String>,
    /// Act as if the current time were this RFC 3339 timestamp.
    #[arg(long, global = true)]
    at: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a card to a deck, creating the deck if needed.
    Add {
        deck: String,
        front: String,
        back: String,
    },
    /// List the cards that are due.
    Due {
        /// Only list cards in this deck.
        #[arg(long)]
        deck: Option<String>,
    },
    /// Show what each grade would do to a card.
    Preview {
        /// The card's hash, or an unambiguous prefix of it.
        card: String,
    },
    /// Grade a card.
    Review {
        /// The card's hash, or an unambiguous prefix of it.
        card: String,
        /// One of again, hard, good, easy (or 1-4).
        grade: String,
    },
    /// Create a deck, or set the description of an existing one.
    Deck {
        name: String,
        /// The deck's description. An empty string clears it.
        #[arg(long)]
        description: Option<String>,
    },
    /// List decks, their descriptions and card counts.
    Decks,
    /// Delete a deck with all of its cards and their review history.
    DeleteDeck { name: String },
    /// Delete a card and its review history.
    DeleteCard {
        /// The card's hash, or an unambiguous prefix of it.
        card: String,
    },
    /// Print collection statistics.
    Stats {
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Export all cards and review logs as JSON.
    Export,
    /// Check that the collection and its configuration are valid.
    Check,
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    match cli.at {
        Some(at) => run(cli.directory, cli.command, FixedClock::new(Timestamp::parse(&at)?)),
        None => run(cli.directory, cli.command, SystemClock),
    }
}

fn run(directory: Option<String>, command: Command, clock: impl Clock) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    match command {
        Command::Add { deck, front, back } => add_card(coll, &deck, &front, &back, &clock),
        Command::Due { deck } => list_due(&coll, deck.as_deref(), &clock),
        Command::Preview { card } => preview_card(coll, &card, clock),
        Command::Review { card, grade } => {
            let grade = Grade::try_from(grade.as_str())?;
            review_card(coll, &card, grade, clock)
        }
        Command::Deck { name, description } => {
            save_deck(coll, &name, description.as_deref(), &clock)
        }
        Command::Decks => list_decks(&coll),
        Command::DeleteDeck { name } => delete_deck(coll, &name),
        Command::DeleteCard { card } => delete_card(coll, &card, &clock),
        Command::Stats { format } => print_stats(&coll, format, &clock),
        Command::Export => export_collection(&coll),
        Command::Check => check_collection(&coll),
    }
}
