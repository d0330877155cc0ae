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

use crate::clock::Clock;
use crate::collection::Collection;
use crate::error::Fallible;

pub fn list_decks(coll: &Collection) -> Fallible<()> {
    let decks = coll.db.list_decks()?;
    if decks.is_empty() {
        println!("No decks.");
    }
    for deck in decks {
        println!("{}  ({} cards)", deck.name, deck.card_count);
        if let Some(description) = deck.description {
            println!("    {description}");
        }
    }
    Ok(())
}

pub fn save_deck(
    mut coll: Collection,
    name: &str,
    description: Option<&str>,
    clock: &impl Clock,
) -> Fallible<()> {
    coll.db.save_deck(name, description, clock.now())?;
    Ok(())
}

pub fn delete_deck(mut coll: Collection, name: &str) -> Fallible<()> {
    let count = coll.db.delete_deck(name)?;
    println!("Deleted deck '{name}' and {count} cards.");
    Ok(())
}
