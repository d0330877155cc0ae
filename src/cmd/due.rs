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

pub fn list_due(coll: &Collection, deck: Option<&str>, clock: &impl Clock) -> Fallible<()> {
    let now = clock.now();
    let due = coll.db.due_cards(deck, now)?;
    if due.is_empty() {
        println!("No cards due.");
        return Ok(());
    }
    for (card, record) in due.iter() {
        println!(
            "{}  {:<10}  {}  [{}] {}",
            &card.hash().to_hex()[..8],
            record.state(),
            record.format_due(now),
            card.deck_name(),
            card.front()
        );
    }
    println!("{} cards due.", due.len());
    Ok(())
}
