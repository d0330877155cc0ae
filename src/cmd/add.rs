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
use crate::types::card::Card;

pub fn add_card(
    mut coll: Collection,
    deck: &str,
    front: &str,
    back: &str,
    clock: &impl Clock,
) -> Fallible<()> {
    let card = Card::new(deck, front, back);
    coll.db.add_card(&card, clock.now())?;
    println!("{}", card.hash());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::helper::create_tmp_collection;

    #[test]
    fn test_add_card() -> Fallible<()> {
        let (dir, coll) = create_tmp_collection()?;
        add_card(coll, "Geography", "Capital of Chile?", "Santiago", &SystemClock)?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert_eq!(coll.db.card_count()?, 1);
        Ok(())
    }
}
