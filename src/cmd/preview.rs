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
use crate::cmd::resolve_card;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::session::ReviewSession;

pub fn preview_card(coll: Collection, card: &str, clock: impl Clock) -> Fallible<()> {
    let card_id = resolve_card(&coll.db, card)?;
    let now = clock.now();
    let session = ReviewSession::new(coll.scheduler(), coll.db, clock);
    let preview = session.preview(card_id)?;
    for (grade, outcome) in preview.iter() {
        println!(
            "{:<5}  {:<10}  {:>8.2} days  {}",
            grade.as_str(),
            outcome.card.state(),
            outcome.interval_days,
            outcome.card.format_due(now)
        );
    }
    Ok(())
}
