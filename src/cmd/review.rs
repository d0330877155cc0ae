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
use crate::fsrs::Grade;
use crate::session::ReviewSession;

pub fn review_card(coll: Collection, card: &str, grade: Grade, clock: impl Clock) -> Fallible<()> {
    let card_id = resolve_card(&coll.db, card)?;
    let now = clock.now();
    let mut session = ReviewSession::new(coll.scheduler(), coll.db, clock);
    let (record, _) = session.review(card_id, grade)?;
    println!(
        "{}: {} ({})",
        &card_id.to_hex()[..8],
        record.state(),
        record.format_due(now)
    );
    Ok(())
}
