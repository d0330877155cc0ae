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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;

/// Validate every card record. Loading the collection has already validated
/// the configuration.
pub fn check_collection(coll: &Collection) -> Fallible<()> {
    let mut problems = 0;
    for (card, record) in coll.db.cards(None)? {
        if card.hash() != record.id {
            log::error!("{}: stored hash does not match content", record.id);
            problems += 1;
        }
        if let Err(e) = record.scheduling.validate() {
            log::error!("{}: {e}", record.id);
            problems += 1;
        }
    }
    if problems > 0 {
        return fail(format!("found {problems} problems."));
    }
    println!("ok");
    Ok(())
}
