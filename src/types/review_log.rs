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

use serde::Deserialize;
use serde::Serialize;

use crate::fsrs::Grade;
use crate::fsrs::T;
use crate::types::card_hash::CardHash;
use crate::types::card_record::SchedulingState;
use crate::types::timestamp::Timestamp;

/// One grading event. Append-only: never modified after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub card_id: CardHash,
    pub grade: Grade,
    pub reviewed_at: Timestamp,
    /// The card's scheduling state before the review.
    pub before: SchedulingState,
    /// The card's scheduling state after the review.
    pub after: SchedulingState,
}

impl ReviewLog {
    /// Days since the previous review, as seen at this review.
    pub fn elapsed_days(&self) -> T {
        self.after.elapsed_days
    }

    /// How late the review was relative to the interval scheduled at the
    /// previous review. Negative when the card was reviewed early.
    pub fn overdue_days(&self) -> T {
        self.after.elapsed_days - self.before.scheduled_days
    }
}
