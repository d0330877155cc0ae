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

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// An instant in UTC. Serialized as an RFC 3339 string, both to JSON and to
/// the database.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn parse(s: &str) -> Fallible<Self> {
        let ts = DateTime::parse_from_rfc3339(s)?;
        Ok(Self(ts.with_timezone(&Utc)))
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// Signed duration from `other` to `self`.
    pub fn since(self, other: Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Fractional days from `earlier` to `self`. Negative if `earlier` is in
    /// the future.
    pub fn days_since(self, earlier: Timestamp) -> f64 {
        self.since(earlier).num_milliseconds() as f64 / MILLIS_PER_DAY
    }

    /// Saturates at the smallest or largest representable instant.
    pub fn plus_minutes(self, minutes: f64) -> Self {
        let millis = (minutes * 60_000.0).round() as i64;
        let shifted = Duration::try_milliseconds(millis)
            .and_then(|delta| self.0.checked_add_signed(delta));
        match shifted {
            Some(ts) => Self(ts),
            None if minutes < 0.0 => Self(DateTime::<Utc>::MIN_UTC),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Saturates at the largest representable instant.
    pub fn plus_days(self, days: u32) -> Self {
        match self.0.checked_add_signed(Duration::days(days as i64)) {
            Some(ts) => Self(ts),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let str = self.0.to_rfc3339();
        Ok(ToSqlOutput::from(str))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts =
            DateTime::parse_from_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        let ts = ts.with_timezone(&Utc);
        Ok(Timestamp(ts))
    }
}
