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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// Identifies a card. Stored and serialized as 64 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardHash([u8; 32]);

impl CardHash {
    pub fn hash_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Hash a sequence of text fields. Fields are NUL-separated, so moving
    /// text across a boundary changes the hash.
    pub fn of_fields(fields: &[&str]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(&[0]);
            }
            hasher.update(field.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }

    pub fn from_hex(s: &str) -> Fallible<Self> {
        match blake3::Hash::from_hex(s) {
            Ok(hash) => Ok(Self(*hash.as_bytes())),
            Err(_) => Err(ErrorReport::new(format!("invalid card hash: {s}"))),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl TryFrom<String> for CardHash {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CardHash::from_hex(&value)
    }
}

impl From<CardHash> for String {
    fn from(value: CardHash) -> Self {
        value.to_hex()
    }
}

impl Display for CardHash {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl ToSql for CardHash {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_hex()))
    }
}

impl FromSql for CardHash {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardHash::from_hex(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
