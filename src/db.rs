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

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::Grade;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::card_hash::CardHash;
use crate::types::card_record::CardRecord;
use crate::types::card_record::SchedulingState;
use crate::types::review_log::ReviewLog;
use crate::types::timestamp::Timestamp;

pub struct Database {
    conn: Connection,
}

/// A deck and how many cards it holds.
#[derive(Clone, Debug, PartialEq)]
pub struct DeckSummary {
    pub name: String,
    pub description: Option<String>,
    pub updated_at: Timestamp,
    pub card_count: usize,
}

const CARD_COLUMNS: &str = "c.card_hash, d.name, c.front, c.back, c.state, c.due, c.stability, c.difficulty, c.elapsed_days, c.scheduled_days, c.learning_steps, c.reps, c.lapses, c.last_review";

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    /// Add a new card, creating its deck if needed.
    ///
    /// If a card with the same hash exists, returns an error.
    pub fn add_card(&mut self, card: &Card, now: Timestamp) -> Fallible<CardRecord> {
        log::debug!("Adding new card: {}", card.hash());
        if card.deck_name().is_empty() {
            return fail("deck name is empty.");
        }
        if card.front().is_empty() {
            return fail("card front is empty.");
        }
        let record = CardRecord::new(card.hash(), now);
        let tx = self.conn.transaction()?;
        if card_exists(&tx, card.hash())? {
            return fail(format!("card {} already exists.", card.hash()));
        }
        let deck_id = get_or_create_deck(&tx, card.deck_name(), now)?;
        touch_deck(&tx, deck_id, now)?;
        let sql = "insert into cards (card_hash, deck_id, front, back, added_at, state, due, stability, difficulty, elapsed_days, scheduled_days, learning_steps, reps, lapses, last_review) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
        let s = &record.scheduling;
        tx.execute(
            sql,
            rusqlite::params![
                record.id,
                deck_id,
                card.front(),
                card.back(),
                now,
                s.state,
                s.due,
                s.stability,
                s.difficulty,
                s.elapsed_days,
                s.scheduled_days,
                s.learning_steps,
                s.reps,
                s.lapses,
                s.last_review,
            ],
        )?;
        tx.commit()?;
        Ok(record)
    }

    /// Get a card's content and scheduling state.
    pub fn get_card(&self, card_hash: CardHash) -> Fallible<Option<(Card, CardRecord)>> {
        let sql = format!(
            "select {CARD_COLUMNS} from cards c join decks d on d.deck_id = c.deck_id where c.card_hash = ?;"
        );
        let card = self
            .conn
            .query_row(&sql, [card_hash], read_card)
            .optional()?;
        Ok(card)
    }

    /// All cards, optionally restricted to one deck, ordered by due date.
    pub fn cards(&self, deck_name: Option<&str>) -> Fallible<Vec<(Card, CardRecord)>> {
        let sql = format!(
            "select {CARD_COLUMNS} from cards c join decks d on d.deck_id = c.deck_id where ?1 is null or d.name = ?1;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([deck_name], read_card)?;
        let mut cards = Vec::new();
        for row in rows {
            cards.push(row?);
        }
        // Timestamps are stored as text, which does not sort chronologically
        // across precisions, so order them here.
        cards.sort_by_key(|(card, record)| (record.due(), card.hash()));
        Ok(cards)
    }

    /// The cards due at `now`, most overdue first.
    pub fn due_cards(
        &self,
        deck_name: Option<&str>,
        now: Timestamp,
    ) -> Fallible<Vec<(Card, CardRecord)>> {
        let mut cards = self.cards(deck_name)?;
        cards.retain(|(_, record)| record.is_due(now));
        Ok(cards)
    }

    pub fn list_decks(&self) -> Fallible<Vec<DeckSummary>> {
        let sql = "select d.name, d.description, d.updated_at, count(c.card_hash) from decks d left outer join cards c on c.deck_id = d.deck_id group by d.deck_id order by d.name;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut decks = Vec::new();
        while let Some(row) = rows.next()? {
            let card_count: i64 = row.get(3)?;
            decks.push(DeckSummary {
                name: row.get(0)?,
                description: row.get(1)?,
                updated_at: row.get(2)?,
                card_count: card_count as usize,
            });
        }
        Ok(decks)
    }

    /// Create a deck if it does not exist yet. If `description` is given it
    /// replaces the deck's description, and an empty description clears it.
    ///
    /// Decks cannot be renamed: the deck name is part of every card hash.
    pub fn save_deck(
        &mut self,
        deck_name: &str,
        description: Option<&str>,
        now: Timestamp,
    ) -> Fallible<()> {
        if deck_name.trim().is_empty() {
            return fail("deck name is empty.");
        }
        let tx = self.conn.transaction()?;
        let deck_id = get_or_create_deck(&tx, deck_name, now)?;
        if let Some(description) = description {
            let description = description.trim();
            let description = (!description.is_empty()).then_some(description);
            tx.execute(
                "update decks set description = ? where deck_id = ?;",
                (description, deck_id),
            )?;
            touch_deck(&tx, deck_id, now)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete a deck together with its cards and their review logs. Returns
    /// the number of cards deleted.
    pub fn delete_deck(&mut self, deck_name: &str) -> Fallible<usize> {
        let tx = self.conn.transaction()?;
        let deck_id: Option<i64> = tx
            .query_row(
                "select deck_id from decks where name = ?;",
                [deck_name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(deck_id) = deck_id else {
            return fail(format!("no deck named '{deck_name}'."));
        };
        let card_count: i64 = tx.query_row(
            "select count(*) from cards where deck_id = ?;",
            [deck_id],
            |row| row.get(0),
        )?;
        tx.execute("delete from decks where deck_id = ?;", [deck_id])?;
        tx.commit()?;
        log::debug!("Deleted deck '{deck_name}' with {card_count} cards.");
        Ok(card_count as usize)
    }

    /// Delete one card and its review log.
    pub fn delete_card(&mut self, card_hash: CardHash, now: Timestamp) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        let deck_id: Option<DeckId> = tx
            .query_row(
                "select deck_id from cards where card_hash = ?;",
                [card_hash],
                |row| row.get(0),
            )
            .optional()?;
        let Some(deck_id) = deck_id else {
            return fail(format!("no card with hash {card_hash}."));
        };
        tx.execute("delete from cards where card_hash = ?;", [card_hash])?;
        touch_deck(&tx, deck_id, now)?;
        tx.commit()?;
        log::debug!("Deleted card {card_hash}.");
        Ok(())
    }

    /// The review log of one card, oldest first.
    pub fn logs_for_card(&self, card_hash: CardHash) -> Fallible<Vec<ReviewLog>> {
        let sql = "select card_hash, grade, reviewed_at, before, after from review_logs where card_hash = ? order by log_id;";
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([card_hash], read_log_row)?;
        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?.into_log()?);
        }
        Ok(logs)
    }

    /// Every review log entry, in insertion order.
    pub fn all_logs(&self) -> Fallible<Vec<ReviewLog>> {
        let sql = "select card_hash, grade, reviewed_at, before, after from review_logs order by log_id;";
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], read_log_row)?;
        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?.into_log()?);
        }
        Ok(logs)
    }

    pub fn card_count(&self) -> Fallible<usize> {
        let count: i64 = self
            .conn
            .query_row("select count(*) from cards;", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn review_count(&self) -> Fallible<usize> {
        let count: i64 =
            self.conn
                .query_row("select count(*) from review_logs;", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl Store for Database {
    fn load(&self, card_id: CardHash) -> Fallible<CardRecord> {
        match self.get_card(card_id)? {
            Some((_, record)) => Ok(record),
            None => fail(format!("no card with hash {card_id}.")),
        }
    }

    /// Cards enter the database through [`Database::add_card`], so saving an
    /// unknown card is an error.
    fn save(&mut self, card: &CardRecord) -> Fallible<()> {
        update_card(&self.conn, card)
    }

    fn append_log(&mut self, log: &ReviewLog) -> Fallible<()> {
        insert_log(&self.conn, log)
    }

    fn commit(&mut self, card: &CardRecord, log: &ReviewLog) -> Fallible<()> {
        if log.card_id != card.id {
            return fail(format!(
                "log entry for {} committed with card {}.",
                log.card_id, card.id
            ));
        }
        let tx = self.conn.transaction()?;
        update_card(&tx, card)?;
        insert_log(&tx, log)?;
        tx.commit()?;
        Ok(())
    }
}

fn update_card(conn: &Connection, card: &CardRecord) -> Fallible<()> {
    let sql = "update cards set state = ?, due = ?, stability = ?, difficulty = ?, elapsed_days = ?, scheduled_days = ?, learning_steps = ?, reps = ?, lapses = ?, last_review = ? where card_hash = ?;";
    let s = &card.scheduling;
    let updated = conn.execute(
        sql,
        rusqlite::params![
            s.state,
            s.due,
            s.stability,
            s.difficulty,
            s.elapsed_days,
            s.scheduled_days,
            s.learning_steps,
            s.reps,
            s.lapses,
            s.last_review,
            card.id,
        ],
    )?;
    if updated == 0 {
        return fail(format!("no card with hash {}.", card.id));
    }
    Ok(())
}

fn insert_log(conn: &Connection, log: &ReviewLog) -> Fallible<()> {
    let before = serde_json::to_string(&log.before)?;
    let after = serde_json::to_string(&log.after)?;
    let sql = "insert into review_logs (card_hash, grade, reviewed_at, before, after) values (?, ?, ?, ?, ?);";
    conn.execute(
        sql,
        (log.card_id, log.grade, log.reviewed_at, before, after),
    )?;
    Ok(())
}

fn read_card(row: &Row) -> rusqlite::Result<(Card, CardRecord)> {
    let card_hash: CardHash = row.get(0)?;
    let deck_name: String = row.get(1)?;
    let front: String = row.get(2)?;
    let back: String = row.get(3)?;
    let scheduling = SchedulingState {
        state: row.get(4)?,
        due: row.get(5)?,
        stability: row.get(6)?,
        difficulty: row.get(7)?,
        elapsed_days: row.get(8)?,
        scheduled_days: row.get(9)?,
        learning_steps: row.get(10)?,
        reps: row.get(11)?,
        lapses: row.get(12)?,
        last_review: row.get(13)?,
    };
    let card = Card::new(deck_name, front, back);
    let record = CardRecord {
        id: card_hash,
        scheduling,
    };
    Ok((card, record))
}

struct LogRow {
    card_hash: CardHash,
    grade: Grade,
    reviewed_at: Timestamp,
    before: String,
    after: String,
}

impl LogRow {
    fn into_log(self) -> Fallible<ReviewLog> {
        Ok(ReviewLog {
            card_id: self.card_hash,
            grade: self.grade,
            reviewed_at: self.reviewed_at,
            before: serde_json::from_str(&self.before)?,
            after: serde_json::from_str(&self.after)?,
        })
    }
}

fn read_log_row(row: &Row) -> rusqlite::Result<LogRow> {
    Ok(LogRow {
        card_hash: row.get(0)?,
        grade: row.get(1)?,
        reviewed_at: row.get(2)?,
        before: row.get(3)?,
        after: row.get(4)?,
    })
}

fn card_exists(tx: &Transaction, card_hash: CardHash) -> Fallible<bool> {
    let sql = "select count(*) from cards where card_hash = ?;";
    let count: i64 = tx.query_row(sql, [card_hash], |row| row.get(0))?;
    Ok(count > 0)
}

type DeckId = i64;

fn get_or_create_deck(tx: &Transaction, name: &str, now: Timestamp) -> Fallible<DeckId> {
    let existing: Option<DeckId> = tx
        .query_row("select deck_id from decks where name = ?;", [name], |row| {
            row.get(0)
        })
        .optional()?;
    if let Some(deck_id) = existing {
        return Ok(deck_id);
    }
    log::debug!("Creating deck '{name}'.");
    let sql = "insert into decks (name, created_at, updated_at) values (?, ?, ?) returning deck_id;";
    let deck_id: DeckId = tx.query_row(sql, (name, now, now), |row| row.get(0))?;
    Ok(deck_id)
}

fn touch_deck(tx: &Transaction, deck_id: DeckId, now: Timestamp) -> Fallible<()> {
    tx.execute(
        "update decks set updated_at = ? where deck_id = ?;",
        (now, deck_id),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
