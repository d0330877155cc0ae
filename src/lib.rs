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

//! A flashcard collection with an FSRS spaced repetition scheduler.
//!
//! The scheduling core ([`fsrs`], [`params`], [`scheduler`], [`fuzz`]) is
//! pure and synchronous. [`session`] connects it to a [`clock::Clock`] and a
//! [`store::Store`]; [`db`] is the SQLite store behind the command line.

pub mod cli;
pub mod clock;
mod cmd;
pub mod collection;
pub mod db;
pub mod error;
pub mod fsrs;
pub mod fuzz;
#[cfg(test)]
mod helper;
pub mod params;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod types;
