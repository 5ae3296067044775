#![deny(missing_docs)]
//! A concurrent leader board: a ranked collection of identifiable entities
//! that many threads can update and query at once.
//!
//! Each entity implements [`Rankable`], exposing a stable id and a totally
//! ordered rank. The [`LeaderBoard`] keeps every entity in two indices:
//!
//! - an id map, for O(1) lookups, updates and removals;
//! - an [`OrderedIndex`], a concurrent skip list sorted by rank with ties
//!   broken by the lexicographic order of the id's string form.
//!
//! Rank windows are 1-indexed and inclusive. [`LeaderBoard::get_range`]
//! resolves the two window ends to entities by walking the ordered index,
//! then returns everything between them. [`LeaderBoard::get_top`] is
//! `get_range(1, n)`.
//!
//! Writes, and window reads, are serialized by one lock held by the board,
//! which keeps the two indices in agreement. Point reads
//! ([`LeaderBoard::get_by_id`], [`LeaderBoard::size`]) skip that lock and
//! may briefly lag an in-flight write.
//!
//! The skip list follows William Pugh's 1989 paper ["Concurrent Maintenance
//! of Skip Lists"].
//!
//! ["Concurrent Maintenance of Skip Lists"]: https://15721.courses.cs.cmu.edu/spring2018/papers/08-oltpindexes1/pugh-skiplists-cacm1990.pdf
//!
//! # Examples
//!
//! ```
//! use leaderboard::{LeaderBoard, Rankable, Scored};
//!
//! // Lower lap times rank first.
//! let laps: LeaderBoard<Scored<String, u32>> = LeaderBoard::new();
//! laps.add(Scored::new("Senna".to_string(), 78_120));
//! laps.add(Scored::new("Prost".to_string(), 78_410));
//! laps.add(Scored::new("Mansell".to_string(), 77_990));
//!
//! let podium = laps.get_top(3).unwrap();
//! let names: Vec<&str> = podium.iter().map(|lap| lap.id().as_str()).collect();
//! assert_eq!(names, ["Mansell", "Senna", "Prost"]);
//!
//! // Re-adding an id replaces its entry and moves it.
//! laps.add(Scored::new("Prost".to_string(), 77_500));
//! assert_eq!(laps.size(), 3);
//! assert_eq!(laps.get_top(1).unwrap()[0].id(), "Prost");
//!
//! // Windows are clamped to the board, but `to < from` is an error.
//! assert_eq!(laps.get_range(2, 100).unwrap().len(), 2);
//! assert!(laps.get_range(3, 2).is_err());
//!
//! assert!(laps.remove("Senna").is_some());
//! assert!(laps.get_by_id("Senna").is_none());
//! ```
//!
//! Boards are `Sync`, so they can be shared behind an [`Arc`](std::sync::Arc):
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use leaderboard::{LeaderBoard, Scored};
//!
//! let board: Arc<LeaderBoard<Scored<u64, u64>>> = Arc::new(LeaderBoard::new());
//! let workers: Vec<_> = (0..4_u64)
//!     .map(|worker| {
//!         let board = Arc::clone(&board);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 board.add(Scored::new(worker * 100 + i, i));
//!             }
//!         })
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! assert_eq!(board.size(), 400);
//! ```
//!
//! Custom entity types implement [`Rankable`] directly:
//!
//! ```
//! use leaderboard::{LeaderBoard, Rankable};
//!
//! #[derive(Debug)]
//! struct Fighter {
//!     name: &'static str,
//!     losses: u32,
//! }
//!
//! impl Rankable for Fighter {
//!     type Id = &'static str;
//!     type Rank = u32;
//!
//!     fn id(&self) -> &&'static str {
//!         &self.name
//!     }
//!     fn rank(&self) -> &u32 {
//!         &self.losses
//!     }
//! }
//!
//! let board = LeaderBoard::from([
//!     Fighter { name: "Zangief", losses: 4 },
//!     Fighter { name: "Akuma", losses: 0 },
//!     Fighter { name: "Chun Li", losses: 2 },
//! ]);
//! for fighter in &board {
//!     println!("{} has {} losses", fighter.name, fighter.losses);
//! }
//! ```
mod config;
mod error;
mod identity_index;
mod leader_board;
mod ordered_index;
mod rankable;
mod size_counter;

pub use config::{LeaderBoardConfig, DEFAULT_LEVEL_PROBABILITY, DEFAULT_MAX_LEVEL, DEFAULT_SEED};
pub use error::{LeaderBoardError, Result};
pub use leader_board::LeaderBoard;
pub use ordered_index::{OrderedIndex, Scanner};
pub use rankable::{RankKey, Rankable, Scored};
