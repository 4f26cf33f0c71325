//! A library for simulating disease spread among agents roaming a network of places
//!
//! Epiroam models a population of agents spread over a set of places joined by
//! an undirected graph. Every step of a simulation runs three phases:
//! * **Movement.** Each agent may leave for a neighboring place, preferring
//!   desirable places that are not crowded.
//! * **Contact.** Within each place, every pair of agents meets once in each
//!   direction. An infectious agent can infect another, more easily when the
//!   place is crowded.
//! * **Progression.** Infected agents may die, and they build immunity day by
//!   day until they are cured.
//!
//! The central object is the [`World`], which owns the places, the agents, the
//! place graph and the random number streams:
//!
//! ```rust
//! use epiroam::{Statistic, World, WorldParameters};
//!
//! let parameters = WorldParameters {
//!     seed: 42,
//!     ..WorldParameters::default()
//! };
//! let mut world = World::randomized(&parameters).unwrap();
//! for census in world.run(10) {
//!     let infected: i64 = census.statistic(Statistic::Infected).map(|(_, n)| n).sum();
//!     println!("step {}: {infected} infected", census.step());
//! }
//! ```
//!
//! Worlds can also be assembled by hand from [`Place`]s and [`Agent`]s; see
//! [`World::add_place`] and [`World::add_agent`].
pub mod agent;
pub mod census;
pub mod error;
pub mod hashing;
pub mod log;
pub mod network;
pub mod parameters;
pub mod place;
pub mod random;
pub mod report;
pub mod world;

pub use agent::{Agent, AgentId, InfectionStatus, Transition};
pub use census::{Census, PlaceCensus, Statistic};
pub use error::EpiError;
pub use hashing::{HashMap, HashSet};
pub use network::PlaceGraph;
pub use parameters::{DiseaseParameters, WorldParameters};
pub use place::{Place, PlaceId};
pub use random::{RngId, RngStore};
pub use report::{CensusReport, CensusRow};
pub use world::{Entry, StepSummary, World};

// Re-exported for use by `define_rng!`.
pub use rand;
