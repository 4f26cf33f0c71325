//! Places are the nodes agents occupy and move between.
//!
//! A [`Place`] owns the authoritative set of agents present in it. Occupancy
//! is measured in *live* agents: the dead stay in the set (they are never
//! moved again) but no longer count towards crowding or contact.

use std::fmt::{self, Display};

use indexmap::IndexSet;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::error::EpiError;
use crate::parameters::{check_unit_interval, DiseaseParameters};

pub const DEFAULT_CAPACITY: u32 = 10;
pub const DEFAULT_DESIRABILITY: f64 = 1.0;
pub const DEFAULT_FULLNESS_AVERSION_FACTOR: f64 = 0.1;

/// Index of a place within its [`World`](crate::world::World).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceId(pub(crate) usize);

impl PlaceId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        PlaceId(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "place {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    name: String,
    capacity: u32,
    desirability: f64,
    fullness_aversion_factor: f64,
    agents: IndexSet<AgentId>,
    neighbors: IndexSet<PlaceId>,
}

impl Place {
    /// A place with the default capacity, desirability and fullness aversion,
    /// no agents and no neighbors.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Place {
            name: name.into(),
            capacity: DEFAULT_CAPACITY,
            desirability: DEFAULT_DESIRABILITY,
            fullness_aversion_factor: DEFAULT_FULLNESS_AVERSION_FACTOR,
            agents: IndexSet::new(),
            neighbors: IndexSet::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_desirability(mut self, desirability: f64) -> Self {
        self.desirability = desirability;
        self
    }

    #[must_use]
    pub fn with_fullness_aversion_factor(mut self, fullness_aversion_factor: f64) -> Self {
        self.fullness_aversion_factor = fullness_aversion_factor;
        self
    }

    /// Declares neighbors for this place. The declaration may be one-sided or
    /// repeat a place; the world makes the adjacency symmetric when the place
    /// is added.
    #[must_use]
    pub fn with_neighbors(mut self, neighbors: impl IntoIterator<Item = PlaceId>) -> Self {
        self.neighbors.extend(neighbors);
        self
    }

    /// # Errors
    ///
    /// Returns [`EpiError::InvalidParameter`] if the capacity is zero or the
    /// desirability or fullness aversion factor lie outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), EpiError> {
        if self.capacity == 0 {
            return Err(EpiError::InvalidParameter(format!(
                "capacity of place {} must be > 0",
                self.name
            )));
        }
        check_unit_interval("desirability", self.desirability)?;
        check_unit_interval("fullness_aversion_factor", self.fullness_aversion_factor)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub fn desirability(&self) -> f64 {
        self.desirability
    }

    #[must_use]
    pub fn fullness_aversion_factor(&self) -> f64 {
        self.fullness_aversion_factor
    }

    /// Agents present here, in arrival order.
    #[must_use]
    pub fn agents(&self) -> &IndexSet<AgentId> {
        &self.agents
    }

    #[must_use]
    pub fn neighbors(&self) -> &IndexSet<PlaceId> {
        &self.neighbors
    }

    #[must_use]
    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.agents.contains(&agent_id)
    }

    /// Number of live agents present.
    #[must_use]
    pub fn live_population(&self, agents: &[Agent]) -> usize {
        self.agents
            .iter()
            .filter(|agent_id| agents[agent_id.0].is_alive())
            .count()
    }

    /// `max(0, 1 - factor * live_population / capacity)`: 1 for an empty place,
    /// falling towards 0 as it fills.
    #[must_use]
    pub fn fullness_aversion_score(&self, agents: &[Agent]) -> f64 {
        let occupancy = self.live_population(agents) as f64 / f64::from(self.capacity);
        (1.0 - self.fullness_aversion_factor * occupancy).max(0.0)
    }

    #[must_use]
    pub fn has_capacity(&self, agents: &[Agent]) -> bool {
        self.capacity as usize > self.live_population(agents)
    }

    /// Infection amplification from crowding: `1 - fullness_aversion_score`.
    #[must_use]
    pub fn hazard(&self, agents: &[Agent]) -> f64 {
        1.0 - self.fullness_aversion_score(agents)
    }

    /// Deterministic part of a movement score: desirability discounted by crowding.
    #[must_use]
    pub fn attractiveness(&self, agents: &[Agent]) -> f64 {
        self.desirability * self.fullness_aversion_score(agents)
    }

    /// Runs the contact check for every ordered pair of agents present, using
    /// this place's current hazard. Returns the number of new infections.
    ///
    /// The pairs include each agent with itself. That only matters for a
    /// cured agent, which keeps its infectiousness and can reinfect itself.
    pub fn evolve(&self, agents: &mut [Agent], disease: &DiseaseParameters) -> usize {
        let hazard = self.hazard(agents);
        let mut infections = 0;
        for &agent_id in &self.agents {
            for &contra_id in &self.agents {
                let contra = agents[contra_id.0].as_contact();
                if agents[agent_id.0].contact(contra, hazard, disease) {
                    trace!(
                        "{} infected {} at {} (hazard {hazard:.3})",
                        agents[contra_id.0].name(),
                        agents[agent_id.0].name(),
                        self.name
                    );
                    infections += 1;
                }
            }
        }
        infections
    }

    pub(crate) fn insert_agent(&mut self, agent_id: AgentId) -> bool {
        self.agents.insert(agent_id)
    }

    pub(crate) fn remove_agent(&mut self, agent_id: AgentId) -> bool {
        self.agents.shift_remove(&agent_id)
    }

    pub(crate) fn declares(&self, place_id: PlaceId) -> bool {
        self.neighbors.contains(&place_id)
    }

    pub(crate) fn insert_neighbor(&mut self, place_id: PlaceId) -> bool {
        self.neighbors.insert(place_id)
    }

    pub(crate) fn set_neighbors(&mut self, neighbors: IndexSet<PlaceId>) {
        self.neighbors = neighbors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn crowd(place: &mut Place, size: usize) -> Vec<Agent> {
        let agents: Vec<Agent> = (0..size).map(|i| Agent::new(format!("a{i}"))).collect();
        for index in 0..size {
            place.insert_agent(AgentId(index));
        }
        agents
    }

    #[test]
    fn defaults() {
        let place = Place::new("market");
        assert_eq!(place.capacity(), 10);
        assert_eq!(place.desirability(), 1.0);
        assert_eq!(place.fullness_aversion_factor(), 0.1);
        assert!(place.agents().is_empty());
        assert!(place.neighbors().is_empty());
    }

    #[test]
    fn places_do_not_share_containers() {
        let mut first = Place::new("a");
        let second = Place::new("b");
        first.insert_agent(AgentId(0));
        first.insert_neighbor(PlaceId(1));
        assert!(second.agents().is_empty());
        assert!(second.neighbors().is_empty());
    }

    #[test]
    fn fullness_aversion_score_tracks_live_population() {
        let mut place = Place::new("square")
            .with_capacity(4)
            .with_fullness_aversion_factor(0.5);
        let mut agents = crowd(&mut place, 2);
        // 1 - 0.5 * 2 / 4
        assert_approx_eq!(place.fullness_aversion_score(&agents), 0.75);
        assert_approx_eq!(place.hazard(&agents), 0.25);

        agents[0].die();
        assert_eq!(place.live_population(&agents), 1);
        assert_approx_eq!(place.fullness_aversion_score(&agents), 0.875);
    }

    #[test]
    fn fullness_aversion_score_never_negative() {
        let mut place = Place::new("jammed")
            .with_capacity(1)
            .with_fullness_aversion_factor(1.0);
        let agents = crowd(&mut place, 5);
        assert_eq!(place.fullness_aversion_score(&agents), 0.0);
        assert_eq!(place.hazard(&agents), 1.0);
    }

    #[test]
    fn capacity_counts_live_agents_only() {
        let mut place = Place::new("cabin").with_capacity(2);
        let mut agents = crowd(&mut place, 2);
        assert!(!place.has_capacity(&agents));
        agents[1].die();
        assert!(place.has_capacity(&agents));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(Place::new("a").with_capacity(0).validate().is_err());
        assert!(Place::new("b").with_desirability(1.5).validate().is_err());
        assert!(Place::new("c")
            .with_fullness_aversion_factor(-0.1)
            .validate()
            .is_err());
        assert!(Place::new("d").validate().is_ok());
    }

    #[test]
    fn evolve_spreads_from_infectious_agent() {
        let mut place = Place::new("hall")
            .with_capacity(2)
            .with_fullness_aversion_factor(1.0);
        let mut agents = crowd(&mut place, 3);
        agents[0].infect();
        agents[0].set_infectiousness(1.0);

        let infections = place.evolve(&mut agents, &DiseaseParameters::default());
        assert_eq!(infections, 2);
        assert!(agents.iter().all(Agent::is_infected));
    }

    #[test]
    fn evolve_without_infectious_agents_is_quiet() {
        let mut place = Place::new("hall").with_fullness_aversion_factor(1.0);
        let mut agents = crowd(&mut place, 4);
        let infections = place.evolve(&mut agents, &DiseaseParameters::default());
        assert_eq!(infections, 0);
        assert!(agents.iter().all(|agent| !agent.is_infected()));
    }

    #[test]
    fn cured_agent_can_reinfect_itself() {
        let mut place = Place::new("cell")
            .with_capacity(1)
            .with_fullness_aversion_factor(1.0);
        let mut agents = vec![Agent::new("loner").with_resistance(0.1)];
        place.insert_agent(AgentId(0));

        let disease = DiseaseParameters::default();
        let mut never_dies = || 0.99;
        agents[0].infect();
        for _ in 0..11 {
            agents[0].evolve(&disease, &mut never_dies);
        }
        assert!(!agents[0].is_infected());

        // 1.0 * 1.0 * 0.05 > 0.1 * 0.11
        assert_eq!(place.evolve(&mut agents, &disease), 1);
        assert!(agents[0].is_infected());
        assert_eq!(agents[0].days_since_infection(), Some(0));
    }

    #[test]
    fn empty_place_has_no_hazard() {
        let place = Place::new("void");
        assert_eq!(place.hazard(&[]), 0.0);
    }
}
