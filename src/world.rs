//! The `World` owns every place and agent and drives the simulation.
//!
//! A step ([`World::evolve`]) runs three phases over the full collections, in
//! order:
//!
//! 1. **Movement.** Each agent, in insertion order, picks a destination and
//!    is moved there immediately. Agents later in the order see the moves of
//!    earlier ones (sequential, not simultaneous, update).
//! 2. **Contact.** Each place runs its contact loop on its post-movement
//!    occupancy.
//! 3. **Progression.** Each agent advances its infection state.
//!
//! Places own agent membership. The agent's `location` mirrors it and is
//! only written when the world relocates the agent, so the two never disagree.

use log::{debug, info, trace, warn};

use crate::agent::{Agent, AgentId, Transition};
use crate::census::Census;
use crate::define_rng;
use crate::error::EpiError;
use crate::hashing::HashMap;
use crate::network::PlaceGraph;
use crate::parameters::{DiseaseParameters, WorldParameters};
use crate::place::{Place, PlaceId};
use crate::random::RngStore;

define_rng!(GenerationRng);
define_rng!(PlacementRng);
define_rng!(EmergenceRng);
define_rng!(MovementRng);
define_rng!(MortalityRng);

/// What can be handed to [`World::add_place`] and [`World::add_agent`]: one
/// item or a list of them.
#[derive(Debug, Clone)]
pub enum Entry {
    Place(Place),
    Places(Vec<Place>),
    Agent(Agent),
    Agents(Vec<Agent>),
}

impl From<Place> for Entry {
    fn from(place: Place) -> Self {
        Entry::Place(place)
    }
}

impl From<Vec<Place>> for Entry {
    fn from(places: Vec<Place>) -> Self {
        Entry::Places(places)
    }
}

impl From<Agent> for Entry {
    fn from(agent: Agent) -> Self {
        Entry::Agent(agent)
    }
}

impl From<Vec<Agent>> for Entry {
    fn from(agents: Vec<Agent>) -> Self {
        Entry::Agents(agents)
    }
}

/// Counts of what happened during one call to [`World::evolve`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub step: usize,
    pub moves: usize,
    pub infections: usize,
    pub deaths: usize,
    pub cures: usize,
}

pub struct World {
    places: Vec<Place>,
    agents: Vec<Agent>,
    graph: PlaceGraph,
    place_names: HashMap<String, PlaceId>,
    agent_names: HashMap<String, AgentId>,
    disease: DiseaseParameters,
    rng: RngStore,
    step: usize,
}

impl World {
    /// An empty world that will run with the disease constants and seed in
    /// `parameters`. The generation settings are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::InvalidParameter`] if the parameters fail validation.
    pub fn new(parameters: &WorldParameters) -> Result<World, EpiError> {
        parameters.validate()?;
        Ok(World {
            places: Vec::new(),
            agents: Vec::new(),
            graph: PlaceGraph::new(),
            place_names: HashMap::default(),
            agent_names: HashMap::default(),
            disease: parameters.disease,
            rng: RngStore::new(parameters.seed),
            step: 0,
        })
    }

    /// Builds a random world: `n_places` places with random capacity,
    /// desirability and fullness aversion, a sparse random graph, `n_agents`
    /// agents with random movement propensity and resistance, every agent
    /// placed, and one agent infected.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::PlacementExhausted`] if the random capacities
    /// cannot hold every agent, or [`EpiError::InvalidParameter`] for invalid
    /// parameters.
    pub fn randomized(parameters: &WorldParameters) -> Result<World, EpiError> {
        let mut world = World::new(parameters)?;

        for index in 0..parameters.n_places {
            let place = Place::new(index.to_string())
                .with_capacity(
                    world
                        .rng
                        .sample_range::<GenerationRng, _, _>(parameters.capacity_range.clone()),
                )
                .with_desirability(world.rng.sample_uniform::<GenerationRng>())
                .with_fullness_aversion_factor(world.rng.sample_uniform::<GenerationRng>());
            world.register_place(place)?;
        }
        world.generate_edges(parameters);
        world.regraph()?;

        for index in 0..parameters.n_agents {
            let agent = Agent::new(index.to_string())
                .with_p_move(world.rng.sample_uniform::<GenerationRng>())
                .with_resistance(world.rng.sample_uniform::<GenerationRng>());
            world.add_one_agent(agent)?;
        }

        if !world.agents.is_empty() {
            let patient_zero = AgentId(
                world
                    .rng
                    .sample_range::<EmergenceRng, _, _>(0..world.agents.len()),
            );
            world.seed_infection(patient_zero)?;
        }

        info!(
            "built random world: {} places, {} edges, {} agents, seed {}",
            world.places.len(),
            world.graph.edge_count(),
            world.agents.len(),
            world.rng.base_seed()
        );
        Ok(world)
    }

    /// Declares random edges: each place asks for a number of connections in
    /// `connections_range`, minus those other places already declared towards
    /// it, drawn without replacement from the other places.
    fn generate_edges(&mut self, parameters: &WorldParameters) {
        let place_count = self.places.len();
        for index in 0..place_count {
            let place_id = PlaceId(index);
            let requested: usize = self
                .rng
                .sample_range::<GenerationRng, _, _>(parameters.connections_range.clone());
            let existing = self
                .places
                .iter()
                .filter(|other| other.declares(place_id))
                .count();
            if requested <= existing {
                continue;
            }

            let others = self
                .rng
                .sample_without_replacement::<GenerationRng>(place_count - 1, requested - existing);
            // Skip over the place itself.
            for other in others {
                let neighbor = PlaceId(if other >= index { other + 1 } else { other });
                self.places[index].insert_neighbor(neighbor);
            }
        }
        trace!("declared random edges for {place_count} places");
    }

    /// Adds one place or a list of places, linking each into the graph as it
    /// arrives. Returns the new ids.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::NotAPlace`] for an `Entry` holding agents,
    /// [`EpiError::DuplicateName`], [`EpiError::UnknownPlace`] for a declared
    /// neighbor that does not exist, or [`EpiError::InvalidParameter`]. Places
    /// of a list added before the failing one stay in the world.
    pub fn add_place(&mut self, entry: impl Into<Entry>) -> Result<Vec<PlaceId>, EpiError> {
        match entry.into() {
            Entry::Place(place) => Ok(vec![self.add_one_place(place)?]),
            Entry::Places(places) => places
                .into_iter()
                .map(|place| self.add_one_place(place))
                .collect(),
            Entry::Agent(_) | Entry::Agents(_) => Err(EpiError::NotAPlace),
        }
    }

    /// Adds one agent or a list of agents. Each is placed at its requested
    /// place if it has one, otherwise at a random place with capacity.
    /// Returns the new ids.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::NotAnAgent`] for an `Entry` holding places,
    /// [`EpiError::PlacementExhausted`] when no place has room (the agent is
    /// not kept), [`EpiError::DuplicateName`], [`EpiError::UnknownPlace`] or
    /// [`EpiError::InvalidParameter`]. Agents of a list added before the
    /// failing one stay in the world.
    pub fn add_agent(&mut self, entry: impl Into<Entry>) -> Result<Vec<AgentId>, EpiError> {
        match entry.into() {
            Entry::Agent(agent) => Ok(vec![self.add_one_agent(agent)?]),
            Entry::Agents(agents) => agents
                .into_iter()
                .map(|agent| self.add_one_agent(agent))
                .collect(),
            Entry::Place(_) | Entry::Places(_) => Err(EpiError::NotAnAgent),
        }
    }

    fn register_place(&mut self, place: Place) -> Result<PlaceId, EpiError> {
        place.validate()?;
        if self.place_names.contains_key(place.name()) {
            return Err(EpiError::DuplicateName(place.name().to_string()));
        }
        let place_id = PlaceId(self.places.len());
        self.place_names.insert(place.name().to_string(), place_id);
        self.places.push(place);
        Ok(place_id)
    }

    fn add_one_place(&mut self, place: Place) -> Result<PlaceId, EpiError> {
        // Declared neighbors may only name existing places or the new one.
        if let Some(&unknown) = place
            .neighbors()
            .iter()
            .find(|neighbor| neighbor.0 > self.places.len())
        {
            return Err(EpiError::UnknownPlace(unknown));
        }
        let place_id = self.register_place(place)?;
        self.graph.insert_place(&mut self.places, place_id)?;
        debug!(
            "added place {} with {} neighbors",
            self.places[place_id.0].name(),
            self.graph.degree(place_id)
        );
        Ok(place_id)
    }

    fn add_one_agent(&mut self, agent: Agent) -> Result<AgentId, EpiError> {
        agent.validate()?;
        if self.agent_names.contains_key(agent.name()) {
            return Err(EpiError::DuplicateName(agent.name().to_string()));
        }
        let requested_place = agent.requested_place();
        if let Some(place_id) = requested_place {
            self.check_place(place_id)?;
        }

        let agent_id = AgentId(self.agents.len());
        self.agent_names.insert(agent.name().to_string(), agent_id);
        self.agents.push(agent);

        if let Err(error) = self.assign_initial_place(agent_id, requested_place) {
            self.agents.pop();
            self.agent_names.retain(|_, id| *id != agent_id);
            return Err(error);
        }
        Ok(agent_id)
    }

    /// Puts an agent somewhere for the first time.
    ///
    /// Does nothing if the agent is already present in a place. With a
    /// `destination` the agent goes there regardless of capacity; otherwise
    /// places are tried in a random order and the first with capacity wins.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::PlacementExhausted`] if no `destination` was given
    /// and no place has capacity, or [`EpiError::UnknownAgent`] /
    /// [`EpiError::UnknownPlace`] for ids that do not exist.
    pub fn assign_initial_place(
        &mut self,
        agent_id: AgentId,
        destination: Option<PlaceId>,
    ) -> Result<(), EpiError> {
        self.check_agent(agent_id)?;
        if let Some(holder) = self.holder_of(agent_id) {
            trace!(
                "{} is already at {}; leaving it there",
                self.agents[agent_id.0].name(),
                self.places[holder.0].name()
            );
            return Ok(());
        }

        let destination = match destination {
            Some(place_id) => {
                self.check_place(place_id)?;
                place_id
            }
            None => {
                let order = self
                    .rng
                    .sample_permutation::<PlacementRng>(self.places.len());
                let agents = &self.agents;
                match order
                    .into_iter()
                    .map(PlaceId)
                    .find(|place_id| self.places[place_id.0].has_capacity(agents))
                {
                    Some(place_id) => place_id,
                    None => {
                        let name = self.agents[agent_id.0].name().to_string();
                        warn!("no place has capacity for agent {name}");
                        return Err(EpiError::PlacementExhausted { agent: name });
                    }
                }
            }
        };
        self.relocate(agent_id, destination);
        Ok(())
    }

    /// Moves an agent to `destination`, removing it from wherever it was. Does
    /// not check capacity.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::UnknownAgent`] or [`EpiError::UnknownPlace`] for ids
    /// that do not exist.
    pub fn move_to(&mut self, agent_id: AgentId, destination: PlaceId) -> Result<(), EpiError> {
        self.check_agent(agent_id)?;
        self.check_place(destination)?;
        self.relocate(agent_id, destination);
        Ok(())
    }

    fn relocate(&mut self, agent_id: AgentId, destination: PlaceId) {
        relocate(&mut self.places, &mut self.agents, agent_id, destination);
    }

    /// Forces an agent into the infected state, as at emergence.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::UnknownAgent`] if the agent does not exist, or an
    /// error if it is dead.
    pub fn seed_infection(&mut self, agent_id: AgentId) -> Result<(), EpiError> {
        self.check_agent(agent_id)?;
        let agent = &mut self.agents[agent_id.0];
        if !agent.is_alive() {
            return Err(EpiError::EpiError(format!(
                "cannot infect dead agent {}",
                agent.name()
            )));
        }
        agent.infect();
        info!("seeded infection in agent {}", agent.name());
        Ok(())
    }

    /// Rebuilds the symmetric place graph from every place's neighbor list.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::UnknownPlace`] if a place lists a neighbor that does
    /// not exist.
    pub fn regraph(&mut self) -> Result<(), EpiError> {
        self.graph.regraph(&mut self.places)
    }

    /// Adds the undirected edge `a`–`b`. Returns false if it already existed.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` for unknown places or `a == b`.
    pub fn connect(&mut self, a: PlaceId, b: PlaceId) -> Result<bool, EpiError> {
        self.graph.connect(&mut self.places, a, b)
    }

    /// Advances the simulation one step: movement, then contact in every
    /// place, then infection progression for every agent.
    pub fn evolve(&mut self) -> StepSummary {
        self.step += 1;
        let mut summary = StepSummary {
            step: self.step,
            ..StepSummary::default()
        };

        {
            let mut uniform = self.rng.uniform_source::<MovementRng>();
            summary.moves = move_agents(&mut self.places, &mut self.agents, &mut uniform);
        }

        for place in &self.places {
            summary.infections += place.evolve(&mut self.agents, &self.disease);
        }

        {
            let mut uniform = self.rng.uniform_source::<MortalityRng>();
            for agent in &mut self.agents {
                match agent.evolve(&self.disease, &mut uniform) {
                    Transition::Died => summary.deaths += 1,
                    Transition::Cured => summary.cures += 1,
                    Transition::Unchanged => {}
                }
            }
        }

        #[cfg(debug_assertions)]
        self.debug_assert_invariants();

        debug!(
            "step {}: {} moves, {} infections, {} deaths, {} cures",
            summary.step, summary.moves, summary.infections, summary.deaths, summary.cures
        );
        summary
    }

    /// Runs `steps` steps and returns the census taken after each one.
    pub fn run(&mut self, steps: usize) -> Vec<Census> {
        (0..steps)
            .map(|_| {
                self.evolve();
                self.census()
            })
            .collect()
    }

    #[must_use]
    pub fn census(&self) -> Census {
        Census::tabulate(self.step, &self.places, &self.agents)
    }

    /// The place whose membership set contains the agent.
    #[must_use]
    pub fn holder_of(&self, agent_id: AgentId) -> Option<PlaceId> {
        self.places
            .iter()
            .position(|place| place.contains(agent_id))
            .map(PlaceId)
    }

    #[must_use]
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn place(&self, place_id: PlaceId) -> Option<&Place> {
        self.places.get(place_id.0)
    }

    #[must_use]
    pub fn agent(&self, agent_id: AgentId) -> Option<&Agent> {
        self.agents.get(agent_id.0)
    }

    #[must_use]
    pub fn place_id(&self, name: &str) -> Option<PlaceId> {
        self.place_names.get(name).copied()
    }

    #[must_use]
    pub fn agent_id(&self, name: &str) -> Option<AgentId> {
        self.agent_names.get(name).copied()
    }

    #[must_use]
    pub fn graph(&self) -> &PlaceGraph {
        &self.graph
    }

    #[must_use]
    pub fn disease(&self) -> &DiseaseParameters {
        &self.disease
    }

    /// Number of completed steps.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.rng.base_seed()
    }

    fn check_place(&self, place_id: PlaceId) -> Result<(), EpiError> {
        if place_id.0 < self.places.len() {
            Ok(())
        } else {
            Err(EpiError::UnknownPlace(place_id))
        }
    }

    fn check_agent(&self, agent_id: AgentId) -> Result<(), EpiError> {
        if agent_id.0 < self.agents.len() {
            Ok(())
        } else {
            Err(EpiError::UnknownAgent(agent_id))
        }
    }

    #[cfg(debug_assertions)]
    fn debug_assert_invariants(&self) {
        debug_assert!(self.graph.is_symmetric(), "place graph is not symmetric");
        debug_assert!(
            self.graph.matches(&self.places),
            "place neighbor lists disagree with the graph"
        );
        for (index, agent) in self.agents.iter().enumerate() {
            let holders = self
                .places
                .iter()
                .filter(|place| place.contains(AgentId(index)))
                .count();
            debug_assert!(holders <= 1, "{} is in {holders} places", agent.name());
            debug_assert_eq!(
                agent.location(),
                self.holder_of(AgentId(index)),
                "location of {} disagrees with place membership",
                agent.name()
            );
        }
    }
}

/// Removes the agent from every place, then puts it in `destination`.
fn relocate(places: &mut [Place], agents: &mut [Agent], agent_id: AgentId, destination: PlaceId) {
    for place in places.iter_mut() {
        place.remove_agent(agent_id);
    }
    agents[agent_id.0].set_location(Some(destination));
    places[destination.0].insert_agent(agent_id);
}

/// The movement phase. Agents choose in insertion order, each against the occupancy left by the
/// moves before it, and move at once. Returns the number of moves.
fn move_agents(
    places: &mut [Place],
    agents: &mut [Agent],
    uniform: &mut impl FnMut() -> f64,
) -> usize {
    let mut moves = 0;
    for index in 0..agents.len() {
        let agent = &agents[index];
        let Some(destination) = agent.next_destination(places, agents, &mut *uniform) else {
            continue;
        };
        if agent.location() == Some(destination) {
            continue;
        }
        trace!("{} moves to {}", agent.name(), places[destination.0].name());
        relocate(places, agents, AgentId(index), destination);
        moves += 1;
    }
    moves
}
