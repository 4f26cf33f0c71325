//! Agents: mobile entities carrying an infection state.
//!
//! The infection state machine runs once per step, after contacts have been
//! resolved by the places:
//!
//! ```text
//!   Susceptible --contact--> Infected --immunity > threshold--> Immune (cured)
//!                               |                                  |
//!                               +--mortality--> Dead               +--contact--> Infected
//! ```
//!
//! `Immune` is a susceptible agent whose immunity is above zero. `Dead` is
//! terminal.

use std::fmt::{self, Display};

use log::trace;
use serde::{Deserialize, Serialize};
use strum::Display as StrumDisplay;

use crate::error::EpiError;
use crate::parameters::{check_unit_interval, DiseaseParameters};
use crate::place::{Place, PlaceId};

pub const DEFAULT_P_MOVE: f64 = 0.2;
pub const DEFAULT_RESISTANCE: f64 = 1.0;

/// Index of an agent within its [`World`](crate::world::World).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub(crate) usize);

impl AgentId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        AgentId(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "agent {}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum InfectionStatus {
    Susceptible,
    Infected,
    /// Not infected, with immunity left over from a past infection.
    Immune,
    Dead,
}

/// What the target of a contact needs to know about its source.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    pub alive: bool,
    pub infectiousness: f64,
}

/// The outcome of [`Agent::evolve`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Died,
    Cured,
}

/// Immunity after `days` days since infection, following
/// `1 - (days_of_immunity - days) / days_of_immunity`. Not clamped: it keeps
/// growing past 1 once `days` exceeds the immunity window.
#[must_use]
pub fn immunity_after(days_since_infection: Option<u32>, days_of_immunity: u32) -> f64 {
    match days_since_infection {
        Some(days) => {
            let window = f64::from(days_of_immunity);
            1.0 - (window - f64::from(days)) / window
        }
        None => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    name: String,
    location: Option<PlaceId>,
    requested_place: Option<PlaceId>,
    p_move: f64,
    resistance: f64,
    alive: bool,
    infected: bool,
    days_since_infection: Option<u32>,
    infectiousness: f64,
    immunity: f64,
}

impl Agent {
    /// A susceptible, unplaced agent with the default movement propensity and
    /// resistance.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Agent {
            name: name.into(),
            location: None,
            requested_place: None,
            p_move: DEFAULT_P_MOVE,
            resistance: DEFAULT_RESISTANCE,
            alive: true,
            infected: false,
            days_since_infection: None,
            infectiousness: 0.0,
            immunity: 0.0,
        }
    }

    /// Movement propensity. Note the reading: a draw at or below `p_move`
    /// keeps the agent where it is, so `1.0` never moves.
    #[must_use]
    pub fn with_p_move(mut self, p_move: f64) -> Self {
        self.p_move = p_move;
        self
    }

    #[must_use]
    pub fn with_resistance(mut self, resistance: f64) -> Self {
        self.resistance = resistance;
        self
    }

    /// Asks the world to place this agent at `place` when it is added,
    /// bypassing the capacity check.
    #[must_use]
    pub fn at_place(mut self, place: PlaceId) -> Self {
        self.requested_place = Some(place);
        self
    }

    /// # Errors
    ///
    /// Returns [`EpiError::InvalidParameter`] if `p_move` or the resistance lie
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), EpiError> {
        check_unit_interval("p_move", self.p_move)?;
        check_unit_interval("resistance", self.resistance)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The place this agent was last moved to. Mirrors the owning place's
    /// membership set; only the world writes it.
    #[must_use]
    pub fn location(&self) -> Option<PlaceId> {
        self.location
    }

    #[must_use]
    pub fn requested_place(&self) -> Option<PlaceId> {
        self.requested_place
    }

    #[must_use]
    pub fn p_move(&self) -> f64 {
        self.p_move
    }

    #[must_use]
    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub fn is_infected(&self) -> bool {
        self.infected
    }

    #[must_use]
    pub fn days_since_infection(&self) -> Option<u32> {
        self.days_since_infection
    }

    #[must_use]
    pub fn infectiousness(&self) -> f64 {
        self.infectiousness
    }

    #[must_use]
    pub fn immunity(&self) -> f64 {
        self.immunity
    }

    #[must_use]
    pub fn status(&self) -> InfectionStatus {
        if !self.alive {
            InfectionStatus::Dead
        } else if self.infected {
            InfectionStatus::Infected
        } else if self.immunity > 0.0 {
            InfectionStatus::Immune
        } else {
            InfectionStatus::Susceptible
        }
    }

    #[must_use]
    pub fn as_contact(&self) -> Contact {
        Contact {
            alive: self.alive,
            infectiousness: self.infectiousness,
        }
    }

    /// Picks where this agent goes next.
    ///
    /// Draws `r = uniform()`; at or below `p_move` the agent stays. Otherwise the
    /// current place and each neighbor are scored as
    /// `desirability * fullness_aversion_score * uniform()`, in that order, and a
    /// candidate only displaces the best so far by scoring strictly higher.
    ///
    /// Returns `None` for an agent that has not been placed. Dead agents stay
    /// put without drawing.
    pub fn next_destination(
        &self,
        places: &[Place],
        agents: &[Agent],
        uniform: &mut impl FnMut() -> f64,
    ) -> Option<PlaceId> {
        let current = self.location?;
        if !self.alive || uniform() <= self.p_move {
            return Some(current);
        }

        let place = &places[current.0];
        let mut destination = current;
        let mut best_score = place.attractiveness(agents) * uniform();
        for &neighbor in place.neighbors() {
            let score = places[neighbor.0].attractiveness(agents) * uniform();
            if score > best_score {
                best_score = score;
                destination = neighbor;
            }
        }
        Some(destination)
    }

    /// Exposes this agent to `contra` at a place with the given hazard.
    /// Returns true if the contact infected this agent.
    ///
    /// Only live, currently uninfected agents can be infected, and only by a
    /// live source. Infection happens when
    /// `infectiousness * hazard * base_infectiousness > resistance * immunity`.
    pub fn contact(&mut self, contra: Contact, hazard: f64, disease: &DiseaseParameters) -> bool {
        if !self.alive || !contra.alive || self.infected {
            return false;
        }
        let pressure = contra.infectiousness * hazard * disease.base_infectiousness;
        if pressure > self.resistance * self.immunity {
            self.infect();
            true
        } else {
            false
        }
    }

    /// Advances this agent's infection by one step: mortality, then
    /// progression, then cure.
    pub fn evolve(
        &mut self,
        disease: &DiseaseParameters,
        uniform: &mut impl FnMut() -> f64,
    ) -> Transition {
        if !self.alive {
            return Transition::Unchanged;
        }

        if self.infected && uniform() < disease.mortality_rate {
            trace!("{} died after {:?} days", self.name, self.days_since_infection);
            self.die();
            return Transition::Died;
        }

        if let Some(days) = self.days_since_infection.as_mut() {
            self.infectiousness = 1.0;
            *days += 1;
        }
        self.immunity = immunity_after(self.days_since_infection, disease.days_of_immunity);

        if self.infected && self.immunity > disease.cure_threshold {
            trace!("{} cured with immunity {:.2}", self.name, self.immunity);
            self.infected = false;
            return Transition::Cured;
        }
        Transition::Unchanged
    }

    pub(crate) fn infect(&mut self) {
        self.infected = true;
        self.days_since_infection = Some(0);
    }

    pub(crate) fn die(&mut self) {
        self.alive = false;
        self.infected = false;
        self.immunity = 0.0;
        self.infectiousness = 0.0;
        self.p_move = 0.0;
    }

    pub(crate) fn set_location(&mut self, location: Option<PlaceId>) {
        self.location = location;
    }

    #[cfg(test)]
    pub(crate) fn set_infectiousness(&mut self, infectiousness: f64) {
        self.infectiousness = infectiousness;
    }
}
