//! Per-place population and infection counts.
//!
//! A [`Census`] is a table of [`Statistic`] × place name. It only counts live
//! agents: the dead are neither population, infected nor immune.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::agent::Agent;
use crate::place::Place;

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Statistic {
    Population,
    Infected,
    Immune,
    Susceptible,
    Cured,
}

/// Counts for one place.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCensus {
    pub population: usize,
    pub infected: usize,
    pub immune: usize,
    /// `population - immune`
    pub susceptible: usize,
    /// `immune - infected`. Negative while freshly infected agents have not
    /// yet built any immunity.
    pub cured: i64,
}

impl PlaceCensus {
    #[must_use]
    pub fn tally<'a>(agents: impl IntoIterator<Item = &'a Agent>) -> Self {
        let mut population = 0;
        let mut infected = 0;
        let mut immune = 0;
        for agent in agents.into_iter().filter(|agent| agent.is_alive()) {
            population += 1;
            if agent.is_infected() {
                infected += 1;
            }
            if agent.immunity() > 0.0 {
                immune += 1;
            }
        }
        PlaceCensus {
            population,
            infected,
            immune,
            susceptible: population - immune,
            cured: immune as i64 - infected as i64,
        }
    }

    #[must_use]
    pub fn get(&self, statistic: Statistic) -> i64 {
        match statistic {
            Statistic::Population => self.population as i64,
            Statistic::Infected => self.infected as i64,
            Statistic::Immune => self.immune as i64,
            Statistic::Susceptible => self.susceptible as i64,
            Statistic::Cured => self.cured,
        }
    }

    fn accumulate(&mut self, other: &PlaceCensus) {
        self.population += other.population;
        self.infected += other.infected;
        self.immune += other.immune;
        self.susceptible += other.susceptible;
        self.cured += other.cured;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Census {
    step: usize,
    places: IndexMap<String, PlaceCensus>,
}

impl Census {
    /// Counts every place, in place order.
    #[must_use]
    pub fn tabulate(step: usize, places: &[Place], agents: &[Agent]) -> Self {
        let places = places
            .iter()
            .map(|place| {
                let present = place.agents().iter().map(|agent_id| &agents[agent_id.index()]);
                (place.name().to_string(), PlaceCensus::tally(present))
            })
            .collect();
        Census { step, places }
    }

    /// The step after which this census was taken.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Looks up one cell of the table.
    #[must_use]
    pub fn get(&self, statistic: Statistic, place: &str) -> Option<i64> {
        self.places.get(place).map(|counts| counts.get(statistic))
    }

    #[must_use]
    pub fn place(&self, place: &str) -> Option<&PlaceCensus> {
        self.places.get(place)
    }

    /// One row of the table: the given statistic for every place.
    pub fn statistic(&self, statistic: Statistic) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.places
            .iter()
            .map(move |(name, counts)| (name.as_str(), counts.get(statistic)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlaceCensus)> + '_ {
        self.places.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    /// Sums over all places.
    #[must_use]
    pub fn total(&self) -> PlaceCensus {
        let mut total = PlaceCensus::default();
        for counts in self.places.values() {
            total.accumulate(counts);
        }
        total
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}
