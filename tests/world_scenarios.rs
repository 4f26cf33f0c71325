use std::io::Write;

use epiroam::{
    Agent, AgentId, CensusReport, CensusRow, DiseaseParameters, EpiError, InfectionStatus, Place,
    PlaceId, Statistic, World, WorldParameters,
};
use tempfile::{tempdir, NamedTempFile};

fn seeded(seed: u64) -> WorldParameters {
    WorldParameters {
        seed,
        ..WorldParameters::default()
    }
}

fn without_mortality() -> WorldParameters {
    WorldParameters {
        disease: DiseaseParameters {
            mortality_rate: 0.0,
            ..DiseaseParameters::default()
        },
        ..WorldParameters::default()
    }
}

/// Three places in a line, a - b - c.
fn corridor(world: &mut World) {
    world
        .add_place(vec![
            Place::new("a"),
            Place::new("b").with_neighbors([PlaceId::new(0)]),
            Place::new("c").with_neighbors([PlaceId::new(1)]),
        ])
        .unwrap();
}

#[test]
fn emergence_infects_exactly_one_agent() {
    for seed in 0..10 {
        let parameters = WorldParameters {
            n_agents: 10,
            ..seeded(seed)
        };
        let world = World::randomized(&parameters).unwrap();
        let infected: Vec<&Agent> = world
            .agents()
            .iter()
            .filter(|agent| agent.is_infected())
            .collect();
        assert_eq!(infected.len(), 1);
        assert_eq!(infected[0].days_since_infection(), Some(0));
    }
}

#[test]
fn second_agent_does_not_fit_a_single_bed() {
    let mut world = World::new(&WorldParameters::default()).unwrap();
    world.add_place(Place::new("bed").with_capacity(1)).unwrap();
    world.add_agent(Agent::new("first")).unwrap();

    let result = world.add_agent(Agent::new("second"));
    assert!(matches!(result, Err(EpiError::PlacementExhausted { .. })));
    assert_eq!(world.agents().len(), 1);
    assert_eq!(world.census().get(Statistic::Population, "bed"), Some(1));
}

#[test]
fn agents_that_always_stay_never_move() {
    let mut world = World::new(&seeded(9)).unwrap();
    corridor(&mut world);
    let ids = world
        .add_agent(
            (0..6)
                .map(|i| Agent::new(i.to_string()).with_p_move(1.0).at_place(PlaceId::new(i % 3)))
                .collect::<Vec<_>>(),
        )
        .unwrap();

    for _ in 0..20 {
        assert_eq!(world.evolve().moves, 0);
    }
    for (i, agent_id) in ids.into_iter().enumerate() {
        assert_eq!(world.holder_of(agent_id), Some(PlaceId::new(i % 3)));
    }
}

#[test]
fn movement_follows_the_graph() {
    let mut world = World::new(&seeded(4)).unwrap();
    corridor(&mut world);
    let walker = world
        .add_agent(Agent::new("walker").with_p_move(0.0).at_place(PlaceId::new(0)))
        .unwrap()[0];

    let mut previous = PlaceId::new(0);
    for _ in 0..50 {
        world.evolve();
        let current = world.holder_of(walker).unwrap();
        if current != previous {
            assert!(world
                .place(previous)
                .unwrap()
                .neighbors()
                .contains(&current));
        }
        previous = current;
    }
}

#[test]
fn graph_stays_symmetric_and_placement_exclusive() {
    for seed in 0..5 {
        let mut world = World::randomized(&seeded(seed)).unwrap();
        for _ in 0..20 {
            world.evolve();
            assert!(world.graph().is_symmetric());
            assert!(world.graph().matches(world.places()));
            for index in 0..world.agents().len() {
                let agent_id = AgentId::new(index);
                let holders = world
                    .places()
                    .iter()
                    .filter(|place| place.contains(agent_id))
                    .count();
                assert_eq!(holders, 1);
                assert_eq!(
                    world.agent(agent_id).unwrap().location(),
                    world.holder_of(agent_id)
                );
            }
        }
    }
}

#[test]
fn regraph_is_idempotent_on_a_random_world() {
    let mut world = World::randomized(&seeded(2)).unwrap();
    let graph = world.graph().clone();
    let places = world.places().to_vec();
    world.regraph().unwrap();
    assert_eq!(world.graph(), &graph);
    assert_eq!(world.places(), places.as_slice());
}

#[test]
fn census_is_conserved_every_step() {
    let mut world = World::randomized(&seeded(17)).unwrap();
    for census in world.run(40) {
        for (_, counts) in census.iter() {
            assert_eq!(counts.susceptible + counts.immune, counts.population);
            assert_eq!(counts.cured, counts.immune as i64 - counts.infected as i64);
        }
    }
}

#[test]
fn death_is_terminal() {
    let parameters = WorldParameters {
        disease: DiseaseParameters {
            mortality_rate: 1.0,
            ..DiseaseParameters::default()
        },
        ..WorldParameters::default()
    };
    let mut world = World::new(&parameters).unwrap();
    corridor(&mut world);
    let ids = world
        .add_agent(vec![
            Agent::new("patient").with_p_move(1.0).at_place(PlaceId::new(1)),
            Agent::new("visitor").with_p_move(1.0).at_place(PlaceId::new(1)),
        ])
        .unwrap();
    world.seed_infection(ids[0]).unwrap();

    let summary = world.evolve();
    assert_eq!(summary.deaths, 1);
    assert_eq!(
        world.agent(ids[0]).unwrap().status(),
        InfectionStatus::Dead
    );

    for _ in 0..10 {
        world.evolve();
        let patient = world.agent(ids[0]).unwrap();
        assert!(!patient.is_alive());
        assert!(!patient.is_infected());
        assert_eq!(patient.immunity(), 0.0);
        assert_eq!(world.holder_of(ids[0]), Some(PlaceId::new(1)));
    }
    // The dead are not counted and never infected anyone.
    assert_eq!(world.census().get(Statistic::Population, "b"), Some(1));
    assert!(!world.agent(ids[1]).unwrap().is_infected());
}

#[test]
fn lone_patient_is_cured_on_day_eleven() {
    let mut world = World::new(&without_mortality()).unwrap();
    world.add_place(Place::new("home")).unwrap();
    let patient = world.add_agent(Agent::new("patient")).unwrap()[0];
    world.seed_infection(patient).unwrap();

    let history = world.run(11);
    for census in &history[..10] {
        assert_eq!(census.get(Statistic::Infected, "home"), Some(1));
    }
    let last = &history[10];
    assert_eq!(last.step(), 11);
    assert_eq!(last.get(Statistic::Infected, "home"), Some(0));
    assert_eq!(last.get(Statistic::Immune, "home"), Some(1));
    assert_eq!(last.get(Statistic::Cured, "home"), Some(1));
    assert_eq!(
        world.agent(patient).unwrap().status(),
        InfectionStatus::Immune
    );
}

#[test]
fn same_seed_reproduces_the_run() {
    let parameters = WorldParameters {
        n_places: 15,
        n_agents: 40,
        ..seeded(1234)
    };
    let mut first = World::randomized(&parameters).unwrap();
    let mut second = World::randomized(&parameters).unwrap();
    assert_eq!(first.places(), second.places());
    assert_eq!(first.run(30), second.run(30));
    assert_eq!(first.agents(), second.agents());
}

#[test]
fn world_from_json_parameters() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "n_places": 4,
            "n_agents": 8,
            "seed": 99,
            "disease": {{ "mortality_rate": 0.0 }}
        }}"#
    )
    .unwrap();

    let parameters = WorldParameters::from_json_file(file.path()).unwrap();
    let world = World::randomized(&parameters).unwrap();
    assert_eq!(world.places().len(), 4);
    assert_eq!(world.agents().len(), 8);
    assert_eq!(world.seed(), 99);
    assert_eq!(world.disease().mortality_rate, 0.0);
}

#[test]
fn report_records_a_run() {
    let temp_dir = tempdir().unwrap();
    let file_path = temp_dir.path().join("out").join("census.csv");
    let mut world = World::randomized(&seeded(8)).unwrap();
    let mut report = CensusReport::create(&file_path).unwrap();
    for census in world.run(5) {
        report.record(&census).unwrap();
    }

    let mut reader = csv::Reader::from_path(&file_path).unwrap();
    let rows: Vec<CensusRow> = reader.deserialize().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 5 * world.places().len());
    let alive = world.agents().iter().filter(|agent| agent.is_alive()).count();
    let final_population: usize = rows
        .iter()
        .filter(|row| row.step == 5)
        .map(|row| row.population)
        .sum();
    assert_eq!(final_population, alive);
}
