//! Integration tests for the full simulation.

use sociogen::checkpoint::Checkpoint;
use sociogen::config::Cohort;
use sociogen::person::{Person, PersonParams, Resource, Sex};
use sociogen::population::Population;
use sociogen::{Config, GeneticOptimizer};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn small_config() -> Config {
    let mut config = Config::default();
    config.population.initial_size = 200;
    config
}

#[test]
fn test_full_simulation_cycle() {
    let mut population = Population::new_with_seed(small_config(), 42);

    population.run(200);

    assert_eq!(population.time, 200);
    // everyone left standing really is alive
    assert!(population.people.iter().all(|p| p.alive));
    assert_eq!(population.population(), population.people.len());
}

#[test]
fn test_exact_reproducibility() {
    let config = small_config();
    let mut a = Population::new_with_seed(config.clone(), 777);
    let mut b = Population::new_with_seed(config, 777);

    a.run(100);
    b.run(100);

    assert_eq!(a.population(), b.population());
    for (x, y) in a.people.iter().zip(&b.people) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.age, y.age);
        assert_eq!(x.satisfaction, y.satisfaction);
        assert_eq!(x.food, y.food);
        assert_eq!(x.water, y.water);
        assert_eq!(x.infection, y.infection);
    }
}

#[test]
fn test_different_seeds_diverge() {
    let config = small_config();
    let mut a = Population::new_with_seed(config.clone(), 1);
    let mut b = Population::new_with_seed(config, 2);

    a.run(50);
    b.run(50);

    // identical trajectories from different seeds would be astonishing
    let same = a.population() == b.population()
        && (a.mean_satisfaction() - b.mean_satisfaction()).abs() < 1e-9;
    assert!(!same);
}

#[test]
fn test_checkpoint_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("society.bin");

    let mut population = Population::new_with_seed(small_config(), 555);
    population.run(60);

    let checkpoint = population.create_checkpoint();
    checkpoint.save(&path).unwrap();

    let loaded = Checkpoint::load(&path).unwrap();
    let restored = Population::from_checkpoint(loaded);

    assert_eq!(restored.time, population.time);
    assert_eq!(restored.population(), population.population());
    assert_eq!(restored.seed(), population.seed());
    for (a, b) in restored.people.iter().zip(&population.people) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.satisfaction, b.satisfaction);
    }
}

#[test]
fn test_person_serde_roundtrip() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let person = Person::new(
        42,
        PersonParams {
            age: 33.0,
            sex: Some(Sex::Female),
            infected: true,
            consumption: 1.5,
            work_ability: 0.5,
            ..PersonParams::default()
        },
        &mut rng,
    );

    let encoded = bincode::serialize(&person).unwrap();
    let decoded: Person = bincode::deserialize(&encoded).unwrap();

    assert_eq!(decoded.id, person.id);
    assert_eq!(decoded.sex, person.sex);
    assert_eq!(decoded.age, person.age);
    assert_eq!(decoded.infection, person.infection);
    assert_eq!(decoded.consumption_ratio, person.consumption_ratio);
    assert_eq!(decoded.work_ability, person.work_ability);

    // the copy behaves identically under the same random draws
    let mut original = person;
    let mut copy = decoded;
    original.food = 5.0;
    copy.food = 5.0;
    original.water = 5.0;
    copy.water = 5.0;

    let schedule = sociogen::schedule::Schedule::default();
    let cfg = Config::default().person;
    let mut rng_a = ChaCha8Rng::seed_from_u64(1234);
    let mut rng_b = ChaCha8Rng::seed_from_u64(1234);
    for _ in 0..10 {
        let a = original.run(&schedule, &cfg, &mut rng_a);
        let b = copy.run(&schedule, &cfg, &mut rng_b);
        assert_eq!(a, b);
        assert_eq!(original.satisfaction, copy.satisfaction);
        assert_eq!(original.rested, copy.rested);
        assert_eq!(original.food, copy.food);
    }
}

#[test]
fn test_mixed_sex_society_produces_births() {
    let mut config = small_config();
    // young adults only, frequent mating, no violence
    config.population.initial_age_max = 30.0;
    config.population.initial_infection_chance = 0.0;
    config.actions.action_chance = 1.0;
    config.actions.weights = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
    config.population.cohorts = vec![Cohort {
        frequency: 1.0,
        work_ability: 1.0,
        consumption_need: 1.0,
    }];

    let mut population = Population::new_with_seed(config, 31);
    let before = population.population();
    population.run(5);

    let newborns = population.people.iter().filter(|p| p.age < 0.1).count();
    assert!(
        newborns > 0,
        "no births after 5 all-mating ticks over {} adults",
        before
    );
}

#[test]
fn test_population_cap_respected() {
    let mut config = small_config();
    config.population.initial_size = 50;
    config.population.max_population = 55;
    config.actions.action_chance = 1.0;
    config.actions.weights = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];

    let mut population = Population::new_with_seed(config, 8);
    population.run(20);

    assert!(population.people.len() <= 55);
}

#[test]
fn test_extinction_detection() {
    let mut config = small_config();
    config.population.initial_size = 5;
    // kill-only society
    config.actions.action_chance = 1.0;
    config.actions.weights = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

    let mut population = Population::new_with_seed(config, 3);
    population.run(2000);

    // either extinct or at least heavily reduced; extinction must report
    // a zero fitness when it happens
    if population.is_extinct() {
        assert_eq!(population.fitness(), 0.0);
    }
    assert!(population.population() < 5);
}

#[test]
fn test_optimizer_improves_over_random_start() {
    let mut config = small_config();
    config.population.initial_size = 60;

    let optimizer = GeneticOptimizer::from_config(&config.optimizer);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let mut vectors: Vec<Vec<f32>> = (0..6)
        .map(|i| {
            config
                .allocation
                .genes
                .iter()
                .map(|&g| g * (0.5 + 0.2 * i as f32))
                .collect()
        })
        .collect();

    // two generations of evaluate-and-breed keep the pipeline honest
    for _ in 0..2 {
        let fitness: Vec<f32> = vectors
            .iter()
            .map(|genes| {
                let mut population = Population::new_with_seed(config.clone(), 1234);
                population.set_allocation_genes(genes);
                population.run(30);
                population.fitness()
            })
            .collect();

        vectors = optimizer.optimize(&mut rng, &vectors, &fitness).unwrap();
        assert!(vectors.len() >= 2);
        assert!(vectors.iter().all(|v| v.len() == 8));
    }
}

#[test]
fn test_stats_history_is_recorded() {
    let mut config = small_config();
    config.logging.stats_interval = 10;

    let mut population = Population::new_with_seed(config, 4);
    population.run(100);

    assert!(!population.stats_history.snapshots.is_empty());
    let series = population.stats_history.population_series();
    // recorded on the interval, in order
    assert!(series.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(series.iter().all(|&(t, _)| t % 10 == 0));
}

#[test]
fn test_taxation_society() {
    let mut config = small_config();
    config.population.tax_rate = 0.05;

    let mut population = Population::new_with_seed(config, 6);
    population.run(50);

    for resource in Resource::ALL {
        assert!(population.pool.stock(resource) >= 0.0);
    }
}
