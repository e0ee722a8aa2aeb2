//! Generational driver: tournament selection feeding the dispatcher.
//!
//! Each generation is one reproduction event, fully applied before
//! the next begins: select a candidate by tournament, run the
//! symbiotic dispatcher, let the ledger rebuild its caches, then
//! report. Archive writes (fusion log, periodic elite snapshots)
//! happen after the event commits.

use log::info;
use rand::{SeedableRng, rngs::StdRng};

use crate::schema::{ConfigError, EvolutionConfig};

use super::EvolveError;
use super::archive::RunArchive;
use super::ledger::PopulationLedger;
use super::reproduce::{Operator, Report, Reproducer};
use super::simulator::Simulator;

/// Run state after a generation.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Reproduction events completed.
    pub generation: usize,
    /// Fitness of the current best seed.
    pub best_fitness: f64,
    /// Mean fitness across the population.
    pub mean_fitness: f64,
}

/// An evolutionary run over one population and one simulator.
pub struct EvolutionRun<S> {
    config: EvolutionConfig,
    ledger: PopulationLedger,
    reproducer: Reproducer,
    sim: S,
    rng: StdRng,
    generation: usize,
    archive: Option<RunArchive>,
}

impl<S: Simulator> EvolutionRun<S> {
    /// Validate the configuration and build the initial population.
    pub fn new(config: EvolutionConfig, sim: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let ledger = PopulationLedger::random(&config, &mut rng);
        let reproducer = Reproducer::new(config.clone());
        Ok(Self {
            config,
            ledger,
            reproducer,
            sim,
            rng,
            generation: 0,
            archive: None,
        })
    }

    /// Attach an archive for elite snapshots and the fusion log.
    pub fn with_archive(mut self, archive: RunArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn ledger(&self) -> &PopulationLedger {
        &self.ledger
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn progress(&self) -> Progress {
        Progress {
            generation: self.generation,
            best_fitness: self.ledger.fitness(self.ledger.best().address),
            mean_fitness: self.ledger.mean_fitness(),
        }
    }

    /// Run one reproduction event.
    pub fn step(&mut self) -> Result<Report, EvolveError> {
        let candidate = self
            .ledger
            .tournament(self.config.tournament_size, &mut self.rng)
            .address;
        let report = self.reproducer.reproduce(
            Operator::Symbiotic,
            candidate,
            &mut self.ledger,
            &self.sim,
            &mut self.rng,
        )?;
        self.generation += 1;

        if let Some(archive) = &self.archive {
            if let Some(record) = &report.fusion {
                archive.append_fusion(record)?;
            }
            if self.generation % self.config.snapshot_interval == 0 {
                archive.snapshot_elite(&self.ledger, self.config.elite_size, self.generation)?;
            }
        }

        Ok(report)
    }

    /// Run the configured number of generations, reporting each event.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<Progress, EvolveError>
    where
        F: FnMut(&Progress, &Report),
    {
        while self.generation < self.config.num_generations {
            let report = self.step()?;
            info!("{}", report);
            callback(&self.progress(), &report);
        }
        Ok(self.progress())
    }

    /// Run to completion without reporting.
    pub fn run(&mut self) -> Result<Progress, EvolveError> {
        self.run_with_callback(|_, _| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Seed;

    use super::super::simulator::{Arena, Placement, SimError, TrialCounts};

    /// Deterministic double: the larger seed grows, the smaller dies.
    struct BiggerWinsSim;

    impl Simulator for BiggerWinsSim {
        fn run_trial(
            &self,
            left: &Seed,
            _left_at: Placement,
            right: &Seed,
            _right_at: Placement,
            _arena: Arena,
        ) -> Result<TrialCounts, SimError> {
            Ok(TrialCounts {
                red: left.num_living * 2,
                blue: right.num_living * 2,
            })
        }
    }

    fn config() -> EvolutionConfig {
        EvolutionConfig {
            pop_size: 10,
            s_xspan: 4,
            s_yspan: 4,
            seed_density: 0.5,
            num_trials: 2,
            num_generations: 30,
            snapshot_interval: 10,
            elite_size: 3,
            max_seed_area: 40,
            random_seed: Some(1234),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_completes_all_generations() {
        let mut run = EvolutionRun::new(config(), BiggerWinsSim).unwrap();
        let mut events = 0;
        let progress = run
            .run_with_callback(|progress, report| {
                events += 1;
                assert_eq!(progress.generation, events);
                assert!(report.birth > 0);
            })
            .unwrap();
        assert_eq!(progress.generation, 30);
        assert_eq!(events, 30);
        assert_eq!(run.ledger().len(), 10);
    }

    #[test]
    fn test_fixed_seed_reproduces_run() {
        let mut a = EvolutionRun::new(config(), BiggerWinsSim).unwrap();
        let mut b = EvolutionRun::new(config(), BiggerWinsSim).unwrap();
        let pa = a.run().unwrap();
        let pb = b.run().unwrap();
        assert_eq!(pa.best_fitness, pb.best_fitness);
        assert_eq!(pa.mean_fitness, pb.mean_fitness);
        assert_eq!(a.ledger().seeds(), b.ledger().seeds());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EvolutionConfig {
            pop_size: 1,
            ..config()
        };
        assert!(EvolutionRun::new(config, BiggerWinsSim).is_err());
    }

    #[test]
    fn test_simulator_failure_aborts_run() {
        struct FailingSim;
        impl Simulator for FailingSim {
            fn run_trial(
                &self,
                _: &Seed,
                _: Placement,
                _: &Seed,
                _: Placement,
                _: Arena,
            ) -> Result<TrialCounts, SimError> {
                Err(SimError::Unavailable("engine offline".into()))
            }
        }
        let mut run = EvolutionRun::new(config(), FailingSim).unwrap();
        assert!(matches!(run.run(), Err(EvolveError::Sim(_))));
    }

    #[test]
    fn test_archive_collects_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let archive = RunArchive::create(dir.path(), "test-run").unwrap();
        let mut run = EvolutionRun::new(config(), BiggerWinsSim)
            .unwrap()
            .with_archive(archive);
        run.run().unwrap();

        // 30 generations at interval 10 leave three snapshots.
        for generation in [10, 20, 30] {
            let path = dir
                .path()
                .join(format!("test-run-elite-{}.json", generation));
            let elite = super::super::archive::load_elite(&path).unwrap();
            assert_eq!(elite.len(), 3);
        }
    }

    #[test]
    fn test_uniform_asexual_marathon_keeps_books_straight() {
        let cfg = EvolutionConfig {
            num_generations: 100,
            ..config()
        };
        let mut run = EvolutionRun::new(cfg.clone(), BiggerWinsSim).unwrap();
        for _ in 0..100 {
            let candidate = run
                .ledger
                .tournament(cfg.tournament_size, &mut run.rng)
                .address;
            run.reproducer
                .reproduce(
                    Operator::UniformAsexual,
                    candidate,
                    &mut run.ledger,
                    &BiggerWinsSim,
                    &mut run.rng,
                )
                .unwrap();

            let ledger = &run.ledger;
            assert_eq!(ledger.len(), 10);
            for seed in ledger.seeds() {
                assert_eq!(seed.num_living, seed.count_living());
                assert_eq!((seed.xspan, seed.yspan), (4, 4));
            }
            for i in 0..ledger.len() {
                assert_eq!(ledger.history(i, i), 0.5);
                for j in 0..ledger.len() {
                    // Contested pairs split one point between their two
                    // entries; pairs never trialed are still both zero.
                    let coupled = ledger.history(i, j) + ledger.history(j, i);
                    assert!(
                        coupled.abs() < 1e-9 || (coupled - 1.0).abs() < 1e-9,
                        "history coupling broken at ({}, {})",
                        i,
                        j
                    );
                    assert_eq!(
                        ledger.similarity_between(i, j),
                        ledger.similarity_between(j, i)
                    );
                }
            }
        }
    }
}
