use std::fmt;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Serialize;

use crate::errors::{MaatError, Result};
use crate::isolation::IsolationLevel;
use crate::maat::Maat;
use crate::store::row_set::RowSet;
use crate::store::versioned_row::Row;
use crate::transaction::Transaction;

/// Tunable parameters for one race run.
///
/// The empirical knobs (`stagger`, `max_trials`) are explicit fields rather
/// than constants: they are tied to engine and hardware timing, not to
/// correctness.
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Deadlock-class aborts to observe before declaring the run a pass.
    /// A threshold of 0 short-circuits without running a single trial.
    pub deadlock_threshold: u32,
    /// Upper bound on trials. Exhausting it without reaching the threshold
    /// yields [`MaatError::Inconclusive`] instead of looping forever.
    pub max_trials: u64,
    /// Optional delay applied to the worker side after the rendezvous.
    /// Purely a reproduction-rate tuning knob.
    pub stagger: Option<Duration>,
    /// Isolation level both racing transactions run under, injected per run
    /// and independent of the engine default.
    pub isolation: IsolationLevel,
    /// Rows restored after each truncate to re-establish the baseline.
    pub seed: Vec<(String, Row)>,
}

impl RaceConfig {
    /// A config with the given level and threshold, a 10 000-trial budget,
    /// no stagger, and an empty baseline.
    pub fn new(isolation: IsolationLevel, deadlock_threshold: u32) -> Self {
        Self {
            deadlock_threshold,
            max_trials: 10_000,
            stagger: None,
            isolation,
            seed: Vec::new(),
        }
    }
}

/// Classification of a single race attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrialOutcome {
    /// At least one commit failed with the deadlock-class error. Counted and
    /// retried.
    Deadlock,
    /// The anomaly predicate rejected the post-trial table state. Fatal.
    Anomaly,
    /// Both transactions finished and the table state passed the predicate.
    Clean,
}

/// One race attempt: its classification and how long it took.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Trial {
    pub outcome: TrialOutcome,
    pub elapsed: Duration,
}

/// What an anomaly looked like when it was caught.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    /// 1-based index of the trial that exposed the anomaly.
    pub trial: u64,
    /// Human-readable description of the inconsistent state, produced by the
    /// anomaly predicate.
    pub detail: String,
}

impl fmt::Display for AnomalyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trial {}: {}", self.trial, self.detail)
    }
}

/// Diagnostic summary of a passing run.
#[derive(Debug, Clone, Serialize)]
pub struct RaceReport {
    /// Total trials executed.
    pub trials: u64,
    /// Deadlock-class aborts observed.
    pub deadlocks: u32,
    /// Trials that completed without a deadlock and passed the predicate.
    pub clean: u64,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
}

/// Races two concurrent transactions against the shared table until enough
/// deadlock-class aborts accumulate to conclude the isolation level held.
///
/// Every trial resets the table to its baseline, stages the conditional
/// write in two transactions (the driver in the calling thread, one spawned
/// worker), lines both up on a rendezvous barrier, and races their commits.
/// A deadlock-class abort is evidence the engine serialized the writers; an
/// anomaly — post-trial state rejected by the caller's predicate — fails the
/// run on the spot.
///
/// Passing provides probabilistic confidence only: N anomaly-free trials are
/// evidence the level suffices, not proof.
pub struct RaceHarness<'a> {
    engine: &'a Maat,
    config: RaceConfig,
}

impl<'a> RaceHarness<'a> {
    /// Creates a harness over an engine the caller owns for the duration of
    /// the run. Nothing outside the two racing transactions may touch the
    /// table while a run is in flight.
    pub fn new(engine: &'a Maat, config: RaceConfig) -> Self {
        Self { engine, config }
    }

    /// Runs the race to a verdict.
    ///
    /// `write_op` stages the conditional write inside a transaction; it runs
    /// once per racing side per trial. `anomaly_check` inspects the table
    /// after every non-deadlocking trial and returns `Err(detail)` when the
    /// state is inconsistent.
    ///
    /// # Errors
    ///
    /// [`MaatError::Anomaly`] as soon as the predicate rejects a trial,
    /// [`MaatError::Inconclusive`] when the trial budget runs out below the
    /// deadlock threshold, and any non-deadlock-class error from the engine
    /// or `write_op` unmodified.
    pub fn run<W, C>(&self, write_op: W, anomaly_check: C) -> Result<RaceReport>
    where
        W: Fn(&mut Transaction) -> Result<()> + Sync,
        C: Fn(&RowSet) -> std::result::Result<(), String>,
    {
        let started = Instant::now();
        let mut deadlocks = 0u32;
        let mut clean = 0u64;
        let mut trials = 0u64;

        if self.config.deadlock_threshold == 0 {
            // Degenerate threshold: nothing to wait for.
            return Ok(RaceReport {
                trials,
                deadlocks,
                clean,
                elapsed: started.elapsed(),
            });
        }

        while trials < self.config.max_trials {
            trials += 1;
            let trial = self.run_trial(&write_op)?;

            match trial.outcome {
                TrialOutcome::Deadlock => {
                    deadlocks += 1;
                    debug!(
                        "trial {trials}: deadlock {deadlocks}/{} in {:?}",
                        self.config.deadlock_threshold, trial.elapsed
                    );
                    if deadlocks >= self.config.deadlock_threshold {
                        let report = RaceReport {
                            trials,
                            deadlocks,
                            clean,
                            elapsed: started.elapsed(),
                        };
                        info!(
                            "race passed: {} deadlocks over {} trials ({} clean) in {:?}",
                            report.deadlocks, report.trials, report.clean, report.elapsed
                        );
                        return Ok(report);
                    }
                }
                TrialOutcome::Clean | TrialOutcome::Anomaly => {
                    if let Err(detail) = anomaly_check(self.engine.rows()) {
                        let report = AnomalyReport {
                            trial: trials,
                            detail,
                        };
                        info!("race failed: {report}");
                        return Err(MaatError::Anomaly(report));
                    }
                    clean += 1;
                    debug!("trial {trials}: clean in {:?}", trial.elapsed);
                }
            }
        }

        info!(
            "race inconclusive: {deadlocks} deadlocks over {trials} trials, \
             threshold {} not reached",
            self.config.deadlock_threshold
        );
        Err(MaatError::Inconclusive { trials, deadlocks })
    }

    /// Runs one trial: reset, rendezvous, race, classify.
    ///
    /// Only Deadlock and Clean come out of here; the anomaly predicate is
    /// the caller's to apply. A trial always runs both sides to completion
    /// before returning.
    fn run_trial<W>(&self, write_op: &W) -> Result<Trial>
    where
        W: Fn(&mut Transaction) -> Result<()> + Sync,
    {
        let started = Instant::now();

        self.engine.truncate();
        if !self.config.seed.is_empty() {
            let mut seed_txn = self.engine.begin_with(IsolationLevel::ReadCommitted);
            for (key, row) in &self.config.seed {
                seed_txn.write(key.clone(), row.clone())?;
            }
            seed_txn.commit()?;
        }

        let engine = self.engine;
        let isolation = self.config.isolation;
        let stagger = self.config.stagger;
        let rendezvous = Barrier::new(2);

        let (driver_result, worker_result) = thread::scope(|scope| {
            let worker = scope.spawn(|| {
                let mut txn = engine.begin_with(isolation);
                let staged = write_op(&mut txn);
                rendezvous.wait();
                if let Some(delay) = stagger {
                    thread::sleep(delay);
                }
                finish(txn, staged)
            });

            let mut txn = engine.begin_with(isolation);
            let staged = write_op(&mut txn);
            rendezvous.wait();
            let driver_result = finish(txn, staged);

            let worker_result = match worker.join() {
                Ok(result) => result,
                Err(_) => Err(MaatError::Other("racing worker panicked".to_string())),
            };
            (driver_result, worker_result)
        });

        let elapsed = started.elapsed();
        let mut deadlocked = false;
        for result in [driver_result, worker_result] {
            match result {
                Ok(()) => {}
                Err(err) if err.is_deadlock_class() => deadlocked = true,
                Err(err) => return Err(err),
            }
        }

        let outcome = if deadlocked {
            TrialOutcome::Deadlock
        } else {
            TrialOutcome::Clean
        };
        Ok(Trial { outcome, elapsed })
    }
}

/// Commits a transaction whose staging succeeded, rolls it back otherwise.
fn finish(txn: Transaction, staged: Result<()>) -> Result<()> {
    match staged {
        Ok(()) => txn.commit(),
        Err(err) => {
            txn.rollback();
            Err(err)
        }
    }
}
