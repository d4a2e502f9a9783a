//! The owned simulator object.
//!
//! `Simulation` bundles topology, train store, play state and speed into one
//! value with no timer attached. [`crate::scheduler`] drives it from a worker
//! thread; tests and headless callers drive it directly with [`Simulation::tick`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SimulatorConfig;
use crate::error::{ExecutionError, TrackResult, ValidationError};
use crate::kinematics::{self, SpeedMultiplier};
use crate::seed;
use crate::store::TrainStore;
use crate::topology::Topology;
use crate::train::{Line, Train, TrainId};

/// Control state of a simulation, separate from the train set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Whether the scheduler fires ticks.
    pub playing: bool,
    /// Current speed multiplier.
    pub speed: SpeedMultiplier,
    /// Ticks applied since construction. Not cleared by reset.
    pub tick: u64,
    /// Train highlighted by the presentation layer, if any.
    pub selected: Option<TrainId>,
}

/// A track simulation: topology, trains and control state.
#[derive(Debug, Clone)]
pub struct Simulation {
    topology: Arc<Topology>,
    store: TrainStore,
    reset_seed: Vec<Train>,
    movement_factor: f64,
    playing: bool,
    speed: SpeedMultiplier,
    tick: u64,
    selected: Option<TrainId>,
}

fn validate_trains(trains: &[Train]) -> Result<(), ValidationError> {
    trains.iter().try_for_each(Train::validate)
}

impl Simulation {
    /// Creates a simulation.
    ///
    /// `initial` is the train set at startup; `reset_seed` is what
    /// [`Simulation::reset`] restores.
    ///
    /// # Errors
    ///
    /// Fails fast with a validation error if the config is invalid, any train
    /// breaks its invariants, or either train list repeats an id.
    pub fn new(
        topology: Topology,
        initial: Vec<Train>,
        reset_seed: Vec<Train>,
        config: &SimulatorConfig,
    ) -> TrackResult<Self> {
        config.validate()?;
        validate_trains(&initial)?;
        validate_trains(&reset_seed)?;
        // Reject a bad reset seed now rather than on the first reset.
        TrainStore::new(reset_seed.clone())?;
        let store = TrainStore::new(initial)?;

        Ok(Self {
            topology: Arc::new(topology),
            store,
            reset_seed,
            movement_factor: config.movement_factor,
            playing: config.start_playing,
            speed: config.initial_speed,
            tick: 0,
            selected: None,
        })
    }

    /// The control room's reference line with its two seed trains.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is invalid.
    pub fn reference(config: &SimulatorConfig) -> TrackResult<Self> {
        Self::new(
            seed::reference_topology(),
            seed::initial_trains(),
            seed::reset_trains(),
            config,
        )
    }

    /// The read-only topology.
    #[must_use]
    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    /// Current train snapshot. Repeated calls without a tick return the same
    /// `Arc`.
    #[must_use]
    pub fn trains(&self) -> Arc<[Train]> {
        self.store.snapshot()
    }

    /// Looks up one train.
    #[must_use]
    pub fn train(&self, id: &TrainId) -> Option<&Train> {
        self.store.get_by_id(id)
    }

    /// Trains on one line, in store order.
    #[must_use]
    pub fn trains_on_line(&self, line: Line) -> Vec<Train> {
        self.store.on_line(line).cloned().collect()
    }

    /// Advances every train by one tick, whether or not the simulation is
    /// playing. Returns the new tick count.
    pub fn tick(&mut self) -> u64 {
        self.advance(1)
    }

    /// Advances every train by `ticks` ticks, one tick at a time.
    pub fn advance(&mut self, ticks: u32) -> u64 {
        for _ in 0..ticks {
            let topology = &self.topology;
            let speed = self.speed;
            let factor = self.movement_factor;
            self.store
                .map_all(|t| kinematics::update_with_factor(t, topology, 1, speed, factor));
            self.tick += 1;
        }
        self.tick
    }

    /// Resumes ticking.
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Suspends ticking.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Returns true while playing.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Restores the reset seed. Play state, speed and selection are kept.
    pub fn reset(&mut self) {
        // The seed was validated in `new`.
        let _ = self.store.reset(&self.reset_seed);
    }

    /// Changes the speed multiplier for subsequent ticks.
    pub fn set_speed_multiplier(&mut self, speed: SpeedMultiplier) {
        self.speed = speed;
    }

    /// Current speed multiplier.
    #[must_use]
    pub const fn speed_multiplier(&self) -> SpeedMultiplier {
        self.speed
    }

    /// Highlights a train, or clears the highlight with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::TrainNotFound`] for an unknown id; the previous
    /// selection is kept.
    pub fn select_train(&mut self, id: Option<TrainId>) -> TrackResult<()> {
        if let Some(id) = &id {
            if !self.store.contains(id) {
                return Err(ExecutionError::TrainNotFound { id: id.clone() }.into());
            }
        }
        self.selected = id;
        Ok(())
    }

    /// The highlighted train, if any.
    #[must_use]
    pub fn selected_train(&self) -> Option<&Train> {
        self.selected.as_ref().and_then(|id| self.store.get_by_id(id))
    }

    /// Control state snapshot.
    #[must_use]
    pub fn state(&self) -> SimulationState {
        SimulationState {
            playing: self.playing,
            speed: self.speed,
            tick: self.tick,
            selected: self.selected.clone(),
        }
    }
}
