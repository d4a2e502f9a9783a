//! Kinematic state store.
//!
//! Holds the current train set as an immutable, shared snapshot. Writers swap
//! in a whole new snapshot; readers holding an older `Arc` keep seeing the old
//! set, so a reader can never observe a half-updated tick.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::train::{Line, Train, TrainId};

fn check_unique(trains: &[Train]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(trains.len());
    for t in trains {
        if !seen.insert(&t.id) {
            return Err(ValidationError::DuplicateTrain { id: t.id.clone() });
        }
    }
    Ok(())
}

/// Ordered id → train mapping, replaced wholesale.
#[derive(Debug, Clone)]
pub struct TrainStore {
    trains: Arc<[Train]>,
}

impl TrainStore {
    /// Creates a store from an initial train list.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateTrain`] if two trains share an id.
    pub fn new(trains: Vec<Train>) -> Result<Self, ValidationError> {
        check_unique(&trains)?;
        Ok(Self { trains: trains.into() })
    }

    /// Returns an owned copy of the current set, in store order.
    #[must_use]
    pub fn get(&self) -> Vec<Train> {
        self.trains.to_vec()
    }

    /// Returns the current set without copying.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[Train]> {
        Arc::clone(&self.trains)
    }

    /// Looks up a train by id.
    #[must_use]
    pub fn get_by_id(&self, id: &TrainId) -> Option<&Train> {
        self.trains.iter().find(|t| &t.id == id)
    }

    /// Returns true if a train with this id exists.
    #[must_use]
    pub fn contains(&self, id: &TrainId) -> bool {
        self.get_by_id(id).is_some()
    }

    /// Trains assigned to `line`, in store order.
    pub fn on_line(&self, line: Line) -> impl Iterator<Item = &Train> {
        self.trains.iter().filter(move |t| t.line == line)
    }

    /// Number of trains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trains.len()
    }

    /// Returns true if the store holds no trains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    /// Atomically replaces the whole set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateTrain`] if two trains share an id;
    /// the previous set is kept.
    pub fn replace_all(&mut self, trains: Vec<Train>) -> Result<(), ValidationError> {
        check_unique(&trains)?;
        self.trains = trains.into();
        Ok(())
    }

    /// Replaces every train with `f(train)`, keeping order.
    ///
    /// `f` must not change ids; this is the tick path and skips the
    /// uniqueness check.
    pub fn map_all(&mut self, f: impl FnMut(&Train) -> Train) {
        let next: Vec<Train> = self.trains.iter().map(f).collect();
        debug_assert!(next.iter().zip(self.trains.iter()).all(|(a, b)| a.id == b.id));
        self.trains = next.into();
    }

    /// Restores the set to a seed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateTrain`] if the seed repeats an id.
    pub fn reset(&mut self, seed: &[Train]) -> Result<(), ValidationError> {
        self.replace_all(seed.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn test_get_is_idempotent() {
        let store = TrainStore::new(seed::initial_trains()).unwrap();
        assert_eq!(store.get(), store.get());
        assert!(Arc::ptr_eq(&store.snapshot(), &store.snapshot()));
    }

    #[test]
    fn test_duplicate_ids_rejected_and_state_kept() {
        let mut store = TrainStore::new(seed::initial_trains()).unwrap();
        let before = store.get();

        let mut dup = seed::reset_trains();
        dup[1].id = dup[0].id.clone();
        let err = store.replace_all(dup).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateTrain { .. }));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_old_snapshot_survives_replacement() {
        let mut store = TrainStore::new(seed::initial_trains()).unwrap();
        let old = store.snapshot();
        store.replace_all(seed::reset_trains()).unwrap();
        assert!((old[0].position - 25.0).abs() < f64::EPSILON);
        assert!((store.snapshot()[0].position - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut store = TrainStore::new(seed::initial_trains()).unwrap();
        store.map_all(|t| Train {
            position: 50.0,
            ..t.clone()
        });
        store.reset(&seed::reset_trains()).unwrap();
        assert_eq!(store.get(), seed::reset_trains());
    }

    #[test]
    fn test_lookups() {
        let store = TrainStore::new(seed::initial_trains()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
        assert!(store.contains(&TrainId::new("train2")));
        assert!(!store.contains(&TrainId::new("train3")));
        assert_eq!(store.get_by_id(&TrainId::new("train1")).unwrap().name, "Rajdhani Express");

        let up: Vec<_> = store.on_line(Line::Up).map(|t| t.id.as_str()).collect();
        let down: Vec<_> = store.on_line(Line::Down).map(|t| t.id.as_str()).collect();
        assert_eq!(up, ["train1"]);
        assert_eq!(down, ["train2"]);
    }

    #[test]
    fn test_empty_store() {
        let store = TrainStore::new(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert!(store.get().is_empty());
    }
}
