//! Track topology: stations and signals along the normalized track extent.
//!
//! Positions are fractions of the line on a `[0, 100]` scale. The reference
//! line is a 50 km double track, so one unit is half a kilometre. A topology
//! is built once, validated, and never mutated afterwards; the simulator only
//! ever reads it.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lower bound of the normalized track extent.
pub const TRACK_START: f64 = 0.0;

/// Upper bound of the normalized track extent.
pub const TRACK_END: f64 = 100.0;

/// Physical length represented by the full extent.
pub const DEFAULT_TRACK_LENGTH_KM: f64 = 50.0;

/// Distance within which a train counts as approaching a station.
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 3.0;

pub(crate) fn check_position(what: impl FnOnce() -> String, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (TRACK_START..=TRACK_END).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::PositionOutOfRange { what: what(), value })
    }
}

/// Station identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    /// Creates a station id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(String);

impl SignalId {
    /// Creates a signal id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Station category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    /// Large interchange or terminal.
    Major,
    /// Junction where lines diverge.
    Junction,
    /// Minor halt.
    Halt,
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Junction => write!(f, "junction"),
            Self::Halt => write!(f, "halt"),
        }
    }
}

/// Signal aspect as shown to drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAspect {
    /// Proceed.
    Green,
    /// Proceed with caution.
    Yellow,
    /// Stop.
    Red,
}

impl fmt::Display for SignalAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// Signal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Home signal protecting a station.
    Home,
    /// Distant signal repeating the next home aspect.
    Distant,
    /// Routing signal at a junction.
    Routing,
}

/// A station on the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station id.
    pub id: StationId,
    /// Display name, also reported as a train's upcoming station.
    pub name: String,
    /// Position on the `[0, 100]` extent.
    pub position: f64,
    /// Station category.
    pub kind: StationKind,
    /// Number of platforms.
    pub platforms: u8,
}

impl Station {
    /// Creates a station.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: f64, kind: StationKind, platforms: u8) -> Self {
        Self {
            id: StationId::new(id),
            name: name.into(),
            position,
            kind,
            platforms,
        }
    }
}

/// A lineside signal. Aspects are fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal id.
    pub id: SignalId,
    /// Position on the `[0, 100]` extent.
    pub position: f64,
    /// Displayed aspect.
    pub aspect: SignalAspect,
    /// Signal category.
    pub kind: SignalKind,
}

impl Signal {
    /// Creates a signal.
    #[must_use]
    pub fn new(id: impl Into<String>, position: f64, aspect: SignalAspect, kind: SignalKind) -> Self {
        Self {
            id: SignalId::new(id),
            position,
            aspect,
            kind,
        }
    }
}

/// Raw, unvalidated topology in its serialized form.
///
/// Deserializing a [`Topology`] goes through this type and then through
/// [`TopologyBuilder::build`], so JSON input gets the same validation as
/// builder input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyDef {
    stations: Vec<Station>,
    #[serde(default)]
    signals: Vec<Signal>,
    #[serde(default = "default_threshold")]
    proximity_threshold: f64,
    #[serde(default = "default_length_km")]
    length_km: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_PROXIMITY_THRESHOLD
}

fn default_length_km() -> f64 {
    DEFAULT_TRACK_LENGTH_KM
}

/// Immutable set of stations and signals, each sorted by ascending position.
///
/// Sorting is stable, so stations sharing a position keep their insertion
/// order. That order is the tie-break for [`Topology::nearest_station`].
///
/// # Examples
///
/// ```
/// use trackvis::topology::{Station, StationKind, Topology};
///
/// let topology = Topology::builder()
///     .station(Station::new("b", "Bravo", 40.0, StationKind::Halt, 2))
///     .station(Station::new("a", "Alpha", 10.0, StationKind::Major, 4))
///     .build()
///     .unwrap();
///
/// assert_eq!(topology.stations()[0].name, "Alpha");
/// assert_eq!(topology.nearest_station(41.5).unwrap().name, "Bravo");
/// assert!(topology.nearest_station(25.0).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TopologyDef", into = "TopologyDef")]
pub struct Topology {
    stations: Vec<Station>,
    signals: Vec<Signal>,
    proximity_threshold: f64,
    length_km: f64,
}

impl Topology {
    /// Starts building a topology.
    #[must_use]
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::default()
    }

    /// Stations in ascending position order.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Signals in ascending position order.
    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Distance within which a train is considered to be approaching a station.
    #[must_use]
    pub const fn proximity_threshold(&self) -> f64 {
        self.proximity_threshold
    }

    /// Physical length of the line in kilometres.
    #[must_use]
    pub const fn extent_km(&self) -> f64 {
        self.length_km
    }

    /// Converts a normalized position into kilometres from the start of the line.
    #[must_use]
    pub fn position_to_km(&self, position: f64) -> f64 {
        position / TRACK_END * self.length_km
    }

    /// Returns the first station, in ascending position order, lying strictly
    /// within the proximity threshold of `position`.
    ///
    /// When two stations are both in range the lower-positioned one wins, even
    /// if the other is closer.
    #[must_use]
    pub fn nearest_station(&self, position: f64) -> Option<&Station> {
        self.stations
            .iter()
            .find(|s| (s.position - position).abs() < self.proximity_threshold)
    }

    /// Looks up a station by id.
    #[must_use]
    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.iter().find(|s| &s.id == id)
    }

    /// Looks up a signal by id.
    #[must_use]
    pub fn signal(&self, id: &SignalId) -> Option<&Signal> {
        self.signals.iter().find(|s| &s.id == id)
    }

    /// Signals whose positions lie in the closed interval between `a` and `b`,
    /// in ascending order. The bounds may be given in either order.
    pub fn signals_between(&self, a: f64, b: f64) -> impl Iterator<Item = &Signal> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.signals
            .iter()
            .filter(move |s| s.position >= lo && s.position <= hi)
    }
}

impl TryFrom<TopologyDef> for Topology {
    type Error = ValidationError;

    fn try_from(def: TopologyDef) -> Result<Self, Self::Error> {
        TopologyBuilder {
            stations: def.stations,
            signals: def.signals,
            proximity_threshold: def.proximity_threshold,
            length_km: def.length_km,
        }
        .build()
    }
}

impl From<Topology> for TopologyDef {
    fn from(t: Topology) -> Self {
        Self {
            stations: t.stations,
            signals: t.signals,
            proximity_threshold: t.proximity_threshold,
            length_km: t.length_km,
        }
    }
}

/// Builder for [`Topology`].
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    stations: Vec<Station>,
    signals: Vec<Signal>,
    proximity_threshold: f64,
    length_km: f64,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            signals: Vec::new(),
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            length_km: DEFAULT_TRACK_LENGTH_KM,
        }
    }
}

impl TopologyBuilder {
    /// Adds a station.
    #[must_use]
    pub fn station(mut self, station: Station) -> Self {
        self.stations.push(station);
        self
    }

    /// Adds several stations.
    #[must_use]
    pub fn stations(mut self, stations: impl IntoIterator<Item = Station>) -> Self {
        self.stations.extend(stations);
        self
    }

    /// Adds a signal.
    #[must_use]
    pub fn signal(mut self, signal: Signal) -> Self {
        self.signals.push(signal);
        self
    }

    /// Adds several signals.
    #[must_use]
    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals.extend(signals);
        self
    }

    /// Overrides the station proximity threshold.
    #[must_use]
    pub fn proximity_threshold(mut self, threshold: f64) -> Self {
        self.proximity_threshold = threshold;
        self
    }

    /// Overrides the physical line length used for kilometre conversion.
    #[must_use]
    pub fn length_km(mut self, km: f64) -> Self {
        self.length_km = km;
        self
    }

    /// Validates and builds the topology.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if there are no stations, an id repeats,
    /// a name is blank, a position falls outside `[0, 100]`, or the threshold
    /// or length is not a positive finite number.
    pub fn build(self) -> Result<Topology, ValidationError> {
        let Self {
            mut stations,
            mut signals,
            proximity_threshold,
            length_km,
        } = self;

        if stations.is_empty() {
            return Err(ValidationError::EmptyTopology);
        }
        if !(proximity_threshold.is_finite() && proximity_threshold > 0.0) {
            return Err(ValidationError::InvalidProximityThreshold {
                value: proximity_threshold,
            });
        }
        if !(length_km.is_finite() && length_km > 0.0) {
            return Err(ValidationError::InvalidConfig {
                reason: format!("track length must be positive, got {length_km} km"),
            });
        }

        let mut seen = HashSet::with_capacity(stations.len());
        for s in &stations {
            if s.id.as_str().trim().is_empty() {
                return Err(ValidationError::EmptyField {
                    field: "station.id".to_string(),
                });
            }
            if s.name.trim().is_empty() {
                return Err(ValidationError::EmptyField {
                    field: "station.name".to_string(),
                });
            }
            check_position(|| format!("station '{}'", s.id), s.position)?;
            if !seen.insert(s.id.clone()) {
                return Err(ValidationError::DuplicateStation { id: s.id.to_string() });
            }
        }

        let mut seen = HashSet::with_capacity(signals.len());
        for s in &signals {
            if s.id.as_str().trim().is_empty() {
                return Err(ValidationError::EmptyField {
                    field: "signal.id".to_string(),
                });
            }
            check_position(|| format!("signal '{}'", s.id), s.position)?;
            if !seen.insert(s.id.clone()) {
                return Err(ValidationError::DuplicateSignal { id: s.id.to_string() });
            }
        }

        stations.sort_by(|a, b| a.position.total_cmp(&b.position));
        signals.sort_by(|a, b| a.position.total_cmp(&b.position));

        Ok(Topology {
            stations,
            signals,
            proximity_threshold,
            length_km,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_station_topology() -> Topology {
        Topology::builder()
            .station(Station::new("s2", "Second", 50.0, StationKind::Halt, 2))
            .station(Station::new("s1", "First", 10.0, StationKind::Major, 6))
            .signal(Signal::new("g2", 60.0, SignalAspect::Red, SignalKind::Home))
            .signal(Signal::new("g1", 20.0, SignalAspect::Green, SignalKind::Distant))
            .build()
            .unwrap()
    }

    #[test]
    fn test_stations_and_signals_sorted_by_position() {
        let t = two_station_topology();
        let names: Vec<_> = t.stations().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["First", "Second"]);
        let ids: Vec<_> = t.signals().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["g1", "g2"]);
    }

    #[test]
    fn test_empty_topology_rejected() {
        let err = Topology::builder()
            .signal(Signal::new("g1", 20.0, SignalAspect::Green, SignalKind::Home))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyTopology));
    }

    #[test]
    fn test_out_of_range_position_rejected() {
        let err = Topology::builder()
            .station(Station::new("s1", "Far", 100.5, StationKind::Halt, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::PositionOutOfRange { .. }));

        let err = Topology::builder()
            .station(Station::new("s1", "Ok", 1.0, StationKind::Halt, 1))
            .signal(Signal::new("g1", f64::NAN, SignalAspect::Red, SignalKind::Home))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::PositionOutOfRange { .. }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Topology::builder()
            .station(Station::new("s1", "A", 1.0, StationKind::Halt, 1))
            .station(Station::new("s1", "B", 2.0, StationKind::Halt, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateStation { .. }));

        let err = Topology::builder()
            .station(Station::new("s1", "A", 1.0, StationKind::Halt, 1))
            .signal(Signal::new("g", 5.0, SignalAspect::Red, SignalKind::Home))
            .signal(Signal::new("g", 6.0, SignalAspect::Red, SignalKind::Home))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateSignal { .. }));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = Topology::builder()
            .station(Station::new("s1", "A", 1.0, StationKind::Halt, 1))
            .proximity_threshold(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidProximityThreshold { .. }));
    }

    #[test]
    fn test_nearest_station_is_strict() {
        let t = two_station_topology();
        assert_eq!(t.nearest_station(12.9).unwrap().name, "First");
        assert_eq!(t.nearest_station(7.5).unwrap().name, "First");
        assert!(t.nearest_station(13.0).is_none());
        assert!(t.nearest_station(7.0).is_none());
    }

    #[test]
    fn test_nearest_station_prefers_lower_position_on_overlap() {
        let t = Topology::builder()
            .station(Station::new("b", "Upper", 14.0, StationKind::Halt, 1))
            .station(Station::new("a", "Lower", 10.0, StationKind::Halt, 1))
            .build()
            .unwrap();
        // 13.0 is closer to Upper, but Lower comes first and is in range.
        assert_eq!(t.nearest_station(12.5).unwrap().name, "Lower");
        assert_eq!(t.nearest_station(15.0).unwrap().name, "Upper");
    }

    #[test]
    fn test_equal_positions_keep_insertion_order() {
        let t = Topology::builder()
            .station(Station::new("x", "Xray", 30.0, StationKind::Halt, 1))
            .station(Station::new("y", "Yankee", 30.0, StationKind::Halt, 1))
            .build()
            .unwrap();
        assert_eq!(t.nearest_station(30.0).unwrap().name, "Xray");
    }

    #[test]
    fn test_lookups_and_km_conversion() {
        let t = two_station_topology();
        assert_eq!(t.station(&StationId::new("s2")).unwrap().platforms, 2);
        assert!(t.station(&StationId::new("nope")).is_none());
        assert_eq!(t.signal(&SignalId::new("g2")).unwrap().aspect, SignalAspect::Red);
        assert!((t.position_to_km(30.0) - 15.0).abs() < 1e-12);
        assert!((t.extent_km() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_signals_between_accepts_either_order() {
        let t = two_station_topology();
        let fwd: Vec<_> = t.signals_between(15.0, 60.0).map(|s| s.id.as_str()).collect();
        let back: Vec<_> = t.signals_between(60.0, 15.0).map(|s| s.id.as_str()).collect();
        assert_eq!(fwd, ["g1", "g2"]);
        assert_eq!(fwd, back);
        assert_eq!(t.signals_between(21.0, 59.0).count(), 0);
    }

    #[test]
    fn test_json_deserialization_validates() {
        let json = r#"{
            "stations": [
                {"id": "b", "name": "B", "position": 70.0, "kind": "junction", "platforms": 3},
                {"id": "a", "name": "A", "position": 5.0, "kind": "major", "platforms": 6}
            ],
            "signals": [{"id": "g", "position": 40.0, "aspect": "yellow", "kind": "routing"}]
        }"#;
        let t: Topology = serde_json::from_str(json).unwrap();
        assert_eq!(t.stations()[0].name, "A");
        assert!((t.proximity_threshold() - DEFAULT_PROXIMITY_THRESHOLD).abs() < f64::EPSILON);

        let empty = r#"{"stations": []}"#;
        let err = serde_json::from_str::<Topology>(empty).unwrap_err();
        assert!(err.to_string().contains("at least one station"));
    }
}
