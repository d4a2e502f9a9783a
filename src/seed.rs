//! Reference data: the control room's 50 km double line and its two trains.
//!
//! The initial train list and the reset list differ on purpose. The view opens
//! mid-run (Rajdhani at 25, the local at 70 approaching), while "Reset" puts
//! both trains back near their origin stations.

use crate::topology::{Signal, SignalAspect, SignalKind, Station, StationKind, Topology};
use crate::train::{Direction, Line, Train, TrainClass, TrainId, TrainStatus};

/// Stations of the reference line, west to east.
#[must_use]
pub fn reference_stations() -> Vec<Station> {
    vec![
        Station::new("st1", "Central Station", 0.0, StationKind::Major, 6),
        Station::new("st2", "Tech District", 15.0, StationKind::Junction, 4),
        Station::new("st3", "Business Park", 30.0, StationKind::Halt, 2),
        Station::new("st4", "Innovation Hub", 45.0, StationKind::Junction, 3),
        Station::new("st5", "University", 65.0, StationKind::Halt, 2),
        Station::new("st6", "Medical Center", 80.0, StationKind::Major, 4),
        Station::new("st7", "North Terminal", 100.0, StationKind::Major, 8),
    ]
}

/// Signals of the reference line.
#[must_use]
pub fn reference_signals() -> Vec<Signal> {
    vec![
        Signal::new("sig1", 8.0, SignalAspect::Green, SignalKind::Home),
        Signal::new("sig2", 22.0, SignalAspect::Yellow, SignalKind::Distant),
        Signal::new("sig3", 38.0, SignalAspect::Green, SignalKind::Routing),
        Signal::new("sig4", 52.0, SignalAspect::Green, SignalKind::Home),
        Signal::new("sig5", 72.0, SignalAspect::Red, SignalKind::Distant),
        Signal::new("sig6", 88.0, SignalAspect::Green, SignalKind::Routing),
    ]
}

/// The reference topology.
#[must_use]
pub fn reference_topology() -> Topology {
    Topology::builder()
        .stations(reference_stations())
        .signals(reference_signals())
        .build()
        .expect("reference topology is valid")
}

fn rajdhani(position: f64, status: TrainStatus, next_station: &str) -> Train {
    Train {
        id: TrainId::new("train1"),
        name: "Rajdhani Express".to_string(),
        number: "12001".to_string(),
        class: TrainClass::Superfast,
        line: Line::Up,
        position,
        speed: 95.0,
        direction: Direction::Forward,
        status,
        next_station: next_station.to_string(),
        signal_aspect: SignalAspect::Green,
        priority: 9,
    }
}

fn passenger_local(position: f64, status: TrainStatus, next_station: &str, aspect: SignalAspect) -> Train {
    Train {
        id: TrainId::new("train2"),
        name: "Passenger Local".to_string(),
        number: "56001".to_string(),
        class: TrainClass::Passenger,
        line: Line::Down,
        position,
        speed: 45.0,
        direction: Direction::Backward,
        status,
        next_station: next_station.to_string(),
        signal_aspect: aspect,
        priority: 5,
    }
}

/// Trains shown when the simulator first starts.
#[must_use]
pub fn initial_trains() -> Vec<Train> {
    vec![
        rajdhani(25.0, TrainStatus::Running, "Business Park"),
        passenger_local(70.0, TrainStatus::Approaching, "Innovation Hub", SignalAspect::Yellow),
    ]
}

/// Trains restored by a reset.
#[must_use]
pub fn reset_trains() -> Vec<Train> {
    vec![
        rajdhani(5.0, TrainStatus::Running, "Tech District"),
        passenger_local(85.0, TrainStatus::Running, "Medical Center", SignalAspect::Green),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_topology_shape() {
        let t = reference_topology();
        let positions: Vec<f64> = t.stations().iter().map(|s| s.position).collect();
        assert_eq!(positions, [0.0, 15.0, 30.0, 45.0, 65.0, 80.0, 100.0]);
        assert_eq!(t.signals().len(), 6);
        assert_eq!(t.signals()[4].aspect, SignalAspect::Red);
    }

    #[test]
    fn test_seed_lists_share_ids() {
        let a: Vec<_> = initial_trains().into_iter().map(|t| t.id).collect();
        let b: Vec<_> = reset_trains().into_iter().map(|t| t.id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reset_positions() {
        let trains = reset_trains();
        assert!((trains[0].position - 5.0).abs() < f64::EPSILON);
        assert_eq!(trains[0].direction, Direction::Forward);
        assert!((trains[1].position - 85.0).abs() < f64::EPSILON);
        assert_eq!(trains[1].direction, Direction::Backward);
    }

    #[test]
    fn test_seed_trains_pass_builder_validation() {
        for t in initial_trains().into_iter().chain(reset_trains()) {
            let rebuilt = Train::builder()
                .id(t.id.clone())
                .name(t.name.clone())
                .number(t.number.clone())
                .class(t.class)
                .line(t.line)
                .position(t.position)
                .speed(t.speed)
                .direction(t.direction)
                .status(t.status)
                .next_station(t.next_station.clone())
                .signal_aspect(t.signal_aspect)
                .priority(t.priority)
                .build()
                .unwrap();
            assert_eq!(rebuilt, t);
        }
    }
}
