//! Sweeps of the position update rule over the reference line.

use trackvis::kinematics::{update, update_with_factor};
use trackvis::{
    seed, Direction, Line, Signal, SignalAspect, SignalKind, SpeedMultiplier, Station, StationKind, Topology, Train,
    TrainClass, TrainStatus,
};

fn train(position: f64, speed: f64, direction: Direction) -> Train {
    Train::builder()
        .id("sweep")
        .name("Sweep")
        .class(TrainClass::Express)
        .line(match direction {
            Direction::Forward => Line::Up,
            Direction::Backward => Line::Down,
        })
        .position(position)
        .speed(speed)
        .direction(direction)
        .next_station("Origin")
        .build()
        .unwrap()
}

fn starts() -> impl Iterator<Item = f64> {
    (0..=40).map(|i| f64::from(i) * 2.5)
}

const SPEEDS: [f64; 5] = [0.0, 12.5, 45.0, 95.0, 160.0];

#[test]
fn positions_stay_on_the_track_and_move_one_way() {
    let topology = seed::reference_topology();
    for direction in [Direction::Forward, Direction::Backward] {
        for m in SpeedMultiplier::ALL {
            for speed in SPEEDS {
                for start in starts() {
                    let mut t = train(start, speed, direction);
                    for _ in 0..250 {
                        let next = update(&t, &topology, 1, m);
                        assert!(
                            (0.0..=100.0).contains(&next.position),
                            "{start} {speed} {m} left the track: {}",
                            next.position
                        );
                        match direction {
                            Direction::Forward => assert!(next.position >= t.position),
                            Direction::Backward => assert!(next.position <= t.position),
                        }
                        assert_eq!(next.direction, direction);
                        t = next;
                    }
                }
            }
        }
    }
}

#[test]
fn approaching_iff_a_station_is_in_range() {
    let topology = seed::reference_topology();
    for m in SpeedMultiplier::ALL {
        for start in starts() {
            let mut t = train(start, 95.0, Direction::Forward);
            for _ in 0..120 {
                t = update(&t, &topology, 1, m);
                let in_range = topology
                    .stations()
                    .iter()
                    .find(|s| (s.position - t.position).abs() < 3.0);
                match in_range {
                    Some(s) => {
                        assert_eq!(t.status, TrainStatus::Approaching);
                        assert_eq!(t.next_station, s.name);
                    }
                    None => assert_eq!(t.status, TrainStatus::Running),
                }
            }
        }
    }
}

#[test]
fn next_station_only_changes_on_approach() {
    let topology = seed::reference_topology();
    let names: Vec<&str> = topology.stations().iter().map(|s| s.name.as_str()).collect();

    let mut t = train(0.0, 95.0, Direction::Forward);
    let mut seen = Vec::new();
    for _ in 0..300 {
        let next = update(&t, &topology, 1, SpeedMultiplier::Normal);
        if next.status == TrainStatus::Running {
            assert_eq!(next.next_station, t.next_station);
        }
        if next.next_station != t.next_station {
            seen.push(next.next_station.clone());
        }
        t = next;
    }
    // Every station is met in order, starting with the one the train leaves.
    let expected: Vec<String> = names.iter().map(|n| (*n).to_string()).collect();
    assert_eq!(seen, expected);
    assert_eq!(t.next_station, "North Terminal");
}

#[test]
fn exactly_three_from_a_station_is_running() {
    let topology = seed::reference_topology();
    for pos in [12.0, 18.0, 27.0, 33.0, 62.0, 68.0, 97.0] {
        let t = update(&train(pos, 0.0, Direction::Forward), &topology, 1, SpeedMultiplier::Normal);
        assert_eq!(t.status, TrainStatus::Running, "at {pos}");
        assert_eq!(t.next_station, "Origin");
    }
}

#[test]
fn overlapping_windows_pick_lowest_position() {
    let topology = Topology::builder()
        .station(Station::new("b", "Bravo", 12.0, StationKind::Halt, 1))
        .station(Station::new("a", "Alpha", 10.0, StationKind::Halt, 1))
        .signal(Signal::new("s", 11.0, SignalAspect::Green, SignalKind::Home))
        .build()
        .unwrap();

    let t = update(&train(11.0, 0.0, Direction::Forward), &topology, 1, SpeedMultiplier::Normal);
    assert_eq!(t.status, TrainStatus::Approaching);
    assert_eq!(t.next_station, "Alpha");
}

#[test]
fn scenario_reference_trains_over_ten_ticks() {
    let topology = seed::reference_topology();
    let mut trains = seed::initial_trains();
    for _ in 0..10 {
        trains = trains
            .iter()
            .map(|t| update(t, &topology, 1, SpeedMultiplier::Normal))
            .collect();
    }
    assert!((trains[0].position - 29.75).abs() < 1e-9);
    assert_eq!(trains[0].status, TrainStatus::Approaching);
    assert_eq!(trains[0].next_station, "Business Park");

    assert!((trains[1].position - 67.75).abs() < 1e-9);
    assert_eq!(trains[1].status, TrainStatus::Approaching);
    assert_eq!(trains[1].next_station, "University");
}

#[test]
fn movement_factor_scales_linearly() {
    let topology = seed::reference_topology();
    let t = train(40.0, 100.0, Direction::Forward);
    let half = update_with_factor(&t, &topology, 1, SpeedMultiplier::Normal, 0.25);
    let full = update_with_factor(&t, &topology, 1, SpeedMultiplier::Normal, 0.5);
    assert!((half.position - 40.25).abs() < 1e-9);
    assert!((full.position - 40.5).abs() < 1e-9);
}
