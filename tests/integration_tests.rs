use tempora::{Config, Event, IndexBuilder, LifeSpan, Row, TemporaError, TemporalTable, TimelineIndex};

/// Deterministic pseudo-random stream for workload generation.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

/// A generated table: rows with pseudo-random lifespans and values.
fn random_table(seed: u64, rows: usize, next_version: u32) -> TemporalTable {
    let mut rng = Lcg(seed);
    let mut table = TemporalTable::new(next_version);

    for _ in 0..rows {
        let start = (rng.next() % next_version as u64) as u32;
        let lifespan = match rng.next() % 4 {
            0 => LifeSpan::open(start),
            _ => {
                let span = 1 + rng.next() % 40;
                let end = (start as u64 + span).min(next_version as u64) as u32;
                LifeSpan::new(start, end)
            }
        };
        let value = rng.next() % 10_000;
        let weight = rng.next() % 100;
        table.push(vec![value, weight], lifespan);
    }
    table
}

#[test]
fn test_boundary_scenario() {
    let mut table = TemporalTable::new(6);
    table.push(vec![1], LifeSpan::new(0, 4));
    table.push(vec![2], LifeSpan::open(2));
    table.push(vec![3], LifeSpan::new(3, 5));

    let index = TimelineIndex::new(table);

    assert_eq!(index.time_travel(0).unwrap(), vec![vec![1]]);
    assert_eq!(index.time_travel(2).unwrap(), vec![vec![1], vec![2]]);
    assert_eq!(
        index.time_travel(3).unwrap(),
        vec![vec![1], vec![2], vec![3]]
    );
    assert_eq!(index.time_travel(4).unwrap(), vec![vec![2], vec![3]]);
    assert_eq!(index.time_travel(5).unwrap(), vec![vec![2]]);

    assert_eq!(index.temporal_sum(0).unwrap(), vec![1, 1, 3, 6, 5, 2]);
    assert_eq!(index.temporal_max(0).unwrap(), vec![1, 1, 3, 3, 3, 2]);
}

#[test]
fn test_empty_table() {
    let table = TemporalTable::new(0);
    let index = TimelineIndex::new(table);

    assert_eq!(index.current_version(), 0);
    assert_eq!(index.temporal_sum(0).unwrap(), Vec::<u64>::new());
    assert_eq!(index.temporal_max(0).unwrap(), Vec::<u64>::new());

    assert_eq!(
        index.time_travel(0),
        Err(TemporaError::InvalidVersion {
            requested: 0,
            current: 0
        })
    );
    assert!(index.time_travel(17).is_err());
}

#[test]
fn test_time_travel_is_idempotent() {
    let table = random_table(11, 200, 80);
    let index = TimelineIndex::new(table);

    for version in [0, 13, 42, 79] {
        let first = index.time_travel(version).unwrap();
        let second = index.time_travel(version).unwrap();
        assert_eq!(first, second, "version {version}");
    }
}

#[test]
fn test_time_travel_matches_brute_force() {
    let table = random_table(42, 500, 120);
    let index = TimelineIndex::new(table.clone());

    for version in 0..table.next_version() {
        assert_eq!(
            index.time_travel(version).unwrap(),
            table.time_travel(version),
            "version {version}"
        );
    }
}

#[test]
fn test_temporal_sum_matches_brute_force() {
    let table = random_table(7, 400, 100);
    let index = TimelineIndex::new(table.clone());

    assert_eq!(index.temporal_sum(0).unwrap(), table.temporal_sum(0));
    assert_eq!(index.temporal_sum(1).unwrap(), table.temporal_sum(1));
}

#[test]
fn test_temporal_max_matches_brute_force() {
    let table = random_table(1234, 400, 100);
    let index = TimelineIndex::new(table.clone());

    assert_eq!(index.temporal_max(0).unwrap(), table.temporal_max(0));
    assert_eq!(index.temporal_max(1).unwrap(), table.temporal_max(1));
}

#[test]
fn test_max_through_empty_transitions() {
    // All rows die at version 2; the active set passes through empty and
    // fills up again.
    let mut table = TemporalTable::new(6);
    table.push(vec![10], LifeSpan::new(0, 2));
    table.push(vec![20], LifeSpan::new(1, 2));
    table.push(vec![5], LifeSpan::new(3, 6));

    let index = TimelineIndex::new(table.clone());

    assert_eq!(index.temporal_max(0).unwrap(), vec![10, 20, 0, 5, 5, 5]);
    assert_eq!(index.temporal_max(0).unwrap(), table.temporal_max(0));
}

#[test]
fn test_open_lifespans_survive_to_the_last_version() {
    let mut table = TemporalTable::new(50);
    table.push(vec![3], LifeSpan::open(0));
    table.push(vec![4], LifeSpan::new(10, 20));

    let index = TimelineIndex::new(table);

    assert_eq!(index.time_travel(49).unwrap(), vec![vec![3]]);
    assert_eq!(index.time_travel(15).unwrap(), vec![vec![3], vec![4]]);
}

#[test]
fn test_builder_with_custom_config() {
    let table = random_table(3, 100, 60);
    let expected = table.temporal_sum(0);

    let index = IndexBuilder::new()
        .checkpoint_count(7)
        .shard_count(3)
        .top_k(5)
        .build(table)
        .unwrap();

    assert_eq!(index.temporal_sum(0).unwrap(), expected);
}

#[test]
fn test_config_json_roundtrip_drives_builder() {
    let json = r#"{ "checkpoint_count": 4, "shard_count": 2, "top_k": 8 }"#;
    let config = Config::from_json(json).unwrap();

    let table = random_table(5, 50, 30);
    let oracle_max = table.temporal_max(0);

    let index = IndexBuilder::new().config(config).build(table).unwrap();
    assert_eq!(index.temporal_max(0).unwrap(), oracle_max);
}

#[test]
fn test_append_version_then_query() {
    let mut table = TemporalTable::new(3);
    table.push(vec![8], LifeSpan::open(0));
    table.push(vec![6], LifeSpan::new(1, 3));

    let mut index = TimelineIndex::new(table);
    assert_eq!(index.current_version(), 3);

    index.append_version(&[Event::delete(0)]);
    index.append_version(&[]);

    assert_eq!(index.current_version(), 5);
    assert_eq!(index.time_travel(2).unwrap(), vec![vec![8], vec![6]]);
    assert_eq!(index.time_travel(3).unwrap(), Vec::<Row>::new());
    assert_eq!(index.time_travel(4).unwrap(), Vec::<Row>::new());
}

#[test]
fn test_stats_reflect_construction() {
    let table = random_table(9, 250, 90);
    let rows = table.len();
    let events = table.event_count();

    let index = TimelineIndex::new(table);
    let stats = index.stats();

    assert_eq!(stats.row_count, rows);
    assert_eq!(stats.event_count, events);
    assert_eq!(stats.version_count, 90);
    assert!(stats.checkpoint_count >= 1);
}
