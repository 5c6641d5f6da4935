//! Chronos-Grid behavior tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use essence_grid_core::config::GridSettings;
use essence_grid_core::error::GridError;
use essence_grid_core::quantization::quantize;
use essence_grid_core::similarity::normalize;
use essence_grid_core::{Essence, VectorData};

use super::ChronosGrid;

const DIM: usize = 8;

fn small_settings() -> GridSettings {
    GridSettings {
        hot_capacity: 4,
        filter_bits: 256,
        filter_hashes: 2,
        shard_count: 16,
    }
}

fn grid() -> ChronosGrid {
    ChronosGrid::new(DIM, &small_settings())
}

fn unit(seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut v: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
    normalize(&mut v);
    v
}

fn essence(id: &str, vector: Vec<f32>) -> Essence {
    Essence::new(id, VectorData::Float(vector), vec![])
}

#[test]
fn insert_then_lookup_round_trips() {
    let grid = grid();
    grid.insert(essence("doc-1", unit(1))).unwrap();

    let found = grid.lookup("doc-1").expect("resident id");
    assert_eq!(found.id, "doc-1");
    assert!(grid.lookup("doc-2").is_none());
    assert_eq!(grid.len(), 1);
}

#[test]
fn dimension_mismatch_is_rejected_at_insert() {
    let grid = grid();
    let err = grid
        .insert(essence("bad", vec![1.0, 0.0, 0.0]))
        .unwrap_err();
    assert_eq!(
        err,
        GridError::DimensionMismatch {
            expected: DIM,
            actual: 3
        }
    );
    assert!(grid.is_empty());
}

#[test]
fn reinsertion_updates_in_place() {
    let grid = grid();
    let mut first = essence("doc", unit(1));
    first.metadata = vec![1];
    grid.insert(first).unwrap();

    let mut second = essence("doc", unit(2));
    second.metadata = vec![2];
    grid.insert(second).unwrap();

    assert_eq!(grid.len(), 1);
    assert_eq!(grid.lookup("doc").unwrap().metadata, vec![2]);
}

#[test]
fn evicted_id_is_gone_and_counts_a_filter_false_positive() {
    let grid = grid();
    grid.insert(essence("doc", unit(1))).unwrap();
    assert!(grid.evict("doc"));
    assert!(!grid.evict("doc"));

    // Bits stay set after eviction, so the lookup passes the filter and
    // misses the authoritative tier: an observed false positive.
    assert!(grid.lookup("doc").is_none());
    let stats = grid.stats();
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.filter_false_positives, 1);
    assert_eq!(stats.resident, 0);
}

#[test]
fn absent_id_is_rejected_by_the_filter() {
    let grid = grid();
    assert!(grid.lookup("never-inserted").is_none());

    let stats = grid.stats();
    assert_eq!(stats.total_lookups, 1);
    assert_eq!(stats.filter_rejections, 1);
    assert_eq!(stats.filter_false_positives, 0);
}

#[test]
fn second_lookup_is_served_by_the_hot_buffer() {
    let grid = grid();
    // Push "cold" out of the capacity-4 hot buffer.
    grid.insert(essence("cold", unit(0))).unwrap();
    for i in 1..=4 {
        grid.insert(essence(&format!("warm-{i}"), unit(i))).unwrap();
    }

    assert!(grid.lookup("cold").is_some());
    let stats = grid.stats();
    assert_eq!(stats.tier3_hits, 1);
    assert_eq!(stats.tier1_hits, 0);

    assert!(grid.lookup("cold").is_some());
    let stats = grid.stats();
    assert_eq!(stats.tier3_hits, 1);
    assert_eq!(stats.tier1_hits, 1);
}

#[test]
fn lookup_agrees_with_a_reference_model() {
    let grid = ChronosGrid::new(
        DIM,
        &GridSettings {
            hot_capacity: 8,
            filter_bits: 4096,
            filter_hashes: 2,
            shard_count: 8,
        },
    );
    let mut model: HashMap<String, bool> = HashMap::new();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for step in 0..2_000 {
        let id = format!("id-{}", rng.gen_range(0..200));
        match rng.gen_range(0..3) {
            0 => {
                grid.insert(essence(&id, unit(step))).unwrap();
                model.insert(id, true);
            }
            1 => {
                grid.evict(&id);
                model.insert(id, false);
            }
            _ => {
                let expected = *model.get(&id).unwrap_or(&false);
                assert_eq!(
                    grid.lookup(&id).is_some(),
                    expected,
                    "step {step}: lookup({id}) disagrees with the model"
                );
            }
        }
    }
}

#[test]
fn similarity_search_ranks_by_score() {
    let grid = grid();
    let mut aligned = vec![0.0; DIM];
    aligned[0] = 1.0;
    let mut close = vec![0.0; DIM];
    close[0] = 0.8;
    close[1] = 0.6;
    let mut orthogonal = vec![0.0; DIM];
    orthogonal[1] = 1.0;

    grid.insert(essence("aligned", aligned.clone())).unwrap();
    grid.insert(essence("close", close)).unwrap();
    grid.insert(essence("orthogonal", orthogonal)).unwrap();

    let hits = grid.similarity_search(&aligned, 10, 0.0).unwrap();
    let ids: Vec<&str> = hits.iter().map(|(e, _)| e.id.as_str()).collect();
    assert_eq!(ids, vec!["aligned", "close", "orthogonal"]);
    assert!((hits[0].1 - 1.0).abs() < 1e-5);
    assert!((hits[1].1 - 0.8).abs() < 1e-5);

    // Threshold drops the orthogonal entry.
    let hits = grid.similarity_search(&aligned, 10, 0.5).unwrap();
    assert_eq!(hits.len(), 2);

    // top_k bounds the result.
    let hits = grid.similarity_search(&aligned, 1, 0.0).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0.id, "aligned");

    // top_k of zero yields nothing.
    assert!(grid.similarity_search(&aligned, 0, 0.0).unwrap().is_empty());
}

#[test]
fn similarity_ties_break_toward_recent_insertion() {
    let grid = grid();
    let vector = unit(5);
    let now = Utc::now();

    let mut older = essence("older", vector.clone());
    older.inserted_at = now - Duration::seconds(60);
    let mut newer = essence("newer", vector.clone());
    newer.inserted_at = now;

    grid.insert(older).unwrap();
    grid.insert(newer).unwrap();

    let hits = grid.similarity_search(&vector, 2, 0.0).unwrap();
    assert_eq!(hits[0].0.id, "newer");
    assert_eq!(hits[1].0.id, "older");
}

#[test]
fn similarity_search_rejects_wrong_dimension() {
    let grid = grid();
    let err = grid.similarity_search(&[1.0, 0.0], 5, 0.0).unwrap_err();
    assert!(matches!(err, GridError::DimensionMismatch { .. }));
}

#[test]
fn quantized_residents_rank_like_float_residents() {
    let float_grid = grid();
    let quantized_grid = grid();

    // Vectors at controlled angles to the query axis: true scores are
    // 0.95, 0.85, ... with gaps far wider than the calibration error, so
    // both storage forms must produce the same order.
    for i in 0..6usize {
        let target = 0.95 - 0.10 * i as f32;
        let mut v = vec![0.0f32; DIM];
        v[0] = target;
        v[1 + (i % (DIM - 1))] = (1.0 - target * target).sqrt();

        float_grid
            .insert(essence(&format!("doc-{i}"), v.clone()))
            .unwrap();
        quantized_grid
            .insert(Essence::new(
                format!("doc-{i}"),
                VectorData::Quantized(quantize(&v).unwrap()),
                vec![],
            ))
            .unwrap();
    }

    let mut query = vec![0.0f32; DIM];
    query[0] = 1.0;
    let float_hits = float_grid.similarity_search(&query, 4, -1.0).unwrap();
    let quantized_hits = quantized_grid.similarity_search(&query, 4, -1.0).unwrap();

    let float_ids: Vec<&str> = float_hits.iter().map(|(e, _)| e.id.as_str()).collect();
    let quantized_ids: Vec<&str> = quantized_hits.iter().map(|(e, _)| e.id.as_str()).collect();
    assert_eq!(float_ids, vec!["doc-0", "doc-1", "doc-2", "doc-3"]);
    assert_eq!(float_ids, quantized_ids);
    for ((_, fs), (_, qs)) in float_hits.iter().zip(quantized_hits.iter()) {
        assert!((fs - qs).abs() < 2e-2);
    }
}

#[test]
fn flush_clears_tiers_and_statistics() {
    let grid = grid();
    grid.insert(essence("doc", unit(1))).unwrap();
    let _ = grid.lookup("doc");
    grid.flush();

    assert!(grid.is_empty());
    let stats = grid.stats();
    assert_eq!(stats.total_lookups, 0);
    assert_eq!(stats.inserts, 0);
    assert_eq!(stats.hot_occupancy, 0);
    assert_eq!(stats.filter_population, 0);
    // Flushed ids are definitively absent again.
    assert!(grid.lookup("doc").is_none());
    assert_eq!(grid.stats().filter_rejections, 1);
}

#[test]
fn rebuild_filter_restores_rejections_for_evicted_ids() {
    let grid = grid();
    for i in 0..5 {
        grid.insert(essence(&format!("doc-{i}"), unit(i))).unwrap();
    }
    for i in 0..5 {
        grid.evict(&format!("doc-{i}"));
    }

    // Stale bits: these lookups pass the filter and count false positives.
    assert!(grid.lookup("doc-0").is_none());
    assert!(grid.stats().filter_false_positives >= 1);

    grid.rebuild_filter();
    assert_eq!(grid.stats().filter_population, 0);

    let before = grid.stats().filter_rejections;
    assert!(grid.lookup("doc-0").is_none());
    assert_eq!(grid.stats().filter_rejections, before + 1);
}

#[test]
fn ten_thousand_records_stay_retrievable_with_hot_reuse() {
    let grid = ChronosGrid::new(
        DIM,
        &GridSettings {
            hot_capacity: 256,
            filter_bits: 1 << 17,
            filter_hashes: 2,
            shard_count: 1024,
        },
    );

    for i in 0..10_000u64 {
        grid.insert(essence(&format!("record-{i}"), unit(i))).unwrap();
    }
    assert_eq!(grid.len(), 10_000);

    for i in 0..10_000u64 {
        assert!(
            grid.lookup(&format!("record-{i}")).is_some(),
            "record-{i} must stay retrievable"
        );
    }

    // Repeated workload over a working set that fits the hot buffer.
    grid.flush();
    for i in 0..10_000u64 {
        grid.insert(essence(&format!("record-{i}"), unit(i))).unwrap();
    }
    for _ in 0..10 {
        for i in 0..100u64 {
            assert!(grid.lookup(&format!("record-{i}")).is_some());
        }
    }
    let stats = grid.stats();
    assert!(
        stats.tier1_hit_rate > 0.6,
        "tier-1 hit rate {:.2} below target",
        stats.tier1_hit_rate
    );
}

#[test]
fn concurrent_inserts_and_lookups_stay_consistent() {
    let grid = Arc::new(ChronosGrid::new(
        DIM,
        &GridSettings {
            hot_capacity: 32,
            filter_bits: 1 << 14,
            filter_hashes: 2,
            shard_count: 64,
        },
    ));

    let mut handles = Vec::new();
    for t in 0..4u64 {
        let grid = Arc::clone(&grid);
        handles.push(std::thread::spawn(move || {
            for i in 0..250u64 {
                let id = format!("t{t}-doc-{i}");
                grid.insert(essence(&id, unit(t * 1_000 + i))).unwrap();
                assert!(grid.lookup(&id).is_some());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(grid.len(), 1_000);
}
