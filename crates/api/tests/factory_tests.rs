//! Factory behavior tests
//!
//! Covers the construction contract of the facade:
//! - Every catalog pair builds a handle of exactly that specialization
//! - Pairs missing from a catalog fail with `UnsupportedCombination`
//! - Bad dimensions and entry policy names fail before any engine exists
//! - Handles built from identical requests share nothing
//! - Saved handles load back with identical search behavior

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use vecnav_api::{
    create, create_from_request, load, ConfigurationMap, CreateRequest, DataType, EntryPolicy,
    IndexError, IndexFactory, IndexHandle, MetricType, ReorderStrategy, SpecializationId,
    VariantCatalog, VariantKey, VectorSlice,
};

/// Owned vectors of any element type
enum Data {
    Float32(Vec<f32>),
    UInt8(Vec<u8>),
    Int8(Vec<i8>),
}

impl Data {
    fn random(data_type: DataType, n: usize, dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let len = n * dim;
        match data_type {
            DataType::Float32 => Data::Float32((0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()),
            DataType::UInt8 => Data::UInt8((0..len).map(|_| rng.gen()).collect()),
            DataType::Int8 => Data::Int8((0..len).map(|_| rng.gen()).collect()),
        }
    }

    fn all(&self) -> VectorSlice<'_> {
        match self {
            Data::Float32(v) => VectorSlice::from(v),
            Data::UInt8(v) => VectorSlice::from(v),
            Data::Int8(v) => VectorSlice::from(v),
        }
    }

    fn row(&self, i: usize, dim: usize) -> VectorSlice<'_> {
        let range = i * dim..(i + 1) * dim;
        match self {
            Data::Float32(v) => VectorSlice::Float32(&v[range]),
            Data::UInt8(v) => VectorSlice::UInt8(&v[range]),
            Data::Int8(v) => VectorSlice::Int8(&v[range]),
        }
    }
}

fn no_options() -> ConfigurationMap {
    ConfigurationMap::new()
}

fn request(dimension: i64, capacity: i64, entry_policy: &str) -> CreateRequest {
    CreateRequest {
        metric: "l2".into(),
        data_type: "float32".into(),
        dimension,
        capacity,
        entry_policy: entry_policy.into(),
        options: ConfigurationMap::new(),
    }
}

fn filled(key: VariantKey, n: usize, dim: usize, seed: u64) -> (IndexHandle, Data) {
    let mut handle = create(
        key.metric,
        key.data_type,
        dim,
        n,
        EntryPolicy::SampledGreedy,
        &no_options(),
    )
    .unwrap();
    let data = Data::random(key.data_type, n, dim, seed);
    let labels: Vec<u64> = (0..n as u64).collect();
    handle.add(data.all(), &labels).unwrap();
    (handle, data)
}

// ============================================================================
// Catalog coverage
// ============================================================================

#[test]
fn test_every_catalog_pair_builds_its_specialization() {
    let catalog = VariantCatalog::builtin();
    for key in catalog.keys() {
        let handle = create(key.metric, key.data_type, 16, 10, EntryPolicy::FirstNode, &no_options())
            .unwrap();
        assert_eq!(handle.key(), key);
        assert_eq!(handle.metric(), key.metric);
        assert_eq!(handle.data_type(), key.data_type);
        assert_eq!(Some(handle.specialization()), catalog.get(key));
        assert_eq!(handle.specialization().key(), key);
    }
}

#[test]
fn test_every_missing_pair_is_unsupported_combination() {
    for id in SpecializationId::ALL {
        let key = id.key();
        let factory = IndexFactory::with_catalog(VariantCatalog::builtin().without(key));

        // Storage this large could never be reserved; the catalog miss must
        // be reported before construction is attempted.
        let err = factory
            .create(
                key.metric,
                key.data_type,
                usize::MAX / 2,
                u32::MAX as usize,
                EntryPolicy::FirstNode,
                &no_options(),
            )
            .unwrap_err();
        assert!(
            matches!(err, IndexError::UnsupportedCombination { metric, data_type }
                if metric == key.metric && data_type == key.data_type),
            "unexpected error for {}: {:?}",
            key,
            err
        );
    }
}

#[test]
fn test_empty_catalog_rejects_everything() {
    let factory = IndexFactory::with_catalog(VariantCatalog::default());
    for key in VariantKey::all() {
        let err = factory
            .create(key.metric, key.data_type, 4, 4, EntryPolicy::Random, &no_options())
            .unwrap_err();
        assert_eq!(err.error_code(), "UnsupportedCombination");
    }
}

// ============================================================================
// Example scenarios
// ============================================================================

#[test]
fn test_scenario_l2_float32_dimension_128() {
    let handle = create(
        MetricType::L2,
        DataType::Float32,
        128,
        1000,
        EntryPolicy::FirstNode,
        &no_options(),
    )
    .unwrap();
    assert_eq!(handle.dimension(), 128);
    assert_eq!(handle.capacity(), 1000);
    assert!(handle.is_empty());
    assert_eq!(handle.entry_policy(), EntryPolicy::FirstNode);
}

#[test]
fn test_scenario_missing_inner_product_uint8() {
    let key = VariantKey::new(MetricType::InnerProduct, DataType::UInt8);
    let factory = IndexFactory::with_catalog(VariantCatalog::builtin().without(key));
    let err = factory
        .create(
            MetricType::InnerProduct,
            DataType::UInt8,
            64,
            0,
            EntryPolicy::FirstNode,
            &no_options(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        IndexError::UnsupportedCombination {
            metric: MetricType::InnerProduct,
            data_type: DataType::UInt8
        }
    ));

    // The built-in catalog has the pair, so the same call succeeds there.
    let handle = create(
        MetricType::InnerProduct,
        DataType::UInt8,
        64,
        0,
        EntryPolicy::FirstNode,
        &no_options(),
    )
    .unwrap();
    assert_eq!(handle.capacity(), 0);
}

#[test]
fn test_scenario_negative_dimension() {
    let err = create_from_request(&request(-1, 10, "first_node")).unwrap_err();
    assert!(matches!(err, IndexError::InvalidParameter { ref parameter, .. } if parameter == "dimension"));
}

#[test]
fn test_scenario_bogus_entry_policy() {
    let err = create_from_request(&request(8, 10, "bogus")).unwrap_err();
    assert!(matches!(err, IndexError::InvalidEntryPolicy { ref name } if name == "bogus"));
    assert!(err.is_configuration_error());
}

#[test]
fn test_bogus_policy_reported_before_construction() {
    // A capacity that would make the engine fail to allocate.
    let mut req = request(1 << 40, i64::from(u32::MAX), "bogus");
    req.options.insert("max_edges_per_node".into(), serde_json::json!(1 << 20));
    let err = create_from_request(&req).unwrap_err();
    assert_eq!(err.error_code(), "InvalidEntryPolicy");
}

#[test]
fn test_zero_dimension_typed() {
    for key in VariantKey::all() {
        let err = create(key.metric, key.data_type, 0, 10, EntryPolicy::FirstNode, &no_options())
            .unwrap_err();
        assert_eq!(err.error_code(), "InvalidParameter");
    }
}

proptest! {
    #[test]
    fn prop_non_positive_dimension_is_invalid_parameter(
        dimension in i64::MIN..=0,
        capacity in any::<i64>(),
        metric in "[a-z_]{0,12}",
        data_type in "[a-z0-9]{0,8}",
        policy in "[a-z_]{0,14}",
    ) {
        let req = CreateRequest {
            metric,
            data_type,
            dimension,
            capacity,
            entry_policy: policy,
            options: ConfigurationMap::new(),
        };
        let err = create_from_request(&req).unwrap_err();
        prop_assert_eq!(err.error_code(), "InvalidParameter");
    }

    #[test]
    fn prop_unknown_policy_never_constructs(name in "[a-z]{1,16}") {
        prop_assume!(EntryPolicy::validate(&name).is_err());
        let err = create_from_request(&request(1 << 40, i64::from(u32::MAX), &name)).unwrap_err();
        prop_assert!(
            matches!(err, IndexError::InvalidEntryPolicy { .. }),
            "expected InvalidEntryPolicy, got {:?}",
            err
        );
    }
}

// ============================================================================
// Independence
// ============================================================================

#[test]
fn test_identical_requests_give_independent_handles() {
    let mut a = create(MetricType::L2, DataType::Float32, 2, 8, EntryPolicy::FirstNode, &no_options())
        .unwrap();
    let mut b = create(MetricType::L2, DataType::Float32, 2, 8, EntryPolicy::FirstNode, &no_options())
        .unwrap();

    a.add(&[1.0f32, 1.0, 2.0, 2.0], &[10, 11]).unwrap();
    assert_eq!(a.len(), 2);
    assert!(b.is_empty());
    assert!(b.search(&[1.0f32, 1.0], 1).unwrap().is_empty());

    b.add(&[5.0f32, 5.0], &[20]).unwrap();
    assert_eq!(a.search(&[5.0f32, 5.0], 1).unwrap()[0].label, 11);
    assert_eq!(b.search(&[1.0f32, 1.0], 1).unwrap()[0].label, 20);
}

#[test]
fn test_concurrent_creates_are_independent() {
    let handles: Vec<IndexHandle> = thread::scope(|s| {
        let workers: Vec<_> = (0..4u64)
            .map(|t| {
                s.spawn(move || {
                    let mut handle = create(
                        MetricType::L2,
                        DataType::Int8,
                        1,
                        4,
                        EntryPolicy::FirstNode,
                        &ConfigurationMap::new(),
                    )
                    .unwrap();
                    handle.add(&[t as i8], &[t]).unwrap();
                    handle
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    for (t, handle) in handles.iter().enumerate() {
        assert_eq!(handle.labels(), &[t as u64]);
    }
}

#[test]
fn test_concurrent_search_on_shared_handle() {
    let (handle, data) = filled(VariantKey::new(MetricType::L2, DataType::Float32), 50, 8, 3);
    let expected: Vec<_> = (0..50).map(|i| handle.search(data.row(i, 8), 3).unwrap()).collect();

    let handle = Arc::new(handle);
    let data = Arc::new(data);
    let expected = Arc::new(expected);
    let workers: Vec<_> = (0..4)
        .map(|t| {
            let handle = Arc::clone(&handle);
            let data = Arc::clone(&data);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                for i in (t..50).step_by(4) {
                    assert_eq!(handle.search(data.row(i, 8), 3).unwrap(), expected[i]);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_load_every_specialization() {
    let dir = TempDir::new().unwrap();
    let dim = 6;
    let n = 40;

    for (i, id) in SpecializationId::ALL.iter().enumerate() {
        let (handle, data) = filled(id.key(), n, dim, 100 + i as u64);
        let path = dir.path().join(format!("{}.vnav", id));
        handle.save(&path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.specialization(), *id);
        assert_eq!(loaded.dimension(), dim);
        assert_eq!(loaded.len(), n);
        assert_eq!(loaded.entry_policy(), EntryPolicy::SampledGreedy);

        for q in 0..5 {
            assert_eq!(
                loaded.search(data.row(q, dim), 5).unwrap(),
                handle.search(data.row(q, dim), 5).unwrap(),
                "results differ after reload for {}",
                id
            );
        }
    }
}

#[test]
fn test_handle_load_matches_factory_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.vnav");
    let (handle, _) = filled(VariantKey::new(MetricType::InnerProduct, DataType::Int8), 10, 4, 9);
    handle.save(&path).unwrap();

    let a = IndexHandle::load(&path).unwrap();
    let b = IndexFactory::new().load(&path).unwrap();
    assert_eq!(a.labels(), b.labels());
    assert_eq!(a.specialization(), SpecializationId::InnerProductInt8);
}

#[test]
fn test_load_respects_factory_catalog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.vnav");
    let key = VariantKey::new(MetricType::L2, DataType::UInt8);
    let (handle, _) = filled(key, 10, 4, 1);
    handle.save(&path).unwrap();

    let factory = IndexFactory::with_catalog(VariantCatalog::builtin().without(key));
    let err = factory.load(&path).unwrap_err();
    assert_eq!(err.error_code(), "UnsupportedCombination");
}

#[test]
fn test_load_garbage_is_engine_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.vnav");
    std::fs::write(&path, vec![0x42u8; 200]).unwrap();

    let err = load(&path).unwrap_err();
    assert_eq!(err.error_code(), "EngineError");
    assert!(!err.is_configuration_error());
}

// ============================================================================
// Handle operations
// ============================================================================

#[test]
fn test_reorder_through_handle() {
    let key = VariantKey::new(MetricType::L2, DataType::Float32);
    let (mut handle, data) = filled(key, 30, 4, 12);
    let before: Vec<_> = (0..30).map(|i| handle.search(data.row(i, 4), 1).unwrap()).collect();

    handle.reorder(ReorderStrategy::ReverseCuthillMckee);

    let after: Vec<_> = (0..30).map(|i| handle.search(data.row(i, 4), 1).unwrap()).collect();
    assert_eq!(before, after);
    assert_eq!(handle.len(), 30);
}

#[test]
fn test_capacity_is_fixed() {
    let mut handle = create(MetricType::L2, DataType::UInt8, 2, 2, EntryPolicy::Random, &no_options())
        .unwrap();
    handle.add(&[1u8, 2, 3, 4], &[1, 2]).unwrap();
    let err = handle.add(&[5u8, 6], &[3]).unwrap_err();
    assert_eq!(err.error_code(), "EngineError");
    assert_eq!(handle.len(), 2);
}

#[test]
fn test_k_widens_narrow_beam() {
    let mut options = ConfigurationMap::new();
    options.insert("max_edges_per_node".into(), serde_json::json!(32));
    let mut handle = create(
        MetricType::L2,
        DataType::Float32,
        4,
        20,
        EntryPolicy::SampledGreedy,
        &options,
    )
    .unwrap();
    let data = Data::random(DataType::Float32, 20, 4, 77);
    handle.add(data.all(), &(0..20u64).collect::<Vec<_>>()).unwrap();

    let results = handle.search_with_ef(data.row(7, 4), 20, 1).unwrap();
    assert_eq!(results.len(), 20);
    assert_eq!(results[0].label, 7);
}
