//! Conversion engine properties and cache behavior.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak, mpsc};
use std::thread;
use std::time::Duration;

use hostbridge::{
    Adapter, ConversionEngine, ConversionError, FunctionShape, GuestFunction, GuestValue,
    HostType, HostValue, PrimitiveKind,
};
use proptest::prelude::*;

const PRIMITIVES: [PrimitiveKind; 13] = [
    PrimitiveKind::Bool,
    PrimitiveKind::Char,
    PrimitiveKind::Int8,
    PrimitiveKind::Int16,
    PrimitiveKind::Int32,
    PrimitiveKind::Int64,
    PrimitiveKind::UInt8,
    PrimitiveKind::UInt16,
    PrimitiveKind::UInt32,
    PrimitiveKind::UInt64,
    PrimitiveKind::Float32,
    PrimitiveKind::Float64,
    PrimitiveKind::String,
];

fn primitive() -> impl Strategy<Value = HostType> {
    prop::sample::select(PRIMITIVES.to_vec()).prop_map(HostType::Primitive)
}

fn guest_scalar() -> impl Strategy<Value = GuestValue> {
    prop_oneof![
        Just(GuestValue::Undefined),
        Just(GuestValue::Null),
        any::<bool>().prop_map(GuestValue::Boolean),
        any::<f64>().prop_map(GuestValue::Number),
        (-1000i32..1000).prop_map(GuestValue::from),
        "[a-z0-9 .-]{0,6}".prop_map(GuestValue::from),
    ]
}

proptest! {
    #[test]
    fn converted_values_satisfy_target(value in guest_scalar(), target in primitive()) {
        let engine = ConversionEngine::new();
        if let Ok(converted) = engine.convert(&value.to_host(), &target) {
            prop_assert!(converted.is_null() || converted.satisfies(&target));
        }
    }

    #[test]
    fn cached_outcome_is_stable(value in guest_scalar(), target in primitive()) {
        let engine = ConversionEngine::new();
        let host = value.to_host();
        let first = engine.try_convert(&host, &target).is_some();
        for _ in 0..3 {
            prop_assert_eq!(engine.try_convert(&host, &target).is_some(), first);
            prop_assert_eq!(engine.cached_outcome(&host, &target), Some(first));
        }
    }

    #[test]
    fn integers_round_trip(v in any::<i32>()) {
        let engine = ConversionEngine::new();
        let guest = GuestValue::from_host(HostValue::I32(v));
        prop_assert!(matches!(
            engine.convert(&guest.to_host(), &HostType::INT32),
            Ok(HostValue::I32(back)) if back == v
        ));
    }

    #[test]
    fn unsigned_round_trip(v in any::<u16>()) {
        let engine = ConversionEngine::new();
        let guest = GuestValue::from_host(HostValue::U16(v));
        prop_assert!(matches!(
            engine.convert(&guest.to_host(), &HostType::UINT16),
            Ok(HostValue::U16(back)) if back == v
        ));
    }

    #[test]
    fn wide_integers_round_trip(v in -(1i64 << 53)..(1i64 << 53)) {
        let engine = ConversionEngine::new();
        let guest = GuestValue::from_host(HostValue::I64(v));
        prop_assert!(matches!(
            engine.convert(&guest.to_host(), &HostType::INT64),
            Ok(HostValue::I64(back)) if back == v
        ));
    }

    #[test]
    fn strings_round_trip(s in ".*") {
        let engine = ConversionEngine::new();
        let guest = GuestValue::from_host(HostValue::String(s.clone()));
        prop_assert!(matches!(
            engine.convert(&guest.to_host(), &HostType::STRING),
            Ok(HostValue::String(back)) if back == s
        ));
    }

    #[test]
    fn bools_round_trip(b in any::<bool>()) {
        let engine = ConversionEngine::new();
        let guest = GuestValue::from_host(HostValue::Bool(b));
        prop_assert!(matches!(
            engine.convert(&guest.to_host(), &HostType::BOOL),
            Ok(HostValue::Bool(back)) if back == b
        ));
    }
}

#[test]
fn test_cached_outcome_with_side_effecting_conversion() {
    common::init_tracing();
    let engine = ConversionEngine::new();
    let shape = FunctionShape::func(vec![], HostType::INT32);
    let runs = Arc::new(AtomicUsize::new(0));
    {
        let runs = Arc::clone(&runs);
        let adapter_shape = shape.clone();
        engine.register_callable_conversion(&shape, move |f: &GuestFunction| {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(Adapter::new(adapter_shape.clone(), Some(f.clone()), |_| Ok(HostValue::I32(0))))
        });
    }
    let target = HostType::Function(shape);

    // Distinct callables miss the adapter cache, so every true hit reruns the conversion
    for expected_runs in 1..=3 {
        let f = GuestFunction::new(|_: &GuestValue, _: &[GuestValue]| Ok(GuestValue::Undefined));
        assert!(engine.try_convert(&HostValue::Callable(f), &target).is_some());
        assert_eq!(runs.load(Ordering::SeqCst), expected_runs);
    }
    assert_eq!(engine.cache_len(), 1);
}

#[test]
fn test_false_outcome_is_sticky_per_type_pair() {
    let engine = ConversionEngine::new();
    let bad = HostValue::String("abc".into());
    let good = HostValue::String("12".into());

    assert!(engine.try_convert(&bad, &HostType::INT32).is_none());
    // Same runtime type pair: no attempt is made
    assert!(engine.try_convert(&good, &HostType::INT32).is_none());
    // The uncached path still converts
    assert!(matches!(engine.convert(&good, &HostType::INT32), Ok(HostValue::I32(12))));
}

#[test]
fn test_independent_engines_do_not_share_caches() {
    let a = ConversionEngine::new();
    let b = ConversionEngine::new();
    a.try_convert(&HostValue::F64(1.0), &HostType::INT32);
    assert_eq!(a.cache_len(), 1);
    assert_eq!(b.cache_len(), 0);
}

#[test]
fn test_adapter_instances_are_reused() {
    let engine = ConversionEngine::new();
    let f = GuestFunction::new(|_: &GuestValue, _: &[GuestValue]| Ok(GuestValue::Number(1.0)));
    let target = HostType::Function(FunctionShape::func(vec![], HostType::FLOAT64));

    let adapters: Vec<Adapter> = (0..3)
        .map(|_| match engine.convert(&HostValue::Callable(f.clone()), &target) {
            Ok(HostValue::Function(adapter)) => adapter,
            other => panic!("expected adapter, got {:?}", other),
        })
        .collect();
    assert!(adapters.windows(2).all(|w| w[0].ptr_eq(&w[1])));
    assert_eq!(engine.adapters().len(), 1);
}

#[test]
fn test_array_element_failure_reports_index() {
    let engine = ConversionEngine::new();
    let guest = GuestValue::array([GuestValue::from("1"), GuestValue::from("two")]);
    let err = engine
        .convert(&guest.to_host(), &HostType::array(HostType::INT32))
        .unwrap_err();
    assert!(matches!(err, ConversionError::ArrayElement { index: 1, .. }));
}

#[test]
fn test_custom_conversion_may_convert_through_its_engine() {
    common::init_tracing();
    let engine = Arc::new(ConversionEngine::new());
    let shape = FunctionShape::func(vec![], HostType::INT32);
    {
        let weak: Weak<ConversionEngine> = Arc::downgrade(&engine);
        let nested = AtomicUsize::new(0);
        let adapter_shape = shape.clone();
        engine.register_callable_conversion(&shape, move |f: &GuestFunction| {
            // A fresh pair on every call, so the nested lookup always populates the cache
            let targets = [HostType::INT8, HostType::INT16, HostType::INT64, HostType::UINT8];
            let target = &targets[nested.fetch_add(1, Ordering::SeqCst) % targets.len()];
            let engine = weak
                .upgrade()
                .ok_or_else(|| ConversionError::custom("engine dropped"))?;
            engine
                .try_convert(&HostValue::F64(1.0), target)
                .ok_or_else(|| ConversionError::custom("nested conversion failed"))?;
            Ok(Adapter::new(adapter_shape.clone(), Some(f.clone()), |_| Ok(HostValue::I32(7))))
        });
    }

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(&engine);
    thread::spawn(move || {
        let target = HostType::Function(shape);
        let callable = || GuestFunction::new(|_: &GuestValue, _: &[GuestValue]| Ok(GuestValue::Undefined));
        // The first call populates the pair; the second is a cached true hit that replays
        let first = worker.try_convert(&HostValue::Callable(callable()), &target).is_some();
        let second = worker.try_convert(&HostValue::Callable(callable()), &target).is_some();
        tx.send((first, second)).ok();
    });

    let outcome = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("nested conversion blocked on the cache");
    assert_eq!(outcome, (true, true));
    assert_eq!(engine.cached_outcome(&HostValue::F64(1.0), &HostType::INT8), Some(true));
    assert_eq!(engine.cached_outcome(&HostValue::F64(1.0), &HostType::INT16), Some(true));
}
