//! End-to-end dispatch tests through the `Interop` facade.
//!
//! Each test registers a small set of host procedures and calls them the way
//! a guest would: by name, with guest values.

mod common;

use std::sync::Arc;

use common::{Calls, call, failing, init_tracing, tagged};
use hostbridge::{
    ConversionEngine, EnumType, FunctionShape, GuestError, GuestErrorKind, GuestValue, HostError,
    HostType, HostValue, Interop, InteropError, InteropOptions, NO_MATCHING_OVERLOAD, PassOrder,
    ProcedureBuilder, ProcedureRegistry,
};

// =============================================================================
// Overload selection
// =============================================================================

#[test]
fn test_int_string_beats_string_string() {
    init_tracing();
    let mut registry = ProcedureRegistry::new();
    tagged(&mut registry, "pick", &[HostType::STRING, HostType::STRING], "string,string");
    tagged(&mut registry, "pick", &[HostType::INT32, HostType::STRING], "int,string");
    let interop = Interop::new(registry);

    let args = [GuestValue::Number(1.0), GuestValue::from("x")];
    let via_dispatch = call(&interop, "pick", &args).unwrap();
    assert_eq!(via_dispatch, GuestValue::from("int,string"));

    // Same result as invoking the chosen overload on its own
    let mut direct = ProcedureRegistry::new();
    tagged(&mut direct, "pick", &[HostType::INT32, HostType::STRING], "int,string");
    let direct = Interop::new(direct);
    assert_eq!(call(&direct, "pick", &args).unwrap(), via_dispatch);
}

#[test]
fn test_selection_is_deterministic() {
    let mut registry = ProcedureRegistry::new();
    tagged(&mut registry, "f", &[HostType::Any], "any");
    tagged(&mut registry, "f", &[HostType::FLOAT64], "double");
    tagged(&mut registry, "f", &[HostType::INT64], "long");
    let interop = Interop::new(registry);

    for _ in 0..20 {
        assert_eq!(call(&interop, "f", &[GuestValue::Number(2.0)]).unwrap(), GuestValue::from("double"));
        assert_eq!(call(&interop, "f", &[GuestValue::from("s")]).unwrap(), GuestValue::from("any"));
    }
}

#[test]
fn test_arity_selects_overload() {
    let mut registry = ProcedureRegistry::new();
    tagged(&mut registry, "f", &[], "none");
    tagged(&mut registry, "f", &[HostType::STRING], "one");
    tagged(&mut registry, "f", &[HostType::STRING, HostType::STRING], "two");
    let interop = Interop::new(registry);

    assert_eq!(call(&interop, "f", &[]).unwrap(), GuestValue::from("none"));
    assert_eq!(call(&interop, "f", &["a".into()]).unwrap(), GuestValue::from("one"));
    assert_eq!(call(&interop, "f", &["a".into(), "b".into()]).unwrap(), GuestValue::from("two"));

    let err = call(&interop, "f", &["a".into(), "b".into(), "c".into()]).unwrap_err();
    assert!(matches!(err, InteropError::NoMatchingOverload { arg_count: 3, .. }));
}

#[test]
fn test_no_match_is_guest_type_error() {
    let mut registry = ProcedureRegistry::new();
    tagged(&mut registry, "f", &[HostType::INT32], "int");
    let interop = Interop::new(registry);

    let err = call(&interop, "f", &[GuestValue::from("not a number")]).unwrap_err();
    let guest = err.to_guest_error();
    assert_eq!(guest.kind, GuestErrorKind::TypeError);
    assert_eq!(guest.message, NO_MATCHING_OVERLOAD);
}

#[test]
fn test_enum_parameters() {
    let color = EnumType::new("Color", [("Red", 0), ("Green", 1), ("Blue", 2)]);
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("name_of")
        .param(HostType::Enum(color.clone()))
        .returns(HostType::STRING)
        .native(move |ctx| {
            let name = match ctx.arg_value(0)? {
                HostValue::Enum { ty, value } => ty.member_name(*value).unwrap_or("?").to_string(),
                other => return Err(HostError::failed(format!("unexpected {:?}", other))),
            };
            ctx.set_return(name);
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    assert_eq!(call(&interop, "name_of", &[2.into()]).unwrap(), GuestValue::from("Blue"));
    assert!(call(&interop, "name_of", &[9.into()]).is_err());
}

// =============================================================================
// Variadic folding
// =============================================================================

fn counting_registry() -> ProcedureRegistry {
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("count")
        .param(HostType::STRING)
        .param(HostType::STRING)
        .param(HostType::array(HostType::Any))
        .variadic()
        .returns(HostType::INT32)
        .native(|ctx| {
            let rest: Vec<HostValue> = ctx.arg(2)?;
            ctx.set_return(rest.len() as i32);
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    registry
}

#[test]
fn test_trailing_arguments_are_packed() {
    let interop = Interop::new(counting_registry());
    let args: Vec<GuestValue> = vec!["a".into(), "b".into(), 1.into(), 2.into(), 3.into()];
    assert_eq!(call(&interop, "count", &args).unwrap(), GuestValue::Number(3.0));
}

#[test]
fn test_single_trailing_array_passes_through() {
    let interop = Interop::new(counting_registry());
    let tail = GuestValue::array((1..=4).map(GuestValue::from));
    let args = vec!["a".into(), "b".into(), tail];
    assert_eq!(call(&interop, "count", &args).unwrap(), GuestValue::Number(4.0));
}

#[test]
fn test_empty_variadic_tail() {
    let interop = Interop::new(counting_registry());
    assert_eq!(call(&interop, "count", &["a".into(), "b".into()]).unwrap(), GuestValue::Number(0.0));
}

#[test]
fn test_guest_args_variadic_with_context() {
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("join")
        .context()
        .param(HostType::STRING)
        .param(HostType::GuestArgs)
        .variadic()
        .returns(HostType::STRING)
        .native(|ctx| {
            ctx.context_as::<ConversionEngine>()?;
            let sep: String = ctx.arg(0)?;
            let parts: Vec<String> = match ctx.arg_value(1)? {
                HostValue::GuestArgs(items) => items
                    .iter()
                    .map(|v| match v {
                        GuestValue::String(s) => s.to_string(),
                        GuestValue::Number(n) => n.to_string(),
                        other => other.type_name().to_string(),
                    })
                    .collect(),
                other => return Err(HostError::failed(format!("unexpected {:?}", other))),
            };
            ctx.set_return(parts.join(&sep));
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    let result = call(&interop, "join", &["-".into(), "a".into(), 1.into(), GuestValue::Undefined]).unwrap();
    assert_eq!(result, GuestValue::from("a-1-undefined"));
}

// =============================================================================
// Calling conventions and access control
// =============================================================================

#[test]
fn test_access_denied_sole_candidate() {
    let calls = Calls::default();
    let mut registry = ProcedureRegistry::new();
    let counter = calls.clone();
    ProcedureBuilder::new("secret")
        .param(HostType::INT32)
        .deny_access()
        .native(move |_| {
            counter.hit();
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    let err = call(&interop, "secret", &[1.into()]).unwrap_err();
    assert!(matches!(err, InteropError::NoMatchingOverload { .. }));
    assert_eq!(calls.count(), 0);
}

#[test]
fn test_access_denied_falls_back_to_allowed_overload() {
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("f")
        .param(HostType::FLOAT64)
        .deny_access()
        .native(|_| Err(HostError::failed("must not run")))
        .register(&mut registry)
        .unwrap();
    tagged(&mut registry, "f", &[HostType::STRING], "allowed");
    let interop = Interop::new(registry);

    assert_eq!(call(&interop, "f", &[1.into()]).unwrap(), GuestValue::from("allowed"));
}

fn both_conventions() -> ProcedureRegistry {
    let mut registry = ProcedureRegistry::new();
    tagged(&mut registry, "f", &[HostType::INT32], "direct");
    ProcedureBuilder::new("f")
        .context()
        .param(HostType::INT32)
        .returns(HostType::STRING)
        .native(|ctx| {
            ctx.set_return("context");
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    registry
}

#[test]
fn test_context_pass_runs_first_by_default() {
    let interop = Interop::new(both_conventions());
    assert_eq!(call(&interop, "f", &[1.into()]).unwrap(), GuestValue::from("context"));
}

#[test]
fn test_direct_first_pass_order() {
    let interop = Interop::builder(both_conventions())
        .options(InteropOptions::default().with_pass_order(PassOrder::DirectFirst))
        .build();
    assert_eq!(call(&interop, "f", &[1.into()]).unwrap(), GuestValue::from("direct"));
}

#[test]
fn test_custom_context_value() {
    struct Host {
        greeting: &'static str,
    }

    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("greet")
        .context()
        .returns(HostType::STRING)
        .native(|ctx| {
            let host = ctx.context_as::<Host>()?;
            ctx.set_return(host.greeting);
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::builder(registry)
        .context(Arc::new(Host { greeting: "hello" }))
        .build();

    assert_eq!(call(&interop, "greet", &[]).unwrap(), GuestValue::from("hello"));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_failure_without_translator_is_unwrapped() {
    let mut registry = ProcedureRegistry::new();
    failing(&mut registry, "boom", "disk full");
    let interop = Interop::new(registry);

    let err = call(&interop, "boom", &[]).unwrap_err();
    assert_eq!(err, InteropError::Host(HostError::failed("disk full")));
    assert_eq!(err.to_guest_error(), GuestError::error("disk full"));
}

#[test]
fn test_translator_declines() {
    let mut registry = ProcedureRegistry::new();
    failing(&mut registry, "boom", "disk full");
    let interop = Interop::builder(registry)
        .options(InteropOptions::default().with_exception_translator(|_: &HostError| false))
        .build();

    assert_eq!(
        call(&interop, "boom", &[]).unwrap_err(),
        InteropError::Host(HostError::failed("disk full"))
    );
}

#[test]
fn test_translator_accepts() {
    let mut registry = ProcedureRegistry::new();
    failing(&mut registry, "boom", "disk full");
    let interop = Interop::builder(registry)
        .options(InteropOptions::default().with_exception_translator(|e: &HostError| {
            matches!(e, HostError::Failed { .. })
        }))
        .build();

    let err = call(&interop, "boom", &[]).unwrap_err();
    assert_eq!(err, InteropError::Guest(GuestError::error("disk full")));
}

#[test]
fn test_panicking_procedure() {
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("panics")
        .native(|_| panic!("bad state"))
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    assert_eq!(
        call(&interop, "panics", &[]).unwrap_err(),
        InteropError::Host(HostError::Panic {
            message: "bad state".into()
        })
    );
}

#[test]
fn test_guest_error_from_callback_propagates() {
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("run")
        .param(HostType::Function(FunctionShape::Action))
        .native(|ctx| {
            let callback: hostbridge::Adapter = ctx.arg(0)?;
            callback.invoke(&[])?;
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    let thrower = GuestValue::function(|_: &GuestValue, _: &[GuestValue]| {
        Err(GuestError::range_error("too far"))
    });
    let err = call(&interop, "run", &[thrower]).unwrap_err();
    assert_eq!(err.to_guest_error(), GuestError::range_error("too far"));
}

// =============================================================================
// Callbacks and adapters
// =============================================================================

#[test]
fn test_host_procedure_calls_back_into_guest() {
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("apply")
        .param(HostType::Function(FunctionShape::func(
            vec![HostType::INT32, HostType::INT32],
            HostType::INT32,
        )))
        .param(HostType::INT32)
        .param(HostType::INT32)
        .returns(HostType::INT32)
        .native(|ctx| {
            let f: hostbridge::Adapter = ctx.arg(0)?;
            let add = f.typed::<(i32, i32), i32>()?;
            let result = add.call((ctx.arg(1)?, ctx.arg(2)?))?;
            ctx.set_return(result);
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    let sum = GuestValue::function(|_: &GuestValue, args: &[GuestValue]| {
        Ok(GuestValue::Number(args.iter().filter_map(GuestValue::as_number).sum()))
    });
    assert_eq!(
        call(&interop, "apply", &[sum.clone(), 2.into(), 3.into()]).unwrap(),
        GuestValue::Number(5.0)
    );
    assert_eq!(
        call(&interop, "apply", &[sum, 10.into(), 20.into()]).unwrap(),
        GuestValue::Number(30.0)
    );
}

#[test]
fn test_adapter_returned_to_guest_is_original_callable() {
    let shape = FunctionShape::action(vec![HostType::STRING]);
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("identity")
        .param(HostType::Function(shape.clone()))
        .returns(HostType::Function(shape))
        .native(|ctx| {
            let f = ctx.arg_value(0)?.clone();
            ctx.set_return_value(f);
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    let f = GuestValue::function(|_: &GuestValue, _: &[GuestValue]| Ok(GuestValue::Undefined));
    assert_eq!(call(&interop, "identity", &[f.clone()]).unwrap(), f);
}

#[test]
fn test_custom_callable_conversion_first_wins() {
    let shape = FunctionShape::func(vec![], HostType::STRING);
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("run")
        .param(HostType::Function(shape.clone()))
        .returns(HostType::STRING)
        .native(|ctx| {
            let f: hostbridge::Adapter = ctx.arg(0)?;
            let result = f.invoke(&[])?;
            ctx.set_return_value(result);
            Ok(())
        })
        .register(&mut registry)
        .unwrap();

    let first = shape.clone();
    let second = shape.clone();
    let interop = Interop::builder(registry)
        .callable_conversion(shape.clone(), move |f| {
            Ok(hostbridge::Adapter::new(first.clone(), Some(f.clone()), |_| {
                Ok(HostValue::String("custom".into()))
            }))
        })
        .callable_conversion(shape, move |f| {
            Ok(hostbridge::Adapter::new(second.clone(), Some(f.clone()), |_| {
                Ok(HostValue::String("ignored".into()))
            }))
        })
        .build();

    let f = GuestValue::function(|_: &GuestValue, _: &[GuestValue]| Ok(GuestValue::from("guest")));
    assert_eq!(call(&interop, "run", &[f]).unwrap(), GuestValue::from("custom"));
}

#[test]
fn test_guest_parameters_receive_values_unconverted() {
    let mut registry = ProcedureRegistry::new();
    ProcedureBuilder::new("echo")
        .param(HostType::Guest)
        .returns(HostType::Guest)
        .native(|ctx| {
            let v: GuestValue = ctx.arg(0)?;
            ctx.set_return(v);
            Ok(())
        })
        .register(&mut registry)
        .unwrap();
    let interop = Interop::new(registry);

    let array = GuestValue::array([GuestValue::Null, "x".into()]);
    assert_eq!(call(&interop, "echo", &[array.clone()]).unwrap(), array);
    assert_eq!(call(&interop, "echo", &[GuestValue::Undefined]).unwrap(), GuestValue::Undefined);
}

#[test]
fn test_interop_is_shareable_across_threads() {
    let mut registry = ProcedureRegistry::new();
    tagged(&mut registry, "f", &[HostType::INT32], "int");
    let interop = Interop::new(registry);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let interop = interop.clone();
            std::thread::spawn(move || {
                for j in 0..50 {
                    let n = GuestValue::Number((i * 50 + j) as f64);
                    assert_eq!(call(&interop, "f", &[n]).unwrap(), GuestValue::from("int"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(interop.engine().cache_len(), 1);
}
