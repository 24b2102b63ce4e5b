//! Cross-backend properties of the standard lowering registry.

use qblower::compat::check_source;
use qblower::intrinsics::{Intrinsic, ValueType};
use qblower::lowering::{
    Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider, LoweringRegistry, Priority,
    UnitRequirements,
};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// A plausible argument fragment for parameter `index` of `intrinsic`.
fn fragment(backend: Backend, intrinsic: Intrinsic, index: usize) -> String {
    let ty = intrinsic
        .descriptor()
        .params
        .get(index)
        .map_or(ValueType::Any, |p| p.ty);
    match backend {
        Backend::Managed | Backend::Native => format!("a{}", index),
        Backend::Ir if ty == ValueType::Any => format!("i64 %a{}", index),
        Backend::Ir => format!("%a{}", index),
        Backend::Bytecode => format!("ldloc a{}", index),
    }
}

fn fragments(backend: Backend, intrinsic: Intrinsic, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| fragment(backend, intrinsic, i))
        .collect()
}

fn has_unresolved_slot(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.windows(3).any(|w| w == b"{r}")
        || bytes.windows(2).enumerate().any(|(i, w)| {
            w[0] == b'{'
                && w[1].is_ascii_digit()
                && bytes[i + 1..]
                    .iter()
                    .skip_while(|b| b.is_ascii_digit())
                    .next()
                    == Some(&b'}')
        })
}

fn supported_pairs(registry: &LoweringRegistry) -> Vec<(Backend, Intrinsic)> {
    Backend::ALL
        .into_iter()
        .flat_map(|backend| Intrinsic::all().map(move |i| (backend, i)))
        .filter(|(backend, i)| registry.supports(*backend, i.name()))
        .collect()
}

// ==================== Scenarios ====================

#[test]
fn test_managed_print_line_writes_a_line() {
    let registry = LoweringRegistry::standard();
    let provider = registry.resolve(Backend::Managed, "PRINTLINE").unwrap();
    assert_eq!(provider.backend(), Backend::Managed);

    let code = registry
        .emit(Backend::Managed, "PRINTLINE", &args(&["\"hi\""]))
        .unwrap();
    assert_eq!(code, "Console.WriteLine(\"hi\")");
}

#[test]
fn test_native_tcp_connect_is_unsupported() {
    let registry = LoweringRegistry::standard();
    assert!(registry.resolve(Backend::Native, "TcpConnect").is_none());
    assert!(!registry.supports(Backend::Native, "TcpConnect"));

    let err = registry
        .emit(Backend::Native, "TcpConnect", &args(&["h", "80"]))
        .unwrap_err();
    assert_eq!(
        err,
        LoweringError::UnsupportedOnBackend {
            name: "TcpConnect".to_string(),
            backend: Backend::Native,
        }
    );

    let diagnostics = check_source(&registry, Backend::Native, "s = TcpConnect(h$, 80)");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].error, err);
}

#[test]
fn test_ir_rnd_calls_synthesized_helper() {
    let registry = LoweringRegistry::standard();
    let code = registry.emit(Backend::Ir, "Rnd", &[]).unwrap();
    assert!(code.contains("@__bl_rnd"));

    let helper = registry.helper_definition(Backend::Ir, "Rnd").unwrap();
    assert_eq!(helper.name, "__bl_rnd");
    assert!(helper.body.contains("define internal double @__bl_rnd()"));
    assert!(helper.body.contains("@rand"));
    assert!(helper.body.contains("fdiv double"));
}

#[test]
fn test_bytecode_cint_is_one_conversion() {
    let registry = LoweringRegistry::standard();
    let code = registry.emit(Backend::Bytecode, "CInt", &args(&["x"])).unwrap();
    assert_eq!(code, "x\nconv.i4");
    assert!(!code.contains("call"));
    assert!(registry.helper_definition(Backend::Bytecode, "CInt").is_none());
}

#[test]
fn test_native_mid_uses_zero_based_start() {
    let registry = LoweringRegistry::standard();
    let code = registry
        .emit(Backend::Native, "Mid", &args(&["s", "3", "4"]))
        .unwrap();
    assert_eq!(code, "s.substr(3 - 1, 4)");
}

// ==================== Properties ====================

#[test]
fn test_every_supported_pair_emits_resolved_text() {
    let registry = LoweringRegistry::standard();
    for (backend, intrinsic) in supported_pairs(&registry) {
        let arity = intrinsic.arity();
        for count in [arity.min, arity.max] {
            let fragments = fragments(backend, intrinsic, count);
            let code = registry
                .emit(backend, intrinsic.name(), &fragments)
                .unwrap_or_else(|e| panic!("{} on {}: {}", intrinsic, backend, e));
            assert!(!code.trim().is_empty(), "{} on {}", intrinsic, backend);
            assert!(
                !has_unresolved_slot(&code),
                "{} on {} left a slot in {:?}",
                intrinsic,
                backend,
                code
            );
        }
    }
}

#[test]
fn test_same_operation_on_every_backend() {
    let registry = LoweringRegistry::standard();
    let lower = |backend: Backend, name: &str, values: &[&str]| {
        registry
            .emit_call(backend, name, &CallSite::new(&args(values)).with_result("%v"))
            .unwrap_or_else(|e| panic!("{} on {}: {}", name, backend, e))
    };

    let ucase = [
        (Backend::Managed, "\"abc\"", "ToUpperInvariant()"),
        (Backend::Native, "std::string(\"abc\")", "bl_ucase("),
        (Backend::Ir, "%abc", "@bl_str_ucase("),
        (Backend::Bytecode, "ldstr \"abc\"", "ToUpperInvariant()"),
    ];
    for (backend, text, operation) in ucase {
        let code = lower(backend, "UCase", &[text]);
        assert!(code.contains(operation), "{}: {}", backend, code);
        assert!(code.contains(text), "{}: {}", backend, code);
    }

    let abs = [
        (Backend::Managed, "-5.0", "Math.Abs("),
        (Backend::Native, "-5.0", "std::fabs("),
        (Backend::Ir, "-5.0", "@llvm.fabs.f64("),
        (Backend::Bytecode, "ldc.r8 -5.0", "System.Math::Abs(float64)"),
    ];
    for (backend, value, operation) in abs {
        let code = lower(backend, "Abs", &[value]);
        assert!(code.contains(operation), "{}: {}", backend, code);
    }

    // (list, item, create, add, count)
    let lists = [
        (Backend::Managed, "xs", "1", "new List<object>()", "xs.Add(1)", "xs.Count"),
        (
            Backend::Native,
            "xs",
            "1",
            "std::make_shared<std::vector<BasicValue>>()",
            "xs->push_back(",
            "xs->size()",
        ),
        (Backend::Ir, "%xs", "i64 %x", "@bl_list_new()", "@bl_list_add(ptr %xs", "@bl_list_count(ptr %xs)"),
        (
            Backend::Bytecode,
            "ldloc.0",
            "ldloc.1",
            "List`1<object>::.ctor()",
            "List`1<object>::Add(!0)",
            "List`1<object>::get_Count()",
        ),
    ];
    for (backend, list, item, create, add, count) in lists {
        let code = lower(backend, "CreateList", &[]);
        assert!(code.contains(create), "{}: {}", backend, code);
        let code = lower(backend, "ListAdd", &[list, item]);
        assert!(code.contains(add), "{}: {}", backend, code);
        let code = lower(backend, "ListCount", &[list]);
        assert!(code.contains(count), "{}: {}", backend, code);
    }
}

/// A call fragment that names its slot, for counting how often it is evaluated.
fn effect(backend: Backend, index: usize) -> String {
    match backend {
        Backend::Bytecode => format!("call int32 effect_{}_()", index),
        _ => format!("effect_{}_()", index),
    }
}

#[test]
fn test_no_argument_is_evaluated_twice() {
    let registry = LoweringRegistry::standard();
    for (backend, intrinsic) in supported_pairs(&registry) {
        // IR operands are SSA values, so reusing one never re-evaluates it.
        if backend == Backend::Ir {
            continue;
        }
        let count = intrinsic.arity().max;
        let fragments: Vec<String> = (0..count).map(|i| effect(backend, i)).collect();
        let code = registry.emit(backend, intrinsic.name(), &fragments).unwrap();
        for (index, fragment) in fragments.iter().enumerate() {
            assert!(
                code.matches(fragment.as_str()).count() <= 1,
                "{} on {} evaluates argument {} more than once in {:?}",
                intrinsic,
                backend,
                index,
                code
            );
        }
    }
}

#[test]
fn test_side_effecting_argument_appears_once() {
    let registry = LoweringRegistry::standard();

    let upper = registry
        .emit(Backend::Native, "UCase", &args(&["bl_input(\"? \")"]))
        .unwrap();
    let code = registry
        .emit(Backend::Native, "StrReverse", &args(&[&upper]))
        .unwrap();
    assert_eq!(code.matches("bl_input(").count(), 1, "{}", code);

    let code = registry
        .emit(Backend::Managed, "Left", &args(&["Console.ReadLine()", "3"]))
        .unwrap();
    assert_eq!(code.matches("ReadLine()").count(), 1, "{}", code);

    let code = registry
        .emit(
            Backend::Bytecode,
            "Left",
            &args(&["call string [mscorlib]System.Console::ReadLine()", "ldc.i4.3"]),
        )
        .unwrap();
    assert_eq!(code.matches("ReadLine()").count(), 1, "{}", code);
}

#[test]
fn test_asc_of_empty_string_is_zero_everywhere() {
    let registry = LoweringRegistry::standard();
    let managed = registry.helper_definition(Backend::Managed, "Asc").unwrap();
    assert!(managed.body.contains(": 0"), "{}", managed.body);
    let bytecode = registry.helper_definition(Backend::Bytecode, "Asc").unwrap();
    assert!(bytecode.body.contains("ldc.i4.0\n    ret"), "{}", bytecode.body);
    let native = registry.emit(Backend::Native, "Asc", &args(&["s"])).unwrap();
    assert!(native.contains("s[0]"), "{}", native);
}

#[test]
fn test_emission_is_deterministic() {
    let registry = LoweringRegistry::standard();
    let other = LoweringRegistry::standard();
    for (backend, intrinsic) in supported_pairs(&registry) {
        let fragments = fragments(backend, intrinsic, intrinsic.arity().max);
        let call = CallSite::new(&fragments).with_result("v");
        let first = registry.emit_call(backend, intrinsic.name(), &call);
        let second = registry.emit_call(backend, intrinsic.name(), &call);
        let third = other.emit_call(backend, intrinsic.name(), &call);
        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(
            registry.required_declarations(backend, intrinsic.name()),
            other.required_declarations(backend, intrinsic.name())
        );
    }
}

#[test]
fn test_arity_is_shared_across_backends() {
    let registry = LoweringRegistry::standard();
    for (backend, intrinsic) in supported_pairs(&registry) {
        let too_many = fragments(backend, intrinsic, intrinsic.arity().max + 1);
        let err = registry
            .emit(backend, intrinsic.name(), &too_many)
            .unwrap_err();
        assert!(
            matches!(err, LoweringError::ArityMismatch { .. }),
            "{} on {}: {}",
            intrinsic,
            backend,
            err
        );
        if intrinsic.arity().min > 0 {
            let too_few = fragments(backend, intrinsic, intrinsic.arity().min - 1);
            assert!(registry.emit(backend, intrinsic.name(), &too_few).is_err());
        }
    }
}

#[test]
fn test_categories_agree_across_backends() {
    let registry = LoweringRegistry::standard();
    for intrinsic in Intrinsic::all() {
        for backend in registry.backends_supporting(intrinsic.name()) {
            assert!(registry.supports(backend, &intrinsic.name().to_uppercase()));
        }
        assert_eq!(registry.category_of(intrinsic.name()), Some(intrinsic.category()));
    }
}

#[test]
fn test_string_core_supported_everywhere() {
    let registry = LoweringRegistry::standard();
    for name in ["Len", "Left", "Right", "Mid", "InStr", "UCase", "LCase", "Chr", "Asc"] {
        assert_eq!(
            registry.backends_supporting(name),
            Backend::ALL.to_vec(),
            "{}",
            name
        );
    }
}

#[test]
fn test_mid_from_one_spans_whole_string() {
    let registry = LoweringRegistry::standard();

    let len = registry.emit(Backend::Managed, "Len", &args(&["x"])).unwrap();
    let code = registry
        .emit(Backend::Managed, "Mid", &args(&["x", "1", &len]))
        .unwrap();
    assert_eq!(code, format!("__blMid(x, 1 - 1, {})", len));

    let len = registry.emit(Backend::Native, "Len", &args(&["x"])).unwrap();
    let code = registry
        .emit(Backend::Native, "Mid", &args(&["x", "1", &len]))
        .unwrap();
    assert_eq!(code, format!("x.substr(1 - 1, {})", len));
}

#[test]
fn test_one_based_index_adjustment_in_every_backend() {
    let registry = LoweringRegistry::standard();

    let managed = registry.emit(Backend::Managed, "InStr", &args(&["s", "t"])).unwrap();
    assert!(managed.ends_with("+ 1)"));
    let native = registry.emit(Backend::Native, "InStr", &args(&["s", "t"])).unwrap();
    assert!(native.contains("+ 1"));

    let ir = registry
        .emit_call(Backend::Ir, "Mid", &CallSite::new(&args(&["%s", "%i", "%n"])))
        .unwrap();
    assert!(ir.contains("sub i64") || ir.contains("sub i32"), "{}", ir);

    let cil = registry
        .emit(Backend::Bytecode, "Mid", &args(&["ldloc.0", "ldloc.1", "ldloc.2"]))
        .unwrap();
    assert!(cil.contains("ldc.i4.1\nsub"), "{}", cil);
}

#[test]
fn test_helper_injected_once_per_unit() {
    let registry = LoweringRegistry::standard();
    for backend in Backend::ALL {
        let mut unit = UnitRequirements::new(backend);
        let mut first = UnitRequirements::new(backend);
        for name in ["Rnd", "Timer", "Val", "Str", "Rnd", "Timer", "Val", "Str"] {
            if registry.supports(backend, name) {
                unit.note(&registry, name).unwrap();
            }
        }
        for name in ["Rnd", "Timer", "Val", "Str"] {
            if registry.supports(backend, name) {
                first.note(&registry, name).unwrap();
            }
        }
        assert_eq!(unit.render_preamble(), first.render_preamble(), "{}", backend);

        let mut names: Vec<_> = unit.helpers().iter().map(|h| h.name).collect();
        let total = names.len();
        names.dedup();
        assert_eq!(names.len(), total, "{}", backend);
    }
}

#[test]
fn test_uninitialized_registry_resolves_nothing() {
    let mut registry = LoweringRegistry::new();
    assert!(!registry.supports(Backend::Managed, "Len"));
    registry.ensure_initialized();
    registry.ensure_initialized();
    assert!(registry.supports(Backend::Managed, "Len"));
    assert_eq!(registry.provider_count(Backend::Managed), 2);
    assert_eq!(registry.provider_count(Backend::Ir), 1);
}

// ==================== Shadowing ====================

struct Stub {
    name: &'static str,
    text: &'static str,
}

impl LoweringProvider for Stub {
    fn name(&self) -> &str {
        self.name
    }

    fn backend(&self) -> Backend {
        Backend::Ir
    }

    fn handles(&self, intrinsic: Intrinsic) -> bool {
        intrinsic == Intrinsic::Len
    }

    fn emit(&self, _intrinsic: Intrinsic, _call: &CallSite<'_>) -> Result<String, LoweringError> {
        Ok(self.text.to_string())
    }

    fn required_declarations(&self, _intrinsic: Intrinsic) -> Vec<String> {
        Vec::new()
    }

    fn helper_definition(&self, _intrinsic: Intrinsic) -> Option<HelperRoutine> {
        None
    }
}

#[test]
fn test_first_registered_wins_within_a_tier() {
    let mut registry = LoweringRegistry::new();
    registry.register(Priority::General, Box::new(Stub { name: "a", text: "A" }));
    registry.register(Priority::General, Box::new(Stub { name: "b", text: "B" }));
    assert_eq!(registry.resolve(Backend::Ir, "Len").unwrap().name(), "a");
    assert_eq!(registry.emit(Backend::Ir, "Len", &args(&["%s"])).unwrap(), "A");
}

#[test]
fn test_specialized_tier_shadows_general() {
    let mut registry = LoweringRegistry::new();
    registry.register(Priority::General, Box::new(Stub { name: "a", text: "A" }));
    registry.register(Priority::Specialized, Box::new(Stub { name: "b", text: "B" }));
    assert_eq!(registry.resolve(Backend::Ir, "Len").unwrap().name(), "b");
}

#[test]
fn test_stub_before_standard_providers_shadows_them() {
    let mut registry = LoweringRegistry::new();
    registry.register(Priority::General, Box::new(Stub { name: "a", text: "A" }));
    registry.ensure_initialized();
    assert_eq!(registry.emit(Backend::Ir, "Len", &args(&["%s"])).unwrap(), "A");
    assert!(registry.supports(Backend::Ir, "Abs"));
}
