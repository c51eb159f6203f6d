//! Engine-level properties checked over generated call graphs: cleaning is
//! safe, converges to a sound fixpoint, terminates within its bound, and is
//! idempotent.

use deadsweep::{Cleaner, NodeId, ReferenceIndex, Scope, SourceModel, Span, Visibility};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct MethodSpec {
    visibility: Visibility,
    annotated: bool,
    callees: Vec<usize>,
}

fn visibility_strategy() -> impl Strategy<Value = Visibility> {
    prop_oneof![
        3 => Just(Visibility::Private),
        1 => Just(Visibility::Module),
        1 => Just(Visibility::Public),
    ]
}

fn methods_strategy() -> impl Strategy<Value = Vec<MethodSpec>> {
    prop::collection::vec(
        (
            visibility_strategy(),
            any::<bool>(),
            prop::collection::vec(0usize..16, 0..4),
        ),
        1..12,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .map(|(visibility, annotated, callees)| MethodSpec {
                visibility,
                annotated,
                callees,
            })
            .collect()
    })
}

fn build_model(specs: &[MethodSpec]) -> (SourceModel, NodeId, Vec<NodeId>) {
    let mut model = SourceModel::new();
    let unit = model.add_unit("Generated", Span::new(1, 10 * specs.len() + 10));

    let methods: Vec<NodeId> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let start = 3 + i * 5;
            let annotations: &[&str] = if spec.annotated { &["Marker"] } else { &[] };
            model
                .add_method(
                    unit,
                    &format!("m{i}"),
                    spec.visibility,
                    false,
                    annotations,
                    Span::new(start, start + 3),
                )
                .unwrap()
        })
        .collect();

    for (i, spec) in specs.iter().enumerate() {
        let body = model.method_body(methods[i]).unwrap();
        for (j, &callee) in spec.callees.iter().enumerate() {
            let target = methods[callee % methods.len()];
            let line = 4 + i * 5 + j;
            let call = model.new_call(target, vec![], Span::line(line));
            model.add_expr_stmt(body, call, Span::line(line)).unwrap();
        }
    }
    (model, unit, methods)
}

proptest! {
    #[test]
    fn cleaning_never_touches_protected_methods(specs in methods_strategy()) {
        let (mut model, unit, methods) = build_model(&specs);
        let (_, failure) = Cleaner::default().clean_unit(&mut model, unit);
        prop_assert!(failure.is_none());

        for (spec, &method) in specs.iter().zip(&methods) {
            let protected = spec.annotated || spec.visibility != Visibility::Private;
            if protected {
                prop_assert!(
                    !model.is_detached(method),
                    "protected method {:?} was deleted",
                    model.symbol_name(method)
                );
            }
        }
    }

    #[test]
    fn result_is_a_fixpoint_of_the_safety_policy(specs in methods_strategy()) {
        let (mut model, unit, methods) = build_model(&specs);
        let (_, failure) = Cleaner::default().clean_unit(&mut model, unit);
        prop_assert!(failure.is_none());

        let index = ReferenceIndex::new(&model);
        for (spec, &method) in specs.iter().zip(&methods) {
            if model.is_detached(method) {
                continue;
            }
            let still_deletable = spec.visibility == Visibility::Private
                && !spec.annotated
                && !index.has_reference(method, Scope::Local(unit));
            prop_assert!(
                !still_deletable,
                "dead method {:?} survived cleaning",
                model.symbol_name(method)
            );
        }
    }

    #[test]
    fn rounds_are_bounded_by_deletable_symbols(specs in methods_strategy()) {
        let (mut model, unit, _) = build_model(&specs);
        let (summary, failure) = Cleaner::default().clean_unit(&mut model, unit);
        prop_assert!(failure.is_none());
        // each productive round deletes at least one symbol, plus the final
        // round that observes the fixpoint
        prop_assert!(summary.rounds <= specs.len() + 1);
        prop_assert!(summary.symbols_removed <= specs.len());
    }

    #[test]
    fn cleaning_is_idempotent(specs in methods_strategy()) {
        let (mut model, unit, _) = build_model(&specs);
        let cleaner = Cleaner::default();
        let (_, failure) = cleaner.clean_unit(&mut model, unit);
        prop_assert!(failure.is_none());
        let (rerun, failure) = cleaner.clean_unit(&mut model, unit);
        prop_assert!(failure.is_none());
        prop_assert!(!rerun.changed());
        prop_assert_eq!(rerun.rounds, 1);
    }
}
