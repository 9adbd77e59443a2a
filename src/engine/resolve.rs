//! Multi-pass variable resolution over the implicit dependency graph.
//!
//! Templates declare variables in any order; each pass runs every
//! instruction whose dependencies are available. The pass bound covers
//! the worst-case chain (one new variable per pass) plus slack, so a
//! cyclic or missing dependency stalls quickly instead of looping.

use crate::catalog::{VarDecl, VarSpec};
use crate::engine::value::{Environment, ResolveFault, Value};
use rand::Rng;
use tracing::warn;

const EXTRA_PASSES: usize = 3;

/// Resolves every declared variable into an environment.
///
/// Never fails: variables that cannot be produced are entered as fault
/// sentinels so the caller can still render a degraded question.
pub fn resolve_variables<R: Rng>(declarations: &[VarDecl], rng: &mut R) -> Environment {
    let mut env = Environment::new();
    let mut pending: Vec<&VarDecl> = declarations.iter().collect();
    let max_passes = declarations.len() + EXTRA_PASSES;

    for _ in 0..max_passes {
        if pending.is_empty() {
            break;
        }

        let mut resolved_this_pass = 0;
        let mut still_pending = Vec::new();

        for decl in pending {
            match &decl.spec {
                VarSpec::Literal { value } => {
                    env.insert(decl.name.clone(), value.clone());
                    resolved_this_pass += 1;
                }
                VarSpec::Generated(kind) if kind.is_unknown() => {
                    warn!(variable = %decl.name, "unknown generator kind");
                    env.insert(decl.name.clone(), Value::Fault(ResolveFault::UnknownGenerator));
                    resolved_this_pass += 1;
                }
                VarSpec::Generated(kind) => {
                    let ready = kind.dependencies().iter().all(|dep| env.contains(dep));
                    if !ready {
                        still_pending.push(decl);
                        continue;
                    }
                    match kind.run(&env, rng) {
                        Ok(value) => env.insert(decl.name.clone(), value),
                        Err(err) => {
                            warn!(variable = %decl.name, error = %err, "generator failed");
                            env.insert(
                                decl.name.clone(),
                                Value::Fault(ResolveFault::GeneratorFailed),
                            );
                        }
                    }
                    resolved_this_pass += 1;
                }
            }
        }

        pending = still_pending;
        if resolved_this_pass == 0 && !pending.is_empty() {
            break;
        }
    }

    if !pending.is_empty() {
        let names: Vec<&str> = pending.iter().map(|d| d.name.as_str()).collect();
        warn!(unresolved = ?names, "variable resolution stalled");
        for decl in pending {
            env.insert(decl.name.clone(), Value::Fault(ResolveFault::Unresolved));
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generators::GeneratorKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn decl(name: &str, spec: VarSpec) -> VarDecl {
        VarDecl {
            name: name.to_string(),
            spec,
        }
    }

    #[test]
    fn chained_dependencies_resolve_regardless_of_order() {
        // square_of_total depends on total, which depends on a and b,
        // and the declarations arrive in reverse order.
        let declarations = vec![
            decl(
                "square_of_total",
                VarSpec::Generated(GeneratorKind::Square {
                    source_var: "total".to_string(),
                    decimals: None,
                }),
            ),
            decl(
                "total",
                VarSpec::Generated(GeneratorKind::Sum {
                    terms: vec!["a".to_string(), "b".to_string()],
                }),
            ),
            decl("a", VarSpec::Literal { value: Value::Int(3) }),
            decl("b", VarSpec::Literal { value: Value::Int(4) }),
        ];

        let mut rng = StdRng::seed_from_u64(1);
        let env = resolve_variables(&declarations, &mut rng);

        assert_eq!(env.get("total"), Some(&Value::Int(7)));
        assert_eq!(env.get("square_of_total"), Some(&Value::Int(49)));
    }

    #[test]
    fn missing_dependency_stalls_into_fault_sentinel() {
        let declarations = vec![decl(
            "orphan",
            VarSpec::Generated(GeneratorKind::Identity {
                source_var: "never_declared".to_string(),
            }),
        )];

        let mut rng = StdRng::seed_from_u64(2);
        let env = resolve_variables(&declarations, &mut rng);

        assert_eq!(
            env.get("orphan"),
            Some(&Value::Fault(ResolveFault::Unresolved))
        );
    }

    #[test]
    fn cyclic_dependencies_stall_instead_of_looping() {
        let declarations = vec![
            decl(
                "x",
                VarSpec::Generated(GeneratorKind::Identity {
                    source_var: "y".to_string(),
                }),
            ),
            decl(
                "y",
                VarSpec::Generated(GeneratorKind::Identity {
                    source_var: "x".to_string(),
                }),
            ),
        ];

        let mut rng = StdRng::seed_from_u64(3);
        let env = resolve_variables(&declarations, &mut rng);

        assert!(env.get("x").expect("x entered").is_fault());
        assert!(env.get("y").expect("y entered").is_fault());
    }

    #[test]
    fn failed_generator_faults_only_its_own_variable() {
        let declarations = vec![
            decl(
                "bad",
                VarSpec::Generated(GeneratorKind::IntRange { min: 10, max: 1 }),
            ),
            decl("good", VarSpec::Literal { value: Value::Int(5) }),
        ];

        let mut rng = StdRng::seed_from_u64(4);
        let env = resolve_variables(&declarations, &mut rng);

        assert_eq!(
            env.get("bad"),
            Some(&Value::Fault(ResolveFault::GeneratorFailed))
        );
        assert_eq!(env.get("good"), Some(&Value::Int(5)));
    }

    #[test]
    fn identical_seeds_produce_identical_environments() {
        let declarations = vec![
            decl(
                "n",
                VarSpec::Generated(GeneratorKind::IntRange { min: 20, max: 80 }),
            ),
            decl(
                "scores",
                VarSpec::Generated(GeneratorKind::IntArray {
                    size: 6,
                    min: 1,
                    max: 50,
                }),
            ),
        ];

        let env_a = resolve_variables(&declarations, &mut StdRng::seed_from_u64(99));
        let env_b = resolve_variables(&declarations, &mut StdRng::seed_from_u64(99));

        assert_eq!(env_a.get("n"), env_b.get("n"));
        assert_eq!(env_a.get("scores"), env_b.get("scores"));
    }
}
