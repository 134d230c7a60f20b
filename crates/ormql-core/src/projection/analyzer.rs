//! Property path extraction from selection expressions.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use super::expr::{SelectExpr, Selection};

/// Parameter bindings: parameter name to the root-relative path it stands
/// for. The source parameter maps to the empty path.
type Scope = HashMap<String, String>;

/// Extract every root-relative dotted path a selection reads from its
/// source entity.
///
/// Each maximal member-access chain rooted at a parameter is recorded once.
/// A lambda passed to a call whose receiver is a recorded chain has its
/// parameters bound to that chain, so `e.Children.Any(c => c.Active)` yields
/// `Children` and `Children.Active`.
pub fn extract_property_paths(selection: &Selection, source_type: &str) -> BTreeSet<String> {
    let scope: Scope = selection
        .parameters
        .iter()
        .map(|p| (p.clone(), String::new()))
        .collect();

    let mut paths = BTreeSet::new();
    walk(&selection.body, &scope, &mut paths);

    trace!(source = source_type, paths = paths.len(), "extracted property paths");
    paths
}

/// Root-relative path of a member chain rooted at a bound parameter.
fn chain_path(expr: &SelectExpr, scope: &Scope) -> Option<String> {
    match expr {
        SelectExpr::Parameter(name) => scope.get(name).cloned(),
        SelectExpr::Member { target, member } => {
            let prefix = chain_path(target, scope)?;
            Some(join(&prefix, member))
        }
        _ => None,
    }
}

fn join(prefix: &str, member: &str) -> String {
    if prefix.is_empty() {
        member.to_string()
    } else {
        format!("{prefix}.{member}")
    }
}

fn walk(expr: &SelectExpr, scope: &Scope, paths: &mut BTreeSet<String>) {
    match expr {
        SelectExpr::Parameter(_) | SelectExpr::Constant(_) => {}
        SelectExpr::Member { target, .. } => match chain_path(expr, scope) {
            Some(path) if !path.is_empty() => {
                paths.insert(path);
            }
            _ => walk(target, scope, paths),
        },
        SelectExpr::New(members) => {
            for (_, member) in members {
                walk(member, scope, paths);
            }
        }
        SelectExpr::Call {
            receiver,
            args,
            ..
        } => {
            // Extension-style calls carry their source as the first argument.
            let (source, rest) = match receiver {
                Some(receiver) => (Some(receiver.as_ref()), args.as_slice()),
                None => match args.split_first() {
                    Some((first, rest)) => (Some(first), rest),
                    None => (None, args.as_slice()),
                },
            };

            let bound = source.and_then(|s| chain_path(s, scope));
            if let Some(source) = source {
                walk(source, scope, paths);
            }

            for arg in rest {
                match (arg, &bound) {
                    (SelectExpr::Lambda(lambda), Some(path)) => {
                        walk_lambda(lambda, scope, Some(path), paths)
                    }
                    _ => walk(arg, scope, paths),
                }
            }
        }
        SelectExpr::Lambda(lambda) => walk_lambda(lambda, scope, None, paths),
        SelectExpr::Unary { operand, .. } => walk(operand, scope, paths),
        SelectExpr::Binary { left, right, .. } => {
            walk(left, scope, paths);
            walk(right, scope, paths);
        }
        SelectExpr::Conditional {
            test,
            if_true,
            if_false,
        } => {
            walk(test, scope, paths);
            walk(if_true, scope, paths);
            walk(if_false, scope, paths);
        }
    }
}

/// Walk a nested lambda. Its parameters shadow outer ones; when `bound` is
/// set they stand for that path, otherwise they are unbound.
fn walk_lambda(
    lambda: &Selection,
    scope: &Scope,
    bound: Option<&String>,
    paths: &mut BTreeSet<String>,
) {
    let mut inner = scope.clone();
    for parameter in &lambda.parameters {
        match bound {
            Some(path) => inner.insert(parameter.clone(), path.clone()),
            None => inner.remove(parameter),
        };
    }
    walk(&lambda.body, &inner, paths);
}
