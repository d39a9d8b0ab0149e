//! Compiled permission rules and their evaluation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Action, Check, CheckRegistry, Decision, Expression, ExpressionError, Target};
use crate::PermissionDenied;
use crate::types::Principal;

/// A permission expression with every check name resolved.
///
/// Compiling happens once, at startup. A compiled rule can no longer fail:
/// evaluating it only walks the tree.
#[derive(Clone)]
pub struct CompiledExpression {
    source: String,
    root: Node,
}

#[derive(Clone)]
enum Node {
    Check(Arc<dyn Check>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
}

impl CompiledExpression {
    /// Parses `source` and resolves its check names against `checks`.
    pub fn compile(source: &str, checks: &CheckRegistry) -> Result<Self, ExpressionError> {
        let expression = Expression::parse(source)?;
        let root = resolve(&expression, checks)?;
        Ok(Self { source: source.trim().to_string(), root })
    }

    /// Returns the expression text as declared.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn allows(&self, principal: &Principal, target: &Target<'_>) -> bool {
        self.root.allows(principal, target)
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledExpression").field(&self.source).finish()
    }
}

fn resolve(expression: &Expression, checks: &CheckRegistry) -> Result<Node, ExpressionError> {
    Ok(match expression {
        Expression::Check(name) => Node::Check(
            checks.get(name).ok_or_else(|| ExpressionError::UnknownCheck(name.clone()))?,
        ),
        Expression::And(l, r) => Node::And(Box::new(resolve(l, checks)?), Box::new(resolve(r, checks)?)),
        Expression::Or(l, r) => Node::Or(Box::new(resolve(l, checks)?), Box::new(resolve(r, checks)?)),
        Expression::Not(inner) => Node::Not(Box::new(resolve(inner, checks)?)),
    })
}

impl Node {
    fn allows(&self, principal: &Principal, target: &Target<'_>) -> bool {
        match self {
            Node::Check(check) => check.evaluate(principal, target),
            Node::And(l, r) => l.allows(principal, target) && r.allows(principal, target),
            Node::Or(l, r) => l.allows(principal, target) || r.allows(principal, target),
            Node::Not(inner) => !inner.allows(principal, target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleKey {
    resource_type: String,
    field: Option<String>,
    action: Action,
}

/// Evaluates permission rules keyed by `(type, field, action)`.
///
/// Lookup order for a field-level target: the field rule, then the type rule.
/// With neither declared the access is allowed, matching `allow all`.
///
/// ```rust
/// use jsonapi_graph::permission::{Action, CheckRegistry, Decision, PermissionEvaluator, Target};
/// use jsonapi_graph::Principal;
///
/// let mut evaluator = PermissionEvaluator::new(CheckRegistry::new());
/// evaluator.add_rule("secret", None, Action::Read, "deny all").unwrap();
///
/// let anyone = Principal::anonymous();
/// assert_eq!(evaluator.decide(Action::Read, &anyone, &Target::of_type("secret")), Decision::Deny);
/// assert_eq!(evaluator.decide(Action::Read, &anyone, &Target::of_type("public")), Decision::Allow);
/// ```
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    checks: CheckRegistry,
    rules: HashMap<RuleKey, CompiledExpression>,
}

impl PermissionEvaluator {
    /// Creates an evaluator with no rules.
    pub fn new(checks: CheckRegistry) -> Self {
        Self { checks, rules: HashMap::new() }
    }

    /// Compiles and registers a rule. Replaces any earlier rule for the same key.
    pub fn add_rule(
        &mut self,
        resource_type: &str,
        field: Option<&str>,
        action: Action,
        source: &str,
    ) -> Result<(), ExpressionError> {
        let compiled = CompiledExpression::compile(source, &self.checks)?;
        let key = RuleKey {
            resource_type: resource_type.to_string(),
            field: field.map(str::to_string),
            action,
        };
        self.rules.insert(key, compiled);
        Ok(())
    }

    /// Returns the number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluates one compiled expression.
    pub fn evaluate(
        &self,
        expression: &CompiledExpression,
        principal: &Principal,
        target: &Target<'_>,
    ) -> Decision {
        Decision::from(expression.allows(principal, target))
    }

    /// Finds the rule governing `action` on `target` and evaluates it.
    pub fn decide(&self, action: Action, principal: &Principal, target: &Target<'_>) -> Decision {
        match self.rule_for(action, target) {
            Some(rule) => self.evaluate(rule, principal, target),
            None => Decision::Allow,
        }
    }

    /// Like [`decide`](Self::decide), returning `true` on allow.
    pub fn can(&self, action: Action, principal: &Principal, target: &Target<'_>) -> bool {
        self.decide(action, principal, target).is_allowed()
    }

    /// Like [`decide`](Self::decide), turning a deny into [`PermissionDenied`].
    pub fn authorize(
        &self,
        action: Action,
        principal: &Principal,
        target: &Target<'_>,
    ) -> Result<(), PermissionDenied> {
        match self.rule_for(action, target) {
            Some(rule) => self.enforce(rule, action, principal, target),
            None => Ok(()),
        }
    }

    /// Like [`authorize`](Self::authorize) for a field of a type, consulting
    /// only a rule declared on the field itself.
    ///
    /// Filters and sorts use this: a type-level read rule hides rows, while
    /// a field-level one rejects the query.
    pub fn authorize_field(
        &self,
        action: Action,
        principal: &Principal,
        resource_type: &str,
        field: &str,
    ) -> Result<(), PermissionDenied> {
        let key = RuleKey {
            resource_type: resource_type.to_string(),
            field: Some(field.to_string()),
            action,
        };
        match self.rules.get(&key) {
            Some(rule) => self.enforce(rule, action, principal, &Target::type_field(resource_type, field)),
            None => Ok(()),
        }
    }

    fn enforce(
        &self,
        rule: &CompiledExpression,
        action: Action,
        principal: &Principal,
        target: &Target<'_>,
    ) -> Result<(), PermissionDenied> {
        match self.evaluate(rule, principal, target) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                tracing::debug!(
                    principal = %principal,
                    action = %action,
                    target = %target.describe(),
                    expression = rule.source(),
                    "permission denied"
                );
                Err(PermissionDenied::new(principal.to_string(), action, target.describe())
                    .with_expression(rule.source().to_string()))
            },
        }
    }

    fn rule_for(&self, action: Action, target: &Target<'_>) -> Option<&CompiledExpression> {
        let resource_type = target.resource_type().to_string();
        if let Some(field) = target.field_name() {
            let key = RuleKey {
                resource_type: resource_type.clone(),
                field: Some(field.to_string()),
                action,
            };
            if let Some(rule) = self.rules.get(&key) {
                return Some(rule);
            }
        }
        self.rules.get(&RuleKey { resource_type, field: None, action })
    }
}
