//! binds the names in a plan to catalog objects before the plan is executed.
//!
//! The `Analyzer` runs a fixed list of rules over a plan, each rule once, in order. Every rule takes a tree and
//! returns a rewritten tree; a rule that fails fails the whole analysis.

use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::catalog::{self, ViewRegistry};
use crate::context::Context;
use crate::plan::{self, AsOf, NodeRef};

mod resolve_views;

pub use resolve_views::resolve_views;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Incompatible AS OF clauses: cannot combine AS OF clauses {outer} and {inner}")]
    IncompatibleAsOf { outer: AsOf, inner: AsOf },
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::Error),
    #[error("Plan error: {0}")]
    Plan(#[from] plan::Error),
}

pub type RuleFunc = fn(&Context, &Analyzer, &NodeRef) -> Result<NodeRef, Error>;

/// A named analysis pass.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: RuleFunc,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// rules every analyzer starts with.
pub fn default_rules() -> Vec<Rule> {
    vec![Rule {
        name: "resolve_views",
        apply: resolve_views,
    }]
}

#[derive(Debug)]
pub struct Analyzer {
    views: Arc<dyn ViewRegistry>,
    rules: Vec<Rule>,
}

impl Analyzer {
    pub fn new(views: Arc<dyn ViewRegistry>) -> Self {
        Analyzer {
            views,
            rules: default_rules(),
        }
    }

    /// appends a rule to run after the existing ones.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn views(&self) -> &dyn ViewRegistry {
        self.views.as_ref()
    }

    pub fn analyze(&self, ctx: &Context, node: &NodeRef) -> Result<NodeRef, Error> {
        let _span = debug_span!("analyze", query_id = ctx.query_id()).entered();
        let mut current = Arc::clone(node);
        for rule in &self.rules {
            debug!(rule = rule.name, "applying rule");
            current = (rule.apply)(ctx, self, &current)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::plan::test_util::{table, values};
    use crate::plan::{transform_up, UnresolvedTable};

    fn replace_tables_with_values(_ctx: &Context, _a: &Analyzer, node: &NodeRef) -> Result<NodeRef, Error> {
        transform_up(node, &mut |n| {
            if n.is::<UnresolvedTable>() {
                return Ok(values(vec![]));
            }
            Ok(Arc::clone(n))
        })
    }

    #[test]
    fn test_rules_run_in_order() {
        let ctx = Context::default();
        let mut a = Analyzer::new(Arc::new(Catalog::new()));
        a.add_rule(Rule {
            name: "replace_tables_with_values",
            apply: replace_tables_with_values,
        });
        let out = a.analyze(&ctx, &table("t")).unwrap();
        assert_eq!(out.name(), "Values");
    }
}
