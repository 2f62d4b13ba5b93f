//! Names a subquery. Stored view definitions take this shape: the view's name over its query.

use std::sync::Arc;

use super::{debug_tree, display_tree, take_one_child_exact, Error, NodeRef, PlanNode};
use crate::context::Context;
use crate::row_iter::RowIter;
use crate::typed_row::Row;

#[derive(Debug, Clone)]
pub struct SubqueryAlias {
    pub alias: String,
    children: [NodeRef; 1],
}

impl SubqueryAlias {
    pub fn new(alias: impl Into<String>, child: NodeRef) -> Self {
        SubqueryAlias {
            alias: alias.into(),
            children: [child],
        }
    }

    pub fn child(&self) -> &NodeRef {
        &self.children[0]
    }
}

impl std::fmt::Display for SubqueryAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_tree(f, &format!("SubqueryAlias({})", self.alias), &self.children)
    }
}

impl PlanNode for SubqueryAlias {
    fn name(&self) -> &'static str {
        "SubqueryAlias"
    }

    fn children(&self) -> &[NodeRef] {
        &self.children
    }

    fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error> {
        let child = take_one_child_exact(self.name(), children)?;
        Ok(Arc::new(SubqueryAlias::new(self.alias.clone(), child)))
    }

    fn row_iter(&self, ctx: &Context, row: &Row) -> anyhow::Result<Box<dyn RowIter>> {
        self.child().row_iter(ctx, row)
    }

    fn debug_string(&self) -> String {
        debug_tree(&format!("SubqueryAlias({})", self.alias), &self.children)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
