//! `plan` defines the nodes of an execution plan and the protocol they share.
//!
//! A plan is a tree of `PlanNode`s. Analysis rewrites the tree (see [`transform`]), and execution pulls
//! rows out of the root with [`PlanNode::row_iter`], which in turn pulls rows from its children.
//!
//! As an example, this query over a view `v` defined as `SELECT * FROM t`:
//! ```sql
//! select 1, * from v as of 'yesterday'
//! ```
//! starts out as:
//! ```text
//! Project([1, #0, #1])
//!  └─ UnresolvedTable(v AS OF yesterday)
//! ```
//! and once the view is resolved becomes:
//! ```text
//! Project([1, #0, #1])
//!  └─ SubqueryAlias(v)
//!      └─ UnresolvedTable(t AS OF yesterday)
//! ```
//!
//! Nodes are immutable. Rewrites build new nodes with [`PlanNode::with_children`], and the new tree shares
//! every unchanged subtree with the old one through `NodeRef`s.

use std::any::Any;
use std::sync::Arc;

use crate::context::Context;
use crate::row_iter::RowIter;
use crate::typed_row::Row;

pub mod cached_results;
pub mod project;
pub mod subquery_alias;
pub mod transform;
pub mod union;
pub mod unresolved_table;
pub mod values;

pub use cached_results::CachedResults;
pub use project::{Project, ProjectAction};
pub use subquery_alias::SubqueryAlias;
pub use transform::{inspect_up, transform_up};
pub use union::Union;
pub use unresolved_table::{AsOf, UnresolvedTable};
pub use values::Values;

/// shared handle to a node of a plan tree.
pub type NodeRef = Arc<dyn PlanNode>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{node}: invalid children number, got {got}, expected {expected}")]
    InvalidChildrenNumber {
        node: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("Table {0} is not resolved and cannot be executed.")]
    UnresolvedTable(String),
}

/// The kinds of access a query can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Select,
}

/// An access that must be granted for a query to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedOperation {
    pub database: String,
    pub table: String,
    pub privilege: Privilege,
}

/// Decides whether the current user may perform an operation.
pub trait PrivilegedOperationChecker {
    fn user_has_privileges(&self, ctx: &Context, op: &PrivilegedOperation) -> bool;
}

/// Common operations across all nodes in a plan.
pub trait PlanNode: std::fmt::Debug + std::fmt::Display + Send + Sync + Any {
    /// Name of the node, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Inputs to this node, in order.
    fn children(&self) -> &[NodeRef];

    /// Returns a copy of this node with its children replaced.
    ///
    /// Fails with `Error::InvalidChildrenNumber` if `children` does not have the same length as
    /// `self.children()`.
    fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error>;

    /// Whether this node and everything below it is bound to concrete definitions.
    fn resolved(&self) -> bool {
        self.children().iter().all(|c| c.resolved())
    }

    /// Opens an iterator over the rows this node produces. `row` is the outer row, if any.
    fn row_iter(&self, ctx: &Context, row: &Row) -> anyhow::Result<Box<dyn RowIter>>;

    /// Whether the user may run this node and its children.
    fn check_privileges(&self, ctx: &Context, checker: &dyn PrivilegedOperationChecker) -> bool {
        self.children()
            .iter()
            .all(|c| c.check_privileges(ctx, checker))
    }

    /// Like `to_string()`, with extra detail useful when debugging plans.
    fn debug_string(&self) -> String {
        self.to_string()
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn PlanNode {
    pub fn downcast_ref<T: PlanNode>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: PlanNode>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// checks that a rebuild got the number of children the node needs.
pub(crate) fn check_children_number(
    node: &'static str,
    children: &[NodeRef],
    expected: usize,
) -> Result<(), Error> {
    if children.len() != expected {
        return Err(Error::InvalidChildrenNumber {
            node,
            got: children.len(),
            expected,
        });
    }
    Ok(())
}

/// takes the only child out of `children`.
pub(crate) fn take_one_child_exact(
    node: &'static str,
    mut children: Vec<NodeRef>,
) -> Result<NodeRef, Error> {
    check_children_number(node, &children, 1)?;
    Ok(children.remove(0))
}

/// renders a node with its children's debug strings, for `PlanNode::debug_string` implementations.
pub(crate) fn debug_tree(header: &str, children: &[NodeRef]) -> String {
    let mut pr = crate::formatting::TreePrinter::new();
    pr.write_node(header);
    let children: Vec<String> = children.iter().map(|c| c.debug_string()).collect();
    pr.write_children(&children);
    pr.finish()
}

/// renders a node with its children's display strings, for `Display` implementations.
pub(crate) fn display_tree(
    f: &mut std::fmt::Formatter<'_>,
    header: &str,
    children: &[NodeRef],
) -> std::fmt::Result {
    let mut pr = crate::formatting::TreePrinter::new();
    pr.write_node(header);
    let children: Vec<String> = children.iter().map(|c| c.to_string()).collect();
    pr.write_children(&children);
    f.write_str(&pr.finish())
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::collections::HashSet;

    use super::*;

    /// denies `Select` on the listed `database.table` names and allows everything else.
    pub struct DenyList(pub HashSet<String>);

    impl PrivilegedOperationChecker for DenyList {
        fn user_has_privileges(&self, _ctx: &Context, op: &PrivilegedOperation) -> bool {
            !self.0.contains(&format!("{}.{}", op.database, op.table))
        }
    }

    pub fn deny(tables: &[&str]) -> DenyList {
        DenyList(tables.iter().map(|s| s.to_string()).collect())
    }

    pub fn table(name: &str) -> NodeRef {
        Arc::new(UnresolvedTable::new(name, ""))
    }

    pub fn table_as_of(name: &str, as_of: &str) -> NodeRef {
        Arc::new(UnresolvedTable::new(name, "").with_as_of(AsOf::new(as_of)))
    }

    pub fn values(rows: Vec<Row>) -> NodeRef {
        Arc::new(Values::new(rows))
    }
}
