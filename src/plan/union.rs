//! `UNION ALL` of two inputs: all rows of the left input, then all rows of the right.

use std::sync::Arc;

use anyhow::Result;

use super::{debug_tree, display_tree, Error, NodeRef, PlanNode};
use crate::context::Context;
use crate::row_iter::RowIter;
use crate::typed_row::Row;

#[derive(Debug, Clone)]
pub struct Union {
    children: [NodeRef; 2],
}

impl Union {
    pub fn new(left: NodeRef, right: NodeRef) -> Self {
        Union {
            children: [left, right],
        }
    }
}

impl std::fmt::Display for Union {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_tree(f, "Union", &self.children)
    }
}

impl PlanNode for Union {
    fn name(&self) -> &'static str {
        "Union"
    }

    fn children(&self) -> &[NodeRef] {
        &self.children
    }

    fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error> {
        let [left, right]: [NodeRef; 2] =
            children
                .try_into()
                .map_err(|c: Vec<NodeRef>| Error::InvalidChildrenNumber {
                    node: "Union",
                    got: c.len(),
                    expected: 2,
                })?;
        Ok(Arc::new(Union::new(left, right)))
    }

    fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Box<dyn RowIter>> {
        let left = self.children[0].row_iter(ctx, row)?;
        Ok(Box::new(UnionIter {
            current: left,
            right: Some(Arc::clone(&self.children[1])),
            outer: row.clone(),
        }))
    }

    fn debug_string(&self) -> String {
        debug_tree("Union", &self.children)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// the right input is only opened once the left one is exhausted.
#[derive(Debug)]
struct UnionIter {
    current: Box<dyn RowIter>,
    right: Option<NodeRef>,
    outer: Row,
}

impl RowIter for UnionIter {
    fn next(&mut self, ctx: &Context) -> Result<Option<Row>> {
        loop {
            if let Some(r) = self.current.next(ctx)? {
                return Ok(Some(r));
            }
            match self.right.take() {
                Some(right) => {
                    let next = right.row_iter(ctx, &self.outer)?;
                    let mut done = std::mem::replace(&mut self.current, next);
                    done.close(ctx)?;
                }
                None => return Ok(None),
            }
        }
    }

    fn close(&mut self, ctx: &Context) -> Result<()> {
        self.current.close(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::test_util::{deny, table, values};
    use crate::row;
    use crate::row_iter::collect_rows;

    #[test]
    fn test_union_concatenates_in_order() {
        let ctx = Context::default();
        let u = Union::new(values(vec![row![1], row![2]]), values(vec![row![3]]));
        let it = u.row_iter(&ctx, &Row::empty()).unwrap();
        assert_eq!(
            collect_rows(&ctx, it).unwrap(),
            vec![row![1], row![2], row![3]]
        );
    }

    #[test]
    fn test_union_requires_two_children() {
        let u = Union::new(values(vec![]), values(vec![]));
        assert_eq!(
            u.with_children(vec![values(vec![])]).unwrap_err(),
            Error::InvalidChildrenNumber {
                node: "Union",
                got: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn test_union_checks_both_sides() {
        let ctx = Context::default();
        let u = Union::new(table("a"), table("b"));
        assert!(u.check_privileges(&ctx, &deny(&[])));
        assert!(!u.check_privileges(&ctx, &deny(&["mydb.b"])));
        assert!(!u.resolved());
    }
}
