//! A table of constant rows, as written in a `VALUES` list or a `SELECT` without `FROM`.

use std::sync::Arc;

use itertools::Itertools;

use super::{check_children_number, Error, NodeRef, PlanNode};
use crate::context::Context;
use crate::row_iter::{RowIter, RowsIter};
use crate::typed_row::Row;

#[derive(Debug, Clone, PartialEq)]
pub struct Values {
    pub rows: Vec<Row>,
}

impl Values {
    pub fn new(rows: Vec<Row>) -> Self {
        Values { rows }
    }
}

impl std::fmt::Display for Values {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Values({} rows)", self.rows.len())
    }
}

impl PlanNode for Values {
    fn name(&self) -> &'static str {
        "Values"
    }

    fn children(&self) -> &[NodeRef] {
        &[]
    }

    fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error> {
        check_children_number(self.name(), &children, 0)?;
        Ok(Arc::new(self.clone()))
    }

    fn row_iter(&self, _ctx: &Context, _row: &Row) -> anyhow::Result<Box<dyn RowIter>> {
        Ok(Box::new(RowsIter::new(self.rows.clone())))
    }

    fn debug_string(&self) -> String {
        format!("Values([{}])", self.rows.iter().join(", "))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn test_values() {
    use crate::row;
    use crate::row_iter::collect_rows;
    let ctx = Context::default();
    let v = Values::new(vec![row![1, "a"], row![2, "b"]]);
    assert!(v.resolved());
    assert_eq!(v.to_string(), "Values(2 rows)");
    assert_eq!(v.debug_string(), "Values([[1, a], [2, b]])");
    let it = v.row_iter(&ctx, &Row::empty()).unwrap();
    assert_eq!(
        collect_rows(&ctx, it).unwrap(),
        vec![row![1, "a"], row![2, "b"]]
    );
}
