//! provides the projection node of a plan: taking a subset of columns, and adding constant columns.

use std::sync::Arc;

use anyhow::{bail, Result};
use itertools::Itertools;

use super::{debug_tree, display_tree, take_one_child_exact, Error, NodeRef, PlanNode};
use crate::context::Context;
use crate::row_iter::RowIter;
use crate::sql_value::SqlValue;
use crate::typed_row::Row;

#[derive(Clone, Debug, PartialEq)]
/// holds possible actions to take to build one output column.
pub enum ProjectAction {
    Take(usize),        // let Take(x) ; 0 <= x < input_row.len(); take index x from input row.
    Constant(SqlValue), // put constant value into output row.
}

impl std::fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectAction::Take(i) => write!(f, "#{}", i),
            ProjectAction::Constant(c) => c.fmt(f),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub actions: Vec<ProjectAction>,
    children: [NodeRef; 1],
}

impl Project {
    pub fn new(actions: Vec<ProjectAction>, child: NodeRef) -> Self {
        Project {
            actions,
            children: [child],
        }
    }

    fn header(&self) -> String {
        format!("Project([{}])", self.actions.iter().join(", "))
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_tree(f, &self.header(), &self.children)
    }
}

impl PlanNode for Project {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn children(&self) -> &[NodeRef] {
        &self.children
    }

    fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error> {
        let child = take_one_child_exact(self.name(), children)?;
        Ok(Arc::new(Project::new(self.actions.clone(), child)))
    }

    fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Box<dyn RowIter>> {
        let input = self.children[0].row_iter(ctx, row)?;
        Ok(Box::new(ProjectIter {
            actions: self.actions.clone(),
            input,
        }))
    }

    fn debug_string(&self) -> String {
        debug_tree(&self.header(), &self.children)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug)]
struct ProjectIter {
    actions: Vec<ProjectAction>,
    input: Box<dyn RowIter>,
}

fn project_row(actions: &[ProjectAction], row: &Row) -> Result<Row> {
    let mut items = Vec::with_capacity(actions.len());
    for a in actions {
        match a {
            ProjectAction::Take(idx) => match row.items.get(*idx) {
                Some(v) => items.push(v.clone()),
                None => bail!(
                    "Project: column index {} out of range for row with {} columns",
                    idx,
                    row.len()
                ),
            },
            ProjectAction::Constant(c) => items.push(c.clone()),
        }
    }
    Ok(Row { items })
}

impl RowIter for ProjectIter {
    fn next(&mut self, ctx: &Context) -> Result<Option<Row>> {
        match self.input.next(ctx)? {
            Some(r) => Ok(Some(project_row(&self.actions, &r)?)),
            None => Ok(None),
        }
    }

    fn close(&mut self, ctx: &Context) -> Result<()> {
        self.input.close(ctx)
    }
}
