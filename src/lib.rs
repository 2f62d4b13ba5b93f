//! sqlplan is the analysis and execution core of a small SQL engine.
//!
//! A query arrives as a plan tree (see [`plan`]). The [`analyzer::Analyzer`] binds the names in it, replacing
//! references to views with the views' definitions, and the resolved tree is then executed by pulling rows
//! through [`row_iter::RowIter`]s. A [`plan::CachedResults`] node keeps the rows of its subtree after the first
//! full pass so later executions replay them.

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod context;
pub mod formatting;
pub mod memory;
pub mod plan;
pub mod row_iter;
pub mod sql_value;
pub mod typed_row;

use anyhow::{bail, Result};
use tracing::{debug, debug_span};

use crate::analyzer::Analyzer;
use crate::context::Context;
use crate::plan::{NodeRef, PrivilegedOperation, PrivilegedOperationChecker};
use crate::typed_row::Row;

/// grants every operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl PrivilegedOperationChecker for AllowAll {
    fn user_has_privileges(&self, _ctx: &Context, _op: &PrivilegedOperation) -> bool {
        true
    }
}

/// Analyze `plan`, check that the user may run it, and run it to completion.
pub fn run_query(
    analyzer: &Analyzer,
    ctx: &Context,
    checker: &dyn PrivilegedOperationChecker,
    plan: &NodeRef,
) -> Result<Vec<Row>> {
    let _span = debug_span!("run_query", query_id = ctx.query_id()).entered();
    let plan = analyzer.analyze(ctx, plan)?;
    debug!(plan = %plan.debug_string(), "analyzed plan");
    if !plan.check_privileges(ctx, checker) {
        bail!("User does not have privileges to run the query.");
    }
    run_plan(ctx, &plan)
}

/// Run an already analyzed plan and collect its rows.
pub fn run_plan(ctx: &Context, plan: &NodeRef) -> Result<Vec<Row>> {
    let iter = plan.row_iter(ctx, &Row::empty())?;
    row_iter::collect_rows(ctx, iter)
}
