//! replaces table references that name views with the views' definitions.

use std::sync::Arc;

use tracing::{debug, debug_span, trace};

use super::{Analyzer, Error};
use crate::catalog;
use crate::context::Context;
use crate::plan::{transform_up, AsOf, NodeRef, UnresolvedTable};

/// substitutes every `UnresolvedTable` that names a view with that view's definition.
///
/// References to names that are not views are left for table resolution. If the reference has an
/// `AS OF` clause, the clause is pushed onto the tables inside the view's definition.
pub fn resolve_views(ctx: &Context, a: &Analyzer, node: &NodeRef) -> Result<NodeRef, Error> {
    let _span = debug_span!("resolve_views").entered();
    trace!(node = node.name(), "resolve views");

    transform_up(node, &mut |n| {
        trace!(node = n.name(), "transforming node");
        if n.resolved() {
            return Ok(Arc::clone(n));
        }
        let Some(t) = n.downcast_ref::<UnresolvedTable>() else {
            return Ok(Arc::clone(n));
        };

        let db = t.database_or(ctx.session().current_database());
        let view = match a.views().view(db, &t.name) {
            Ok(view) => view,
            Err(catalog::Error::NonExistingView { .. }) => return Ok(Arc::clone(n)),
            Err(e) => return Err(e.into()),
        };
        debug!(view = %t.name, database = db, "view resolved");

        match &t.as_of {
            Some(as_of) => apply_as_of(view.definition(), as_of),
            None => Ok(Arc::clone(view.definition())),
        }
    })
}

/// pushes `as_of` onto every table inside a view definition.
///
/// Only definitions with exactly one child (a `SubqueryAlias` over the view's query) are rewritten; any other
/// shape is returned unchanged, without the clause.
fn apply_as_of(definition: &NodeRef, as_of: &AsOf) -> Result<NodeRef, Error> {
    let [child] = definition.children() else {
        debug!(node = definition.name(), "view definition is not a single subquery, AS OF not applied");
        return Ok(Arc::clone(definition));
    };
    debug!(%as_of, "applying AS OF clause to view definition");

    let child = transform_up(child, &mut |n| {
        let Some(t) = n.downcast_ref::<UnresolvedTable>() else {
            return Ok(Arc::clone(n));
        };
        match &t.as_of {
            None => {
                trace!(table = %t.name, "applying AS OF clause to table");
                Ok(Arc::new(t.with_as_of(as_of.clone())) as NodeRef)
            }
            Some(inner) if inner == as_of => Ok(Arc::clone(n)),
            Some(inner) => Err(Error::IncompatibleAsOf {
                outer: as_of.clone(),
                inner: inner.clone(),
            }),
        }
    })?;

    Ok(definition.with_children(vec![child])?)
}
