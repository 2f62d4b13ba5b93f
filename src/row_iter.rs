//! pull-based row iteration over plan nodes.
//!
//! Every plan node produces a `RowIter`. Iterators are advanced with `next()` until it returns `Ok(None)`,
//! and must be closed with `close()` whether or not they were drained.

use anyhow::Result;

use crate::context::Context;
use crate::typed_row::Row;

pub trait RowIter: Send {
    /// returns the next row, or `None` once the iterator is exhausted.
    fn next(&mut self, ctx: &Context) -> Result<Option<Row>>;

    /// releases any resources held by the iterator and its inputs.
    fn close(&mut self, ctx: &Context) -> Result<()>;
}

impl std::fmt::Debug for dyn RowIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RowIter")
    }
}

/// iterates over rows it owns.
#[derive(Debug)]
pub struct RowsIter {
    rows: std::vec::IntoIter<Row>,
}

impl RowsIter {
    pub fn new(rows: Vec<Row>) -> Self {
        RowsIter {
            rows: rows.into_iter(),
        }
    }
}

impl RowIter for RowsIter {
    fn next(&mut self, ctx: &Context) -> Result<Option<Row>> {
        ctx.check_cancelled()?;
        Ok(self.rows.next())
    }

    fn close(&mut self, _ctx: &Context) -> Result<()> {
        Ok(())
    }
}

/// drains `iter` into a vector and closes it.
///
/// The iterator is closed even when iteration fails; the iteration error takes precedence over a close error.
pub fn collect_rows(ctx: &Context, mut iter: Box<dyn RowIter>) -> Result<Vec<Row>> {
    let mut rows = vec![];
    let drained = loop {
        match iter.next(ctx) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    let closed = iter.close(ctx);
    drained?;
    closed?;
    Ok(rows)
}
