//! provides rows of typed SQL values, as produced by row iterators.
//!
//! Rows are plain owned vectors of `SqlValue`. Iterators hand out owned rows so that callers, including
//! the result cache, can keep them past the lifetime of the iterator that produced them.
use itertools::Itertools;

use crate::sql_value::SqlValue;

/// can hold a sequence of values of any of the SQL types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub items: Vec<SqlValue>,
}

impl Row {
    pub fn new(items: Vec<SqlValue>) -> Row {
        Row { items }
    }

    /// a row with no columns, passed to `row_iter` when there is no outer row.
    pub fn empty() -> Row {
        Row { items: vec![] }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// sum of the estimated in-memory sizes of the row's values.
    pub fn estimated_size(&self) -> usize {
        std::mem::size_of::<Row>() + self.items.iter().map(|v| v.estimated_size()).sum::<usize>()
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.items.iter().join(", "))
    }
}

impl<T: Into<SqlValue>> FromIterator<T> for Row {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Row {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// builds a `Row` from a list of expressions convertible to `SqlValue`.
#[macro_export]
macro_rules! row {
    ($($v:expr),* $(,)?) => {
        $crate::typed_row::Row::new(vec![$($crate::sql_value::SqlValue::from($v)),*])
    };
}

#[test]
fn test_row_macro_and_display() {
    let r = row![1, "a"];
    assert_eq!(r.items, vec![SqlValue::Int(1), SqlValue::Text(String::from("a"))]);
    assert_eq!(r.to_string(), "[1, a]");
    assert_eq!(Row::empty().to_string(), "[]");
}

#[test]
fn test_row_estimated_size() {
    let r = row![1, "abc"];
    assert_eq!(
        r.estimated_size(),
        std::mem::size_of::<Row>() + SqlValue::Int(1).estimated_size() + SqlValue::from("abc").estimated_size()
    );
}
