//! Defines an enum of all the possible values that a SQL value can have.

use enum_as_inner::EnumAsInner;

#[derive(Debug, Clone, PartialEq, EnumAsInner)]
/// can hold any value that can appear in a row or in an `AS OF` clause.
/// Values are one of the basic storage classes, or `NULL`.
pub enum SqlValue {
    Int(i64),
    Text(String),
    Blob(Vec<u8>),
    Real(f64),
    Bool(bool),
    Null(),
}

impl SqlValue {
    /// approximate number of bytes this value occupies when held in memory.
    ///
    /// Used by the memory manager to charge cached rows against its budget.
    pub fn estimated_size(&self) -> usize {
        let inline = std::mem::size_of::<SqlValue>();
        match self {
            SqlValue::Text(s) => inline + s.len(),
            SqlValue::Blob(b) => inline + b.len(),
            _ => inline,
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Int(x) => x.fmt(f),
            SqlValue::Text(x) => x.fmt(f),
            SqlValue::Blob(_) => "<BLOB>".fmt(f),
            SqlValue::Real(x) => x.fmt(f),
            SqlValue::Bool(x) => x.fmt(f),
            SqlValue::Null() => "NULL".fmt(f),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Int(i)
    }
}

impl From<i32> for SqlValue {
    fn from(i: i32) -> Self {
        SqlValue::Int(i as i64)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

#[test]
fn test_estimated_size_counts_heap_bytes() {
    let small = SqlValue::Int(1).estimated_size();
    assert_eq!(SqlValue::Null().estimated_size(), small);
    assert_eq!(SqlValue::from("abcd").estimated_size(), small + 4);
    assert_eq!(SqlValue::Blob(vec![0; 10]).estimated_size(), small + 10);
}

#[test]
fn test_display() {
    assert_eq!(SqlValue::Int(3).to_string(), "3");
    assert_eq!(SqlValue::from("x").to_string(), "x");
    assert_eq!(SqlValue::Null().to_string(), "NULL");
    assert_eq!(SqlValue::Blob(vec![1]).to_string(), "<BLOB>");
}
