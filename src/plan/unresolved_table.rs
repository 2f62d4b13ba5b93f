//! A table reference that has not yet been bound to a table or view.

use std::sync::Arc;

use super::{check_children_number, Error, NodeRef, PlanNode, Privilege, PrivilegedOperation, PrivilegedOperationChecker};
use crate::context::Context;
use crate::row_iter::RowIter;
use crate::sql_value::SqlValue;
use crate::typed_row::Row;

/// `AS OF` qualifier: asks for the table as it was at some point in the past.
///
/// Two qualifiers are the same if their values are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct AsOf(pub SqlValue);

impl std::fmt::Display for AsOf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsOf {
    pub fn new(v: impl Into<SqlValue>) -> Self {
        AsOf(v.into())
    }
}

/// `UnresolvedTable` is a placeholder for `[database.]name [AS OF ...]` in a `FROM` clause.
///
/// An empty `database` means the session's current database.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedTable {
    pub name: String,
    pub database: String,
    pub as_of: Option<AsOf>,
}

impl UnresolvedTable {
    pub fn new(name: impl Into<String>, database: impl Into<String>) -> Self {
        UnresolvedTable {
            name: name.into(),
            database: database.into(),
            as_of: None,
        }
    }

    pub fn with_as_of(&self, as_of: AsOf) -> Self {
        UnresolvedTable {
            as_of: Some(as_of),
            ..self.clone()
        }
    }

    /// the database this reference points into, falling back to the session's current one.
    pub fn database_or<'a>(&'a self, current: &'a str) -> &'a str {
        if self.database.is_empty() {
            current
        } else {
            &self.database
        }
    }
}

impl std::fmt::Display for UnresolvedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UnresolvedTable(")?;
        if !self.database.is_empty() {
            write!(f, "{}.", self.database)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(as_of) = &self.as_of {
            write!(f, " AS OF {}", as_of)?;
        }
        write!(f, ")")
    }
}

impl PlanNode for UnresolvedTable {
    fn name(&self) -> &'static str {
        "UnresolvedTable"
    }

    fn children(&self) -> &[NodeRef] {
        &[]
    }

    fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error> {
        check_children_number(self.name(), &children, 0)?;
        Ok(Arc::new(self.clone()))
    }

    fn resolved(&self) -> bool {
        false
    }

    fn row_iter(&self, _ctx: &Context, _row: &Row) -> anyhow::Result<Box<dyn RowIter>> {
        Err(Error::UnresolvedTable(self.name.clone()).into())
    }

    fn check_privileges(&self, ctx: &Context, checker: &dyn PrivilegedOperationChecker) -> bool {
        checker.user_has_privileges(
            ctx,
            &PrivilegedOperation {
                database: self.database_or(ctx.session().current_database()).to_string(),
                table: self.name.clone(),
                privilege: Privilege::Select,
            },
        )
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::test_util::deny;

    #[test]
    fn test_display() {
        let t = UnresolvedTable::new("t", "");
        assert_eq!(t.to_string(), "UnresolvedTable(t)");
        let t = UnresolvedTable::new("t", "db").with_as_of(AsOf::new("2019-01-01"));
        assert_eq!(t.to_string(), "UnresolvedTable(db.t AS OF 2019-01-01)");
    }

    #[test]
    fn test_unresolved_table_is_never_resolved() {
        let t = UnresolvedTable::new("t", "");
        assert!(!t.resolved());
        let ctx = Context::default();
        let err = t.row_iter(&ctx, &Row::empty()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::UnresolvedTable("t".to_string()))
        );
    }

    #[test]
    fn test_with_children_rejects_children() {
        let t = UnresolvedTable::new("t", "");
        let child: NodeRef = Arc::new(t.clone());
        assert_eq!(
            t.with_children(vec![child]).unwrap_err(),
            Error::InvalidChildrenNumber {
                node: "UnresolvedTable",
                got: 1,
                expected: 0
            }
        );
    }

    #[test]
    fn test_check_privileges_uses_current_database() {
        let ctx = Context::default();
        let t = UnresolvedTable::new("secret", "");
        assert!(!t.check_privileges(&ctx, &deny(&["mydb.secret"])));
        assert!(t.check_privileges(&ctx, &deny(&["other.secret"])));
        let t = UnresolvedTable::new("secret", "other");
        assert!(!t.check_privileges(&ctx, &deny(&["other.secret"])));
    }
}
