//! Defines `Catalog`, which holds the databases of a server and the views registered in each.
//!
//! Only views are stored here: a view is a name and a plan subtree that is substituted wherever the name is
//! used as a table. Tables themselves are looked up elsewhere.

// TODO:
//  - Keep a version number per view so that cached plans built from a dropped or replaced view can be detected.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use tracing::debug;

use crate::config::DEFAULT_DATABASE;
use crate::plan::NodeRef;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("View {database}.{name} does not exist.")]
    NonExistingView { database: String, name: String },
    #[error("View {database}.{name} already exists.")]
    ViewAlreadyExists { database: String, name: String },
    #[error("Database {0} not found.")]
    DatabaseNotFound(String),
    #[error("Database {0} already exists.")]
    DatabaseAlreadyExists(String),
    #[error("View registry unavailable: {0}")]
    Unavailable(String),
}

/// Looks up views by database and name.
///
/// A name that is not a view, in any database, is `Error::NonExistingView`. Any other error means the
/// registry could not answer.
pub trait ViewRegistry: std::fmt::Debug + Send + Sync {
    fn view(&self, database: &str, name: &str) -> Result<View, Error>;
}

/// A `View` is a stored query definition.
///
/// The definition is usually a `SubqueryAlias` named after the view, over the view's query.
#[derive(Debug, Clone)]
pub struct View {
    name: String,
    definition: NodeRef,
}

impl View {
    pub fn new(name: impl Into<String>, definition: NodeRef) -> Self {
        View {
            name: name.into(),
            definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &NodeRef {
        &self.definition
    }
}

#[derive(Debug, Default)]
struct Inner {
    databases: BTreeSet<String>,
    // Keyed by (database, view name).
    views: BTreeMap<(String, String), View>,
}

/// A `Catalog` is shared by all sessions; lookups take a read lock and return clones.
#[derive(Debug)]
pub struct Catalog {
    inner: RwLock<Inner>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// creates a catalog holding just the default database.
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.databases.insert(DEFAULT_DATABASE.to_string());
        Catalog {
            inner: RwLock::new(inner),
        }
    }

    pub fn create_database(&self, name: &str) -> Result<(), Error> {
        let mut inner = self.inner.write();
        if !inner.databases.insert(name.to_string()) {
            return Err(Error::DatabaseAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.inner.read().databases.contains(name)
    }

    pub fn register_view(&self, database: &str, view: View) -> Result<(), Error> {
        let mut inner = self.inner.write();
        if !inner.databases.contains(database) {
            return Err(Error::DatabaseNotFound(database.to_string()));
        }
        let key = (database.to_string(), view.name().to_string());
        if inner.views.contains_key(&key) {
            return Err(Error::ViewAlreadyExists {
                database: key.0,
                name: key.1,
            });
        }
        debug!(database, view = view.name(), "registering view");
        inner.views.insert(key, view);
        Ok(())
    }

    pub fn drop_view(&self, database: &str, name: &str) -> Result<(), Error> {
        let mut inner = self.inner.write();
        if !inner.databases.contains(database) {
            return Err(Error::DatabaseNotFound(database.to_string()));
        }
        match inner.views.remove(&(database.to_string(), name.to_string())) {
            Some(_) => Ok(()),
            None => Err(Error::NonExistingView {
                database: database.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// looks up a view.
    ///
    /// Returns `Error::NonExistingView` if there is no such view, including when the database itself was
    /// never created: the catalog only knows about views, so the name may still be a table.
    pub fn view(&self, database: &str, name: &str) -> Result<View, Error> {
        self.inner
            .read()
            .views
            .get(&(database.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::NonExistingView {
                database: database.to_string(),
                name: name.to_string(),
            })
    }

    /// names of the views in `database`, sorted.
    pub fn view_names(&self, database: &str) -> Vec<String> {
        self.inner
            .read()
            .views
            .keys()
            .filter(|(db, _)| db == database)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

impl ViewRegistry for Catalog {
    fn view(&self, database: &str, name: &str) -> Result<View, Error> {
        Catalog::view(self, database, name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::plan::test_util::table;
    use crate::plan::SubqueryAlias;

    fn view(name: &str) -> View {
        View::new(name, Arc::new(SubqueryAlias::new(name, table("t"))))
    }

    #[test]
    fn test_register_and_lookup() {
        let c = Catalog::new();
        c.register_view(DEFAULT_DATABASE, view("v")).unwrap();
        let v = c.view(DEFAULT_DATABASE, "v").unwrap();
        assert_eq!(v.name(), "v");
        assert_eq!(v.definition().name(), "SubqueryAlias");
        assert_eq!(c.view_names(DEFAULT_DATABASE), vec!["v".to_string()]);
    }

    #[test]
    fn test_lookup_errors() {
        struct Case {
            desc: &'static str,
            database: &'static str,
            name: &'static str,
            expected: Error,
        }
        let c = Catalog::new();
        c.create_database("other").unwrap();
        c.register_view("other", view("v")).unwrap();
        let cases = vec![
            Case {
                desc: "view in another database",
                database: DEFAULT_DATABASE,
                name: "v",
                expected: Error::NonExistingView {
                    database: DEFAULT_DATABASE.to_string(),
                    name: "v".to_string(),
                },
            },
            Case {
                desc: "no such database",
                database: "nope",
                name: "v",
                expected: Error::NonExistingView {
                    database: "nope".to_string(),
                    name: "v".to_string(),
                },
            },
        ];
        for case in cases {
            println!("Running case: {}", case.desc);
            assert_eq!(c.view(case.database, case.name).unwrap_err(), case.expected);
        }
    }

    #[test]
    fn test_register_errors() {
        let c = Catalog::new();
        assert_eq!(
            c.register_view("nope", view("v")).unwrap_err(),
            Error::DatabaseNotFound("nope".to_string())
        );
        c.register_view(DEFAULT_DATABASE, view("v")).unwrap();
        assert_eq!(
            c.register_view(DEFAULT_DATABASE, view("v")).unwrap_err(),
            Error::ViewAlreadyExists {
                database: DEFAULT_DATABASE.to_string(),
                name: "v".to_string()
            }
        );
        assert_eq!(
            c.create_database(DEFAULT_DATABASE).unwrap_err(),
            Error::DatabaseAlreadyExists(DEFAULT_DATABASE.to_string())
        );
    }

    #[test]
    fn test_drop_view() {
        let c = Catalog::new();
        c.register_view(DEFAULT_DATABASE, view("v")).unwrap();
        c.drop_view(DEFAULT_DATABASE, "v").unwrap();
        assert!(matches!(
            c.view(DEFAULT_DATABASE, "v"),
            Err(Error::NonExistingView { .. })
        ));
        assert!(c.drop_view(DEFAULT_DATABASE, "v").is_err());
    }
}
