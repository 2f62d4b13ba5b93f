//! rewrites plan trees bottom-up.
//!
//! `transform_up` is the building block for analyzer passes: it walks the tree post-order, lets a function
//! replace each node, and rebuilds the ancestors of every replaced node. Untouched subtrees are shared
//! with the input tree, not copied.

use std::sync::Arc;

use super::{Error, NodeRef};

/// applies `f` to every node of the tree rooted at `node`, children before parents, and returns the new root.
///
/// A node whose children all come back unchanged (the same `Arc`) is passed to `f` as is; otherwise it is
/// rebuilt with `with_children` first. The first error, from `f` or from a rebuild, is returned and no
/// further nodes are visited.
pub fn transform_up<F, E>(node: &NodeRef, f: &mut F) -> Result<NodeRef, E>
where
    F: FnMut(&NodeRef) -> Result<NodeRef, E>,
    E: From<Error>,
{
    let children = node.children();
    if children.is_empty() {
        return f(node);
    }

    let mut new_children = Vec::with_capacity(children.len());
    let mut changed = false;
    for child in children {
        let new_child = transform_up(child, f)?;
        changed |= !Arc::ptr_eq(child, &new_child);
        new_children.push(new_child);
    }

    if changed {
        let rebuilt = node.with_children(new_children)?;
        f(&rebuilt)
    } else {
        f(node)
    }
}

/// calls `f` on every node of the tree, children before parents.
pub fn inspect_up<F>(node: &NodeRef, f: &mut F)
where
    F: FnMut(&NodeRef),
{
    for child in node.children() {
        inspect_up(child, f);
    }
    f(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::test_util::{table, values};
    use crate::plan::{PlanNode, Project, ProjectAction, SubqueryAlias, Union, UnresolvedTable};
    use crate::row;

    /// Project
    ///  └─ Union
    ///      ├─ SubqueryAlias(s)
    ///      │   └─ UnresolvedTable(a)
    ///      └─ UnresolvedTable(b)
    fn sample_tree() -> NodeRef {
        Arc::new(Project::new(
            vec![ProjectAction::Take(0)],
            Arc::new(Union::new(
                Arc::new(SubqueryAlias::new("s", table("a"))),
                table("b"),
            )),
        ))
    }

    fn label(n: &NodeRef) -> String {
        match n.downcast_ref::<UnresolvedTable>() {
            Some(t) => t.name.clone(),
            None => n.name().to_string(),
        }
    }

    #[test]
    fn test_visits_every_node_once_children_first() {
        let tree = sample_tree();
        let mut visited = vec![];
        let out = transform_up::<_, Error>(&tree, &mut |n| {
            visited.push(label(n));
            Ok(Arc::clone(n))
        })
        .unwrap();
        assert_eq!(
            visited,
            vec!["a", "SubqueryAlias", "b", "Union", "Project"]
        );
        // Nothing changed, so nothing was rebuilt.
        assert!(Arc::ptr_eq(&out, &tree));
    }

    #[test]
    fn test_inspect_up_matches_transform_order() {
        let mut visited = vec![];
        inspect_up(&sample_tree(), &mut |n| visited.push(label(n)));
        assert_eq!(
            visited,
            vec!["a", "SubqueryAlias", "b", "Union", "Project"]
        );
    }

    #[test]
    fn test_rebuilds_only_ancestors_of_changed_nodes() {
        let tree = sample_tree();
        let union_before = Arc::clone(&tree.children()[0]);
        let alias_before = Arc::clone(&union_before.children()[0]);
        let out = transform_up::<_, Error>(&tree, &mut |n| match n.downcast_ref::<UnresolvedTable>() {
            Some(t) if t.name == "b" => Ok(values(vec![row![1]])),
            _ => Ok(Arc::clone(n)),
        })
        .unwrap();

        assert!(!Arc::ptr_eq(&out, &tree));
        let union_after = &out.children()[0];
        assert!(!Arc::ptr_eq(union_after, &union_before));
        // The left branch did not change and is shared with the input tree.
        assert!(Arc::ptr_eq(&union_after.children()[0], &alias_before));
        assert_eq!(union_after.children()[1].name(), "Values");
        // The input tree is untouched.
        assert_eq!(union_before.children()[1].name(), "UnresolvedTable");
    }

    #[test]
    fn test_error_stops_the_walk() {
        let tree = sample_tree();
        let mut visited = vec![];
        let res = transform_up(&tree, &mut |n| {
            visited.push(label(n));
            if label(n) == "SubqueryAlias" {
                anyhow::bail!("boom");
            }
            Ok(Arc::clone(n))
        });
        assert_eq!(res.unwrap_err().to_string(), "boom");
        assert_eq!(visited, vec!["a", "SubqueryAlias"]);
    }

    #[test]
    fn test_leaf_root_applies_f_directly() {
        let leaf = table("t");
        let out = transform_up::<_, Error>(&leaf, &mut |_| Ok(values(vec![]))).unwrap();
        assert_eq!(out.name(), "Values");
    }

    /// A node that reports one child but rebuilds from whatever it is given, to check that rebuild
    /// errors surface through the walk.
    #[derive(Debug)]
    struct Fussy {
        children: [NodeRef; 1],
    }

    impl std::fmt::Display for Fussy {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("Fussy")
        }
    }

    impl PlanNode for Fussy {
        fn name(&self) -> &'static str {
            "Fussy"
        }
        fn children(&self) -> &[NodeRef] {
            &self.children
        }
        fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error> {
            Err(Error::InvalidChildrenNumber {
                node: self.name(),
                got: children.len(),
                expected: 0,
            })
        }
        fn row_iter(
            &self,
            _ctx: &crate::context::Context,
            _row: &crate::typed_row::Row,
        ) -> anyhow::Result<Box<dyn crate::row_iter::RowIter>> {
            anyhow::bail!("not executable")
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_rebuild_error_is_returned() {
        let tree: NodeRef = Arc::new(Fussy {
            children: [table("t")],
        });
        let res = transform_up::<_, Error>(&tree, &mut |n| {
            if n.is::<UnresolvedTable>() {
                Ok(values(vec![]))
            } else {
                Ok(Arc::clone(n))
            }
        });
        assert_eq!(
            res.unwrap_err(),
            Error::InvalidChildrenNumber {
                node: "Fussy",
                got: 1,
                expected: 0
            }
        );
    }
}
