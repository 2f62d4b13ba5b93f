//! formatting prints out plan trees and query results nicely.

use itertools::Itertools;

use crate::typed_row::Row;

/// renders a node and its children as an indented tree:
///
/// ```text
/// CachedResults
///  └─ Values(1 rows)
/// ```
#[derive(Debug, Default)]
pub struct TreePrinter {
    buf: String,
    node_written: bool,
}

impl TreePrinter {
    pub fn new() -> Self {
        TreePrinter::default()
    }

    /// writes the line describing the current node. Must be called once, before `write_children`.
    pub fn write_node(&mut self, text: &str) {
        debug_assert!(!self.node_written, "node already written");
        self.buf.push_str(text);
        self.buf.push('\n');
        self.node_written = true;
    }

    /// writes the already-rendered children of the current node, each possibly spanning several lines.
    pub fn write_children<S: AsRef<str>>(&mut self, children: &[S]) {
        for (i, child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            for (j, line) in child.as_ref().lines().enumerate() {
                let prefix = match (j == 0, last) {
                    (true, false) => " ├─ ",
                    (true, true) => " └─ ",
                    (false, false) => " │  ",
                    (false, true) => "    ",
                };
                self.buf.push_str(prefix);
                self.buf.push_str(line);
                self.buf.push('\n');
            }
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// renders rows as a table, in the style of the sqlite3 shell's column mode.
pub fn format_rows(column_names: &[String], rows: &[Row]) -> String {
    let mut out = String::new();
    if !column_names.is_empty() {
        out.push_str(&format!(
            "   | {} |\n",
            column_names.iter().map(|x| format!("{:15}", x)).join(" | ")
        ));
    }
    for r in rows {
        out.push_str(&format!(
            "   | {} |\n",
            r.items.iter().map(|x| format!("{:15}", x)).join(" | ")
        ));
    }
    out
}

#[test]
fn test_tree_printer() {
    let mut inner = TreePrinter::new();
    inner.write_node("Project");
    inner.write_children(&["Values(1 rows)"]);
    let mut pr = TreePrinter::new();
    pr.write_node("Union");
    pr.write_children(&[inner.finish(), "Values(2 rows)".to_string()]);
    assert_eq!(
        pr.finish(),
        "Union\n ├─ Project\n │   └─ Values(1 rows)\n └─ Values(2 rows)\n"
    );
}

#[test]
fn test_format_rows() {
    use crate::row;
    let s = format_rows(&["a".to_string()], &[row![1]]);
    assert_eq!(s, format!("   | {:15} |\n   | {:15} |\n", "a", 1));
}
