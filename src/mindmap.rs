//! Heading tree ("mind-map") built from the sorted heading list.
//!
//! The tree is always one level deep: a synthetic `Root` with one leaf per
//! heading. It serializes to `{"Root": [{"<heading>": []}, ...]}`.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

pub const ROOT_LABEL: &str = "Root";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MindMap {
    pub children: Vec<Branch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub title: String,
    pub children: Vec<String>,
}

pub fn generate_mindmap<I, S>(headings: I) -> MindMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    MindMap {
        children: headings
            .into_iter()
            .map(|heading| Branch {
                title: heading.into(),
                children: Vec::new(),
            })
            .collect(),
    }
}

impl MindMap {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// One line per heading, as listed by the "all headings" action.
    pub fn heading_lines(&self) -> String {
        if self.children.is_empty() {
            return "No headings found.".to_string();
        }
        self.children
            .iter()
            .map(|branch| format!("🔹 {}", branch.title))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render_tree(&self) -> String {
        let mut out = String::from(ROOT_LABEL);
        let last = self.children.len().saturating_sub(1);
        for (i, branch) in self.children.iter().enumerate() {
            let (connector, indent) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            out.push('\n');
            out.push_str(connector);
            out.push_str(&branch.title);
            let sub_last = branch.children.len().saturating_sub(1);
            for (j, sub) in branch.children.iter().enumerate() {
                out.push('\n');
                out.push_str(indent);
                out.push_str(if j == sub_last { "└── " } else { "├── " });
                out.push_str(sub);
            }
        }
        out
    }

    /// Graphviz digraph with an edge from `Root` to every heading.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph mindmap {\n");
        out.push_str("    layout=neato;\n");
        out.push_str("    node [shape=ellipse, style=filled, fillcolor=skyblue, fontsize=10];\n");
        out.push_str(&format!("    {};\n", dot_quote(ROOT_LABEL)));
        for branch in &self.children {
            out.push_str(&format!(
                "    {} -> {};\n",
                dot_quote(ROOT_LABEL),
                dot_quote(&branch.title)
            ));
            for sub in &branch.children {
                out.push_str(&format!(
                    "    {} -> {};\n",
                    dot_quote(&branch.title),
                    dot_quote(sub)
                ));
            }
        }
        out.push('}');
        out.push('\n');
        out
    }
}

fn dot_quote(label: &str) -> String {
    format!("\"{}\"", label.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Serialize for Branch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.title, &self.children)?;
        map.end()
    }
}

impl Serialize for MindMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(ROOT_LABEL, &self.children)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_one_child_per_heading() {
        let headings: BTreeSet<String> = ["Results", "Introduction", "Methods"]
            .into_iter()
            .map(String::from)
            .collect();
        let map = generate_mindmap(headings);
        assert_eq!(map.len(), 3);
        assert!(map.children.iter().all(|b| b.children.is_empty()));

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Root": [{"Introduction": []}, {"Methods": []}, {"Results": []}]
            })
        );
    }

    #[test]
    fn test_empty_headings() {
        let map = generate_mindmap(Vec::<String>::new());
        assert!(map.is_empty());
        assert_eq!(serde_json::to_value(&map).unwrap(), serde_json::json!({"Root": []}));
        assert_eq!(map.heading_lines(), "No headings found.");
        assert_eq!(map.render_tree(), "Root");
    }

    #[test]
    fn test_heading_lines_and_tree() {
        let map = generate_mindmap(["Abstract", "Conclusion"]);
        assert_eq!(map.heading_lines(), "🔹 Abstract\n🔹 Conclusion");
        assert_eq!(map.render_tree(), "Root\n├── Abstract\n└── Conclusion");
    }

    #[test]
    fn test_dot_escapes_quotes() {
        let map = generate_mindmap(["The \"Best\" Part"]);
        let dot = map.to_dot();
        assert!(dot.starts_with("digraph mindmap {"));
        assert!(dot.contains("\"Root\" -> \"The \\\"Best\\\" Part\";"));
    }
}
