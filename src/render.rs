use crate::ast::*;
use crate::config::Config;
use crate::profile::Profile;

/// Walks the arena and produces template text.
///
/// `expr` renders a node inline: the first line carries no indentation and
/// any continuation lines (multi-line map literals) are aligned to `depth`.
/// `block` renders a statement list, one indented statement per entry.
pub(crate) struct Renderer<'a> {
    nodes: &'a [Node],
    profile: Profile,
    indent: usize,
}

fn pad(depth: usize) -> String {
    " ".repeat(depth)
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(nodes: &'a [Node], config: &Config) -> Self {
        Self {
            nodes,
            profile: config.profile,
            indent: config.indent,
        }
    }

    fn get(&self, id: NodeId) -> Option<&'a Node> {
        self.nodes.get(id.0)
    }

    fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| !n.consumed)
    }

    pub(crate) fn block(&self, ids: &[NodeId], depth: usize) -> Vec<String> {
        ids.iter()
            .filter(|id| self.is_live(**id))
            .map(|id| self.statement(*id, depth))
            .collect()
    }

    fn statement(&self, id: NodeId, depth: usize) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        match &node.kind {
            NodeKind::Statement(stmt) => self.render_statement(stmt, depth),
            _ => format!("{}{}", pad(depth), self.expr(id, depth)),
        }
    }

    fn render_statement(&self, stmt: &Statement, depth: usize) -> String {
        let p = pad(depth);
        let inner = depth + self.indent;
        match stmt {
            Statement::Set { target, value } => {
                format!("{p}#set(${target} = {})", self.expr(*value, depth))
            }
            Statement::If {
                branches,
                otherwise,
            } => {
                let mut lines = Vec::new();
                for (i, branch) in branches.iter().enumerate() {
                    let tag = if i == 0 { "if" } else { "elseif" };
                    lines.push(format!(
                        "{p}{}({})",
                        self.profile.directive(tag),
                        self.expr(branch.condition, depth)
                    ));
                    lines.extend(self.block(&branch.body, inner));
                }
                if let Some(body) = otherwise {
                    let rendered = self.block(body, inner);
                    // an else with nothing in it is left out entirely
                    if !rendered.is_empty() {
                        lines.push(format!("{p}{}", self.profile.directive("else")));
                        lines.extend(rendered);
                    }
                }
                lines.push(format!("{p}{}", self.profile.directive("end")));
                lines.join("\n")
            }
            Statement::Foreach {
                var,
                collection,
                body,
            } => {
                let mut lines = vec![format!(
                    "{p}{}(${var} in {})",
                    self.profile.directive("foreach"),
                    self.expr(*collection, depth)
                )];
                lines.extend(self.block(body, inner));
                lines.push(format!("{p}{}", self.profile.directive("end")));
                lines.join("\n")
            }
            Statement::Return(None) => format!("{p}{}", self.profile.directive("return")),
            Statement::Return(Some(value)) => format!(
                "{p}{}({})",
                self.profile.directive("return"),
                self.expr(*value, depth)
            ),
        }
    }

    pub(crate) fn expr(&self, id: NodeId, depth: usize) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        match &node.kind {
            NodeKind::Literal(lit) => self.literal(lit, depth),
            NodeKind::Reference(_)
            | NodeKind::Access { .. }
            | NodeKind::Index { .. }
            | NodeKind::Invoke { .. } => {
                let prefix = if node.quiet { "$!{" } else { "${" };
                format!("{prefix}{}}}", self.path(id))
            }
            NodeKind::Unary { op, operand } => {
                format!("{}{}", op.symbol(), self.expr(*operand, depth))
            }
            NodeKind::Binary { op, lhs, rhs } => {
                let text = format!(
                    "{} {} {}",
                    self.expr(*lhs, depth),
                    op.symbol(),
                    self.expr(*rhs, depth)
                );
                if op.parenthesized() {
                    format!("({text})")
                } else {
                    text
                }
            }
            NodeKind::Statement(stmt) => self.render_statement(stmt, depth),
        }
    }

    /// The text between `${` and `}` of a reference-like node.
    fn path(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        match &node.kind {
            NodeKind::Reference(name) => name.clone(),
            NodeKind::Access { base, key } => format!("{}.{key}", self.path(*base)),
            NodeKind::Index { base, index } => {
                format!("{}[{}]", self.path(*base), self.expr(*index, 0))
            }
            NodeKind::Invoke {
                target,
                method,
                args,
            } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(*a, 0)).collect();
                format!("{}.{method}({})", self.path(*target), args.join(", "))
            }
            _ => self.expr(id, 0),
        }
    }

    fn literal(&self, lit: &Literal, depth: usize) -> String {
        match lit {
            Literal::Null => "null".to_owned(),
            Literal::Bool(b) => b.to_string(),
            Literal::Number(n) => n.to_string(),
            Literal::Str(s) => quote(s),
            Literal::List(items) => {
                let items: Vec<String> = items.iter().map(|i| self.expr(*i, depth)).collect();
                format!("[{}]", items.join(", "))
            }
            Literal::Map(entries) => self.map(entries, self.profile.map_separator(), depth),
            Literal::Document(entries) => self.map(entries, ",\n", depth),
        }
    }

    fn map(&self, entries: &[(String, NodeId)], separator: &str, depth: usize) -> String {
        if entries.is_empty() {
            return "{ }".to_owned();
        }
        let inner = depth + self.indent;
        let entries: Vec<String> = entries
            .iter()
            .map(|(k, v)| format!("{}{}: {}", pad(inner), quote(k), self.expr(*v, inner)))
            .collect();
        format!("{{\n{}\n{}}}", entries.join(separator), pad(depth))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Builder, Profile, Value};

    #[test]
    fn nested_maps_indent_relative_to_their_statement() {
        let mut b = Builder::new(Profile::V2018_05_29);
        b.variable(Value::map([
            ("a", Value::from(1)),
            ("b", Value::map([("c", Value::from("d"))])),
            ("e", Value::empty_map()),
        ]))
        .unwrap();
        assert_eq!(
            b.finish(),
            "#set($var0 = {\n  \"a\": 1,\n  \"b\": {\n    \"c\": \"d\"\n  },\n  \"e\": { }\n})"
        );
    }

    #[test]
    fn older_profile_omits_entry_commas() {
        let mut b = Builder::new(Profile::V2017_02_28);
        b.literal(Value::map([("a", 1), ("b", 2)])).unwrap();
        assert_eq!(b.finish(), "{\n  \"a\": 1\n  \"b\": 2\n}");
    }

    #[test]
    fn strings_are_escaped() {
        let mut b = Builder::new(Profile::V2018_05_29);
        let text = b.inline("say \"hi\"\n").unwrap();
        assert_eq!(text, r#""say \"hi\"\n""#);
    }

    #[test]
    fn documents_keep_commas_under_every_profile() {
        let mut b = Builder::new(Profile::V2017_02_28);
        b.literal(Value::document([
            ("a", Value::from(1)),
            ("b", Value::map([("c", 2), ("d", 3)])),
        ]))
        .unwrap();
        assert_eq!(
            b.finish(),
            "{\n  \"a\": 1,\n  \"b\": {\n    \"c\": 2,\n    \"d\": 3\n  }\n}"
        );
    }

    #[test]
    fn range_has_no_parentheses() {
        let mut b = Builder::new(Profile::V2018_05_29);
        let r = b.range(0, 5).unwrap();
        let list = b.inline(Value::list([r])).unwrap();
        assert_eq!(list, "[0 .. 5]");
    }
}
