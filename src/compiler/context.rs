use super::dialect::Dialect;
use crate::expr::Node;
use crate::types::Value;
use ahash::AHashMap;
use std::sync::Arc;

/// Mutable state of a single compilation: alias assignment and bound
/// parameters. Created fresh per call so aliases restart at `t0`.
pub(crate) struct CompileContext<'d> {
    pub(crate) dialect: &'d dyn Dialect,
    counter: usize,
    aliases: AHashMap<Arc<Node>, String>,
    params: Vec<Value>,
}

impl<'d> CompileContext<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            counter: 0,
            aliases: AHashMap::new(),
            params: Vec::new(),
        }
    }

    fn next_alias(&mut self) -> String {
        let alias = format!("t{}", self.counter);
        self.counter += 1;
        alias
    }

    /// Alias of `table`, assigning the next one on first appearance
    pub(crate) fn alias_for(&mut self, table: &Arc<Node>) -> String {
        if let Some(alias) = self.aliases.get(table) {
            return alias.clone();
        }
        let alias = self.next_alias();
        tracing::trace!(target: "tablexpr::compiler", %alias, table = %table.display_name(), "assigned alias");
        self.aliases.insert(table.clone(), alias.clone());
        alias
    }

    /// Bind a parameter and return its placeholder
    pub(crate) fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    pub(crate) fn into_params(self) -> Vec<Value> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::dialect::ColumnarDialect;
    use crate::schema::Schema;

    #[test]
    fn test_equal_nodes_share_alias() {
        let mut ctx = CompileContext::new(&ColumnarDialect);
        let a = Node::table("a", Schema::default(), None);
        let a2 = Node::table("a", Schema::default(), None);
        let b = Node::table("b", Schema::default(), None);
        assert_eq!(ctx.alias_for(&a), "t0");
        assert_eq!(ctx.alias_for(&b), "t1");
        assert_eq!(ctx.alias_for(&a2), "t0");
    }

    #[test]
    fn test_bind_numbers_placeholders() {
        let mut ctx = CompileContext::new(&ColumnarDialect);
        assert_eq!(ctx.bind(Value::Int64(1)), "$1");
        assert_eq!(ctx.bind(Value::Int64(2)), "$2");
        assert_eq!(ctx.into_params(), vec![Value::Int64(1), Value::Int64(2)]);
    }
}
