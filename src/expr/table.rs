//! Relation expression builders

use super::node::{Limit, Node, SourceId};
use super::value::ValueExpr;
use crate::error::{Error, Result};
use crate::schema::Schema;
use std::sync::Arc;

/// A relation-producing expression: a table, or a filter, projection or
/// limit over one
#[derive(Debug, Clone)]
pub struct TableExpr {
    node: Arc<Node>,
    schema: Schema,
}

impl TableExpr {
    /// Table without a physical source, for compile-only use
    pub fn unbound(name: &str, fields: &[(&str, &str)]) -> Result<Self> {
        let schema = Schema::parse(fields.iter().copied())?;
        Ok(Self::bound(name, schema, None))
    }

    pub(crate) fn bound(name: &str, schema: Schema, source: Option<SourceId>) -> Self {
        Self {
            node: Node::table(name, schema.clone(), source),
            schema,
        }
    }

    pub fn from_node(node: Arc<Node>) -> Result<Self> {
        let schema = node.schema().ok_or_else(|| {
            Error::unsupported(node.kind_name(), "expected a relation expression")
        })?;
        Ok(Self { node, schema })
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Name of the underlying table
    pub fn name(&self) -> &str {
        self.node.root_table().map(|t| t.name.as_str()).unwrap_or("")
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn source(&self) -> Option<&SourceId> {
        self.node.root_table().and_then(|t| t.source.as_ref())
    }

    pub fn column(&self, name: &str) -> Result<ValueExpr> {
        ValueExpr::from_node(Node::column(&self.node, name)?)
    }

    pub fn filter(&self, predicates: impl IntoIterator<Item = ValueExpr>) -> Result<Self> {
        let predicates = predicates.into_iter().map(|p| p.node().clone()).collect();
        Self::from_node(Node::filter(&self.node, predicates)?)
    }

    pub fn limit(&self, n: u64) -> Self {
        self.limit_offset(n, 0)
    }

    pub fn limit_offset(&self, n: u64, offset: u64) -> Self {
        Self {
            node: Arc::new(Node::Limit(Limit {
                input: self.node.clone(),
                n,
                offset,
            })),
            schema: self.schema.clone(),
        }
    }

    /// Project onto the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| Node::column(&self.node, name))
            .collect::<Result<Vec<_>>>()?;
        Self::from_node(Node::projection(&self.node, columns)?)
    }

    pub fn equals(&self, other: &TableExpr) -> bool {
        self.node == other.node
    }
}

impl PartialEq for TableExpr {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for TableExpr {}
