use crate::model::{AttributeOperation, NodeKey, NodeOperation};
use crate::xml::{QName, SourceFilePosition};
use std::collections::BTreeMap;
use std::fmt;

/// What happened to a node or attribute during the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Added,
    Injected,
    Merged,
    Rejected,
    Ignored,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Added => "ADDED",
            ActionType::Injected => "INJECTED",
            ActionType::Merged => "MERGED",
            ActionType::Rejected => "REJECTED",
            ActionType::Ignored => "IGNORED",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub action_type: ActionType,
    /// Where the contribution came from
    pub position: SourceFilePosition,
    pub operation: Option<NodeOperation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    pub action_type: ActionType,
    pub position: SourceFilePosition,
    pub operation: Option<AttributeOperation>,
}

/// All decisions taken for one node key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionTreeRecord {
    pub node_records: Vec<NodeRecord>,
    pub attribute_records: BTreeMap<String, Vec<AttributeRecord>>,
}

/// Provenance ledger, keyed by the display form of node keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Actions {
    records: BTreeMap<String, DecisionTreeRecord>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys with at least one recorded decision, sorted
    pub fn node_keys(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    pub fn decisions(&self, key: &str) -> Option<&DecisionTreeRecord> {
        self.records.get(key)
    }

    pub fn node_records(&self, key: &str) -> &[NodeRecord] {
        self.records
            .get(key)
            .map(|r| r.node_records.as_slice())
            .unwrap_or(&[])
    }

    pub fn attribute_records(&self, key: &str, attribute: &str) -> &[AttributeRecord] {
        self.records
            .get(key)
            .and_then(|r| r.attribute_records.get(attribute))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Attribute names with recorded decisions under `key`
    pub fn recorded_attributes(&self, key: &str) -> Vec<&str> {
        self.records
            .get(key)
            .map(|r| r.attribute_records.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub(crate) fn record_node(
        &mut self,
        key: &NodeKey,
        action_type: ActionType,
        position: SourceFilePosition,
        operation: Option<NodeOperation>,
    ) {
        self.records
            .entry(key.to_string())
            .or_default()
            .node_records
            .push(NodeRecord {
                action_type,
                position,
                operation,
            });
    }

    /// Record an attribute decision. Attributes without any node record
    /// still get an entry so they can be blamed.
    pub(crate) fn record_attribute(
        &mut self,
        key: &NodeKey,
        attribute: &QName,
        action_type: ActionType,
        position: SourceFilePosition,
        operation: Option<AttributeOperation>,
    ) {
        self.records
            .entry(key.to_string())
            .or_default()
            .attribute_records
            .entry(attribute.to_string())
            .or_default()
            .push(AttributeRecord {
                action_type,
                position,
                operation,
            });
    }

    /// Move every decision recorded under `old` to `new`
    pub(crate) fn rekey(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        let Some(moved) = self.records.remove(old) else {
            return;
        };
        let target = self.records.entry(new.to_string()).or_default();
        target.node_records.extend(moved.node_records);
        for (attribute, records) in moved.attribute_records {
            target
                .attribute_records
                .entry(attribute)
                .or_default()
                .extend(records);
        }
    }

    /// Whether `key` had a lower-priority contribution rejected
    pub fn has_rejection(&self, key: &str) -> bool {
        self.node_records(key)
            .iter()
            .any(|r| r.action_type == ActionType::Rejected)
    }
}
