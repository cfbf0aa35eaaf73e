use std::fmt;
use std::str::FromStr;

/// Node-level merge directive (`tools:node`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOperation {
    Merge,
    MergeOnlyAttributes,
    Remove,
    RemoveAll,
    Replace,
    Strict,
}

impl NodeOperation {
    pub const ALL: [NodeOperation; 6] = [
        NodeOperation::Merge,
        NodeOperation::MergeOnlyAttributes,
        NodeOperation::Remove,
        NodeOperation::RemoveAll,
        NodeOperation::Replace,
        NodeOperation::Strict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeOperation::Merge => "merge",
            NodeOperation::MergeOnlyAttributes => "mergeOnlyAttributes",
            NodeOperation::Remove => "remove",
            NodeOperation::RemoveAll => "removeAll",
            NodeOperation::Replace => "replace",
            NodeOperation::Strict => "strict",
        }
    }
}

impl FromStr for NodeOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for NodeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attribute-level merge directive, naming attributes in a comma list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperation {
    Replace,
    Remove,
    Strict,
}

impl AttributeOperation {
    /// Local name of the tools attribute carrying this directive
    pub fn tools_name(&self) -> &'static str {
        match self {
            AttributeOperation::Replace => "replace",
            AttributeOperation::Remove => "remove",
            AttributeOperation::Strict => "strict",
        }
    }
}

impl fmt::Display for AttributeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tools_name())
    }
}
