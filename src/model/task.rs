use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A caller-supplied task record. Only the date fields, `children`,
/// `collapsed` and the display key are interpreted.
pub type Record = serde_json::Map<String, Value>;

/// Stable index of a node in the task arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Record fields holding a task's start and end dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateKeys {
    pub start: String,
    pub end: String,
}

impl Default for DateKeys {
    fn default() -> Self {
        Self {
            start: "startDate".to_string(),
            end: "endDate".to_string(),
        }
    }
}

/// One task in the hierarchy.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub id: NodeId,
    pub key: String,
    /// Parsed start date, epoch ms.
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub collapsed: bool,
    pub depth: usize,
    /// Row in the flattened display list; `None` while hidden under a
    /// collapsed ancestor.
    pub display_index: Option<usize>,
    /// The source record without its `children` array.
    pub record: Record,
    pub(crate) had_children_field: bool,
}

impl TaskNode {
    pub fn has_range(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// A string field of the source record, for table cells.
    pub fn field(&self, name: &str) -> Option<String> {
        match self.record.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
