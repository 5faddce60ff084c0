use log::warn;
use serde_json::Value;

use super::calendar::Calendar;
use super::task::{DateKeys, NodeId, Record, TaskNode};
use crate::error::{GanttError, Result};

/// Arena holding the task hierarchy and its flattened display order.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    nodes: Vec<TaskNode>,
    roots: Vec<NodeId>,
    keys: DateKeys,
    /// Visible nodes in pre-order.
    display: Vec<NodeId>,
}

impl TaskTree {
    /// Build the arena from an ordered forest of records.
    pub fn ingest(records: &[Record], keys: DateKeys, calendar: &Calendar) -> Self {
        let mut tree = Self {
            keys,
            ..Default::default()
        };
        for (i, record) in records.iter().enumerate() {
            let id = tree.ingest_node(record, None, 0, i.to_string(), calendar);
            tree.roots.push(id);
        }
        tree.flatten();
        tree
    }

    fn ingest_node(
        &mut self,
        record: &Record,
        parent: Option<NodeId>,
        depth: usize,
        path: String,
        calendar: &Calendar,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut record = record.clone();
        let children = record.remove("children");
        let start = parse_date(&record, &self.keys.start, calendar);
        let end = parse_date(&record, &self.keys.end, calendar);
        let collapsed = record
            .get("collapsed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let key = record_key(&record).unwrap_or_else(|| path.clone());

        self.nodes.push(TaskNode {
            id,
            key,
            start,
            end,
            parent,
            children: Vec::new(),
            collapsed,
            depth,
            display_index: None,
            record,
            had_children_field: children.is_some(),
        });

        match children {
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let child_path = format!("{path}.{i}");
                    match item {
                        Value::Object(child) => {
                            let child_id =
                                self.ingest_node(child, Some(id), depth + 1, child_path, calendar);
                            self.nodes[id.0].children.push(child_id);
                        }
                        other => warn!("skipping non-object child at {child_path}: {other}"),
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => warn!("task {path} has a non-array children field: {other}"),
        }
        id
    }

    /// Recompute the display list and each node's display index.
    fn flatten(&mut self) {
        self.display.clear();
        for node in &mut self.nodes {
            node.display_index = None;
        }
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.display_index = Some(self.display.len());
            self.display.push(id);
            if !node.collapsed {
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn keys(&self) -> &DateKeys {
        &self.keys
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Visible nodes in display order.
    pub fn display(&self) -> &[NodeId] {
        &self.display
    }

    pub fn get(&self, id: NodeId) -> Option<&TaskNode> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Result<&TaskNode> {
        self.get(id).ok_or(GanttError::NoSuchNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.iter()
    }

    /// Returns whether the display list changed.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<bool> {
        let node = self.nodes.get_mut(id.0).ok_or(GanttError::NoSuchNode(id))?;
        if node.collapsed == collapsed {
            return Ok(false);
        }
        node.collapsed = collapsed;
        let changed = node.has_children();
        if changed {
            self.flatten();
        }
        Ok(changed)
    }

    /// Collapse or expand every node that has children.
    pub fn set_all_collapsed(&mut self, collapsed: bool) -> bool {
        let mut changed = false;
        for node in self.nodes.iter_mut().filter(|n| n.has_children()) {
            if node.collapsed != collapsed {
                node.collapsed = collapsed;
                changed = true;
            }
        }
        if changed {
            self.flatten();
        }
        changed
    }

    /// Number of nodes below `id`, visible or not.
    pub fn descendant_count(&self, id: NodeId) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };
        let mut stack = node.children.clone();
        let mut count = 0;
        while let Some(child) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[child.0].children.iter().copied());
        }
        count
    }

    /// Store confirmed dates on the node and its source record.
    pub fn commit_dates(
        &mut self,
        id: NodeId,
        start: (i64, String),
        end: (i64, String),
    ) -> Result<()> {
        let node = self.nodes.get_mut(id.0).ok_or(GanttError::NoSuchNode(id))?;
        node.start = Some(start.0);
        node.end = Some(end.0);
        node.record
            .insert(self.keys.start.clone(), Value::String(start.1));
        node.record.insert(self.keys.end.clone(), Value::String(end.1));
        Ok(())
    }

    /// Rebuild the record forest, carrying any committed dates.
    pub fn to_records(&self) -> Vec<Record> {
        self.roots.iter().map(|&id| self.to_record(id)).collect()
    }

    fn to_record(&self, id: NodeId) -> Record {
        let node = &self.nodes[id.0];
        let mut record = node.record.clone();
        if node.had_children_field || node.has_children() {
            let children = node
                .children
                .iter()
                .map(|&child| Value::Object(self.to_record(child)))
                .collect();
            record.insert("children".to_string(), Value::Array(children));
        }
        record
    }
}

fn parse_date(record: &Record, field: &str, calendar: &Calendar) -> Option<i64> {
    match record.get(field)? {
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => match calendar.parse(text) {
            Ok(ms) => Some(ms),
            Err(e) => {
                warn!("ignoring {field}: {e}");
                None
            }
        },
        Value::Number(ms) => ms.as_i64(),
        Value::Null => None,
        other => {
            warn!("ignoring {field}: unsupported value {other}");
            None
        }
    }
}

fn record_key(record: &Record) -> Option<String> {
    ["key", "id"].iter().find_map(|field| match record.get(*field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> TaskTree {
        let data = records(json!([
            { "key": "a", "startDate": "2024-01-01", "endDate": "2024-01-05", "children": [
                { "key": "a1", "startDate": "2024-01-01", "endDate": "2024-01-02" },
                { "key": "a2", "startDate": null, "endDate": null, "children": [
                    { "key": "a2x" }
                ]}
            ]},
            { "key": "b", "startDate": "2024-02-01", "endDate": "bogus" },
            { "id": 7, "collapsed": true, "children": [ { "name": "hidden" } ] }
        ]));
        TaskTree::ingest(&data, DateKeys::default(), &Calendar::utc())
    }

    fn display_keys(tree: &TaskTree) -> Vec<String> {
        tree.display()
            .iter()
            .map(|&id| tree.node(id).unwrap().key.clone())
            .collect()
    }

    #[test]
    fn ingest_assigns_depth_and_preorder() {
        let tree = sample();
        assert_eq!(tree.len(), 7);
        assert_eq!(display_keys(&tree), ["a", "a1", "a2", "a2x", "b", "7"]);
        for (row, &id) in tree.display().iter().enumerate() {
            let node = tree.node(id).unwrap();
            assert_eq!(node.display_index, Some(row));
            let expected_depth = node.parent.map_or(0, |p| tree.node(p).unwrap().depth + 1);
            assert_eq!(node.depth, expected_depth);
        }
    }

    #[test]
    fn missing_or_bad_dates_are_absent() {
        let tree = sample();
        let by_key = |k: &str| tree.nodes().find(|n| n.key == k).unwrap();
        assert!(by_key("a").has_range());
        assert!(!by_key("a2").has_range());
        assert!(by_key("b").start.is_some());
        assert!(by_key("b").end.is_none());
        // Falls back to the tree path when there is no key.
        assert!(tree.nodes().any(|n| n.key == "2.0" && n.display_index.is_none()));
    }

    #[test]
    fn collapsing_removes_exactly_the_descendants() {
        let mut tree = sample();
        let before = tree.display().len();
        let a = tree.roots()[0];
        let removed = tree.descendant_count(a);
        assert_eq!(removed, 3);

        assert!(tree.set_collapsed(a, true).unwrap());
        assert_eq!(tree.display().len(), before - removed);
        assert_eq!(display_keys(&tree), ["a", "b", "7"]);
        for (row, &id) in tree.display().iter().enumerate() {
            assert_eq!(tree.node(id).unwrap().display_index, Some(row));
        }
        assert!(!tree.set_collapsed(a, true).unwrap());
    }

    #[test]
    fn expand_and_collapse_all() {
        let mut tree = sample();
        assert!(tree.set_all_collapsed(false));
        assert_eq!(tree.display().len(), 7);
        assert!(tree.set_all_collapsed(true));
        assert_eq!(display_keys(&tree), ["a", "b", "7"]);
        assert!(!tree.set_all_collapsed(true));
    }

    #[test]
    fn commit_updates_record_and_round_trips() {
        let mut tree = sample();
        let a1 = tree.nodes().find(|n| n.key == "a1").unwrap().id;
        tree.commit_dates(
            a1,
            (1, "2024-01-03 00:00:00".to_string()),
            (2, "2024-01-04 23:59:59".to_string()),
        )
        .unwrap();

        let out = tree.to_records();
        assert_eq!(out.len(), 3);
        let child = &out[0]["children"][0];
        assert_eq!(child["startDate"], "2024-01-03 00:00:00");
        assert_eq!(child["endDate"], "2024-01-04 23:59:59");
        assert!(out[1].get("children").is_none());
        assert!(matches!(
            tree.commit_dates(NodeId(99), (0, String::new()), (0, String::new())),
            Err(GanttError::NoSuchNode(_))
        ));
    }
}
