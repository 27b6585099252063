#![forbid(unsafe_code)]

use super::types::{BlockNode, BlockRecord};
use crate::ids::BlockId;
use std::collections::HashMap;

struct Slot {
    record: BlockRecord,
    parent: Option<usize>,
    content: Vec<BlockNode>,
}

/// Builds nested trees from flat rows without recursion.
///
/// `roots` keep their given order. Every record in `descendants` must carry a `parent_id`;
/// children are ordered by `position`. Rows whose parent is not reachable from a root are
/// dropped.
pub fn assemble_forest(roots: Vec<BlockRecord>, descendants: Vec<BlockRecord>) -> Vec<BlockNode> {
    let mut children: HashMap<BlockId, Vec<BlockRecord>> = HashMap::new();
    for record in descendants {
        if let Some(parent_id) = record.parent_id {
            children.entry(parent_id).or_default().push(record);
        }
    }

    // Pre-order walk: every parent lands in `slots` before any of its children.
    let mut slots: Vec<Slot> = Vec::new();
    let mut stack: Vec<(BlockRecord, Option<usize>)> =
        roots.into_iter().rev().map(|record| (record, None)).collect();
    while let Some((record, parent)) = stack.pop() {
        let index = slots.len();
        if let Some(mut kids) = children.remove(&record.id) {
            kids.sort_by_key(|kid| kid.position);
            for kid in kids.into_iter().rev() {
                stack.push((kid, Some(index)));
            }
        }
        slots.push(Slot {
            record,
            parent,
            content: Vec::new(),
        });
    }

    let mut forest = Vec::new();
    while let Some(slot) = slots.pop() {
        let Slot {
            record,
            parent,
            mut content,
        } = slot;
        content.reverse();
        let node = BlockNode {
            block: record,
            content,
        };
        match parent {
            Some(index) => slots[index].content.push(node),
            None => forest.push(node),
        }
    }
    forest.reverse();
    forest
}

pub fn assemble_subtree(root: BlockRecord, descendants: Vec<BlockRecord>) -> BlockNode {
    let fallback = root.clone();
    assemble_forest(vec![root], descendants)
        .pop()
        .unwrap_or_else(|| BlockNode::leaf(fallback))
}
