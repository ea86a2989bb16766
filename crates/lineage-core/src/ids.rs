//! Node id generation

use uuid::Uuid;

use crate::model::NodeId;

/// Source of fresh node ids. Implementations only need to avoid repeats;
/// the editor re-draws on collision with an existing node.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> NodeId;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> NodeId {
        NodeId(Uuid::new_v4().to_string())
    }
}

/// Readable `<prefix><n>` ids, handy for tests and scripted edits.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIds {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("n")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
