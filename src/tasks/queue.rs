//! Per-agent task queue

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::tasks::task::Task;

/// Two-channel queue of top-level tasks
///
/// The priority channel (lower number = more urgent, insertion order among
/// equals) always wins over the plain FIFO channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "QueueSnapshot", into = "QueueSnapshot")]
pub struct TaskQueue {
    prioritized: BTreeMap<(u32, u64), Task>,
    fifo: VecDeque<Task>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the FIFO channel
    pub fn enqueue(&mut self, task: Task) {
        self.fifo.push_back(task);
    }

    /// Add to the priority channel
    pub fn enqueue_with_priority(&mut self, task: Task, priority: u32) {
        self.prioritized.insert((priority, self.next_seq), task);
        self.next_seq += 1;
    }

    pub fn peek(&self) -> Option<&Task> {
        self.prioritized.values().next().or_else(|| self.fifo.front())
    }

    pub fn peek_mut(&mut self) -> Option<&mut Task> {
        match self.prioritized.values_mut().next() {
            Some(task) => Some(task),
            None => self.fifo.front_mut(),
        }
    }

    /// Remove whatever `peek` returns
    pub fn dequeue(&mut self) -> Option<Task> {
        match self.prioritized.pop_first() {
            Some((_, task)) => Some(task),
            None => self.fifo.pop_front(),
        }
    }

    pub fn has_priority_task(&self) -> bool {
        !self.prioritized.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.prioritized.is_empty() && self.fifo.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prioritized.len() + self.fifo.len()
    }

    pub fn clear(&mut self) {
        self.prioritized.clear();
        self.fifo.clear();
    }
}

/// Serialized form; JSON maps cannot key on tuples
#[derive(Serialize, Deserialize)]
struct QueueSnapshot {
    prioritized: Vec<(u32, Task)>,
    fifo: VecDeque<Task>,
}

impl From<TaskQueue> for QueueSnapshot {
    fn from(queue: TaskQueue) -> Self {
        Self {
            prioritized: queue
                .prioritized
                .into_iter()
                .map(|((priority, _), task)| (priority, task))
                .collect(),
            fifo: queue.fifo,
        }
    }
}

impl From<QueueSnapshot> for TaskQueue {
    fn from(snapshot: QueueSnapshot) -> Self {
        let mut queue = TaskQueue {
            prioritized: BTreeMap::new(),
            fifo: snapshot.fifo,
            next_seq: 0,
        };
        for (priority, task) in snapshot.prioritized {
            queue.enqueue_with_priority(task, priority);
        }
        queue
    }
}
