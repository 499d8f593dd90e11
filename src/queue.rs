use crate::task::Task;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A heap entry pairing a [`Task`] with its ordering key. The key is cached alongside the task
/// (rather than read through it on every comparison) so that [`TaskQueue::modify_if`] has an
/// obvious place to resync it after a mutator changes `task.deadline`.
struct HeapEntry {
    deadline: std::time::Instant,
    seq: u64,
    task: Task,
}

impl HeapEntry {
    fn new(task: Task) -> Self {
        HeapEntry {
            deadline: task.deadline,
            seq: task.seq,
            task,
        }
    }

    fn key(&self) -> (std::time::Instant, u64) {
        (self.deadline, self.seq)
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// An ordered multiset of [`Task`]s keyed by `(deadline, insertion sequence)`. Backed by a
/// min-ordered [`BinaryHeap`] (via [`std::cmp::Reverse`]), mirroring the ephemeral in-memory
/// scheduling backend this crate's lineage uses: a binary heap ordered purely by time, with no
/// secondary id index, since nothing here ever looks a task up by an external handle.
#[derive(Default)]
pub(crate) struct TaskQueue {
    heap: BinaryHeap<std::cmp::Reverse<HeapEntry>>,
    next_seq: u64,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        TaskQueue {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Returns the next insertion sequence number and advances the counter. Call sites that
    /// build a [`Task`] use this to stamp it before it is ever pushed.
    pub(crate) fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub(crate) fn push(&mut self, task: Task) {
        self.heap.push(std::cmp::Reverse(HeapEntry::new(task)));
    }

    pub(crate) fn pop(&mut self) -> Option<Task> {
        self.heap.pop().map(|std::cmp::Reverse(entry)| entry.task)
    }

    pub(crate) fn peek_deadline(&self) -> Option<std::time::Instant> {
        self.heap.peek().map(|std::cmp::Reverse(entry)| entry.deadline)
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Removes every task for which `pred` returns `true`. Visits each task exactly once;
    /// removal order is unspecified.
    pub(crate) fn remove_if(&mut self, mut pred: impl FnMut(&Task) -> bool) {
        self.heap.retain(|std::cmp::Reverse(entry)| !pred(&entry.task));
    }

    /// Applies `f` to every task for which `pred` returns `true`, then re-homes the whole queue
    /// so the heap invariant holds even if `f` changed a task's `deadline`. `f` may also be a
    /// no-op on the ordering key (e.g. only touching `group`) — the rebuild cost is the same
    /// either way since the heap can't cheaply tell which entries actually moved.
    pub(crate) fn modify_if(&mut self, mut pred: impl FnMut(&Task) -> bool, mut f: impl FnMut(&mut Task)) {
        let mut entries: Vec<HeapEntry> = std::mem::take(&mut self.heap)
            .into_iter()
            .map(|std::cmp::Reverse(entry)| entry)
            .collect();
        for entry in entries.iter_mut() {
            if pred(&entry.task) {
                f(&mut entry.task);
                entry.deadline = entry.task.deadline;
            }
        }
        self.heap = entries.into_iter().map(std::cmp::Reverse).collect();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Task> {
        self.heap.iter().map(|std::cmp::Reverse(entry)| &entry.task)
    }
}
