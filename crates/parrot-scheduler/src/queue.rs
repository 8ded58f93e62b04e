use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio::sync::oneshot;

/// Dispatch priority; higher runs first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Priority(pub i32);

impl Priority {
    /// Listings and identity lookups.
    pub const QUERY: Self = Self(0);
    pub const TYPING: Self = Self(1);
    pub const SEND: Self = Self(2);
}

pub(crate) type Responder<Resp, Err> = oneshot::Sender<Result<Resp, Err>>;

pub(crate) struct QueuedRequest<Req, Resp, Err> {
    pub(crate) request: Req,
    pub(crate) priority: Priority,
    seq: u64,
    pub(crate) respond_to: Responder<Resp, Err>,
}

impl<Req, Resp, Err> PartialEq for QueuedRequest<Req, Resp, Err> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<Req, Resp, Err> Eq for QueuedRequest<Req, Resp, Err> {}

impl<Req, Resp, Err> Ord for QueuedRequest<Req, Resp, Err> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority first, then earlier submission.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<Req, Resp, Err> PartialOrd for QueuedRequest<Req, Resp, Err> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority-descending, FIFO-within-priority queue.
pub(crate) struct RequestQueue<Req, Resp, Err> {
    heap: BinaryHeap<QueuedRequest<Req, Resp, Err>>,
    next_seq: u64,
}

impl<Req, Resp, Err> Default for RequestQueue<Req, Resp, Err> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<Req, Resp, Err> RequestQueue<Req, Resp, Err> {
    pub(crate) fn push(&mut self, request: Req, priority: Priority, respond_to: Responder<Resp, Err>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedRequest {
            request,
            priority,
            seq,
            respond_to,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedRequest<Req, Resp, Err>> {
        self.heap.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Pending requests in the order they would be dispatched.
    pub(crate) fn snapshot(&self) -> Vec<(Priority, &Req)> {
        let mut entries: Vec<&QueuedRequest<Req, Resp, Err>> = self.heap.iter().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries
            .into_iter()
            .map(|entry| (entry.priority, &entry.request))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Queue = RequestQueue<&'static str, (), ()>;

    fn push(queue: &mut Queue, label: &'static str, priority: Priority) {
        let (tx, _rx) = oneshot::channel();
        queue.push(label, priority, tx);
    }

    fn drain(queue: &mut Queue) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop().map(|entry| entry.request)).collect()
    }

    #[test]
    fn test_higher_priority_pops_first() {
        let mut queue = Queue::default();
        push(&mut queue, "fetch", Priority::QUERY);
        push(&mut queue, "send", Priority::SEND);
        push(&mut queue, "typing", Priority::TYPING);
        assert_eq!(drain(&mut queue), vec!["send", "typing", "fetch"]);
    }

    #[test]
    fn test_equal_priority_is_fifo() {
        let mut queue = Queue::default();
        for label in ["a", "b", "c", "d", "e", "f"] {
            push(&mut queue, label, Priority::SEND);
        }
        assert_eq!(drain(&mut queue), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_mixed_priorities_stable_within_level() {
        let mut queue = Queue::default();
        push(&mut queue, "t1", Priority::TYPING);
        push(&mut queue, "s1", Priority::SEND);
        push(&mut queue, "q1", Priority::QUERY);
        push(&mut queue, "s2", Priority::SEND);
        push(&mut queue, "t2", Priority::TYPING);
        push(&mut queue, "s3", Priority::SEND);
        assert_eq!(drain(&mut queue), vec!["s1", "s2", "s3", "t1", "t2", "q1"]);
    }

    #[test]
    fn test_snapshot_matches_dispatch_order_without_consuming() {
        let mut queue = Queue::default();
        push(&mut queue, "q", Priority::QUERY);
        push(&mut queue, "s", Priority::SEND);
        let snapshot: Vec<&str> = queue.snapshot().into_iter().map(|(_, r)| *r).collect();
        assert_eq!(snapshot, vec!["s", "q"]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_custom_priorities_order_numerically() {
        let mut queue = Queue::default();
        push(&mut queue, "low", Priority(-3));
        push(&mut queue, "high", Priority(10));
        assert_eq!(drain(&mut queue), vec!["high", "low"]);
    }
}
