//! FIFO of landmark requests waiting for a world origin

use crate::core::{ContentHandle, GeodeticPoint, Metadata};
use std::collections::VecDeque;
use std::fmt;

/// Handle returned for a queued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything needed to create a landmark once an origin exists
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkRequest {
    pub metadata: Metadata,
    pub content: ContentHandle,
    pub location: GeodeticPoint,
}

impl LandmarkRequest {
    pub fn new(metadata: Metadata, content: ContentHandle, location: GeodeticPoint) -> Self {
        Self {
            metadata,
            content,
            location,
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<(RequestTicket, LandmarkRequest)>,
    next_ticket: u64,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh ticket without queueing anything
    pub fn issue_ticket(&mut self) -> RequestTicket {
        self.next_ticket += 1;
        RequestTicket(self.next_ticket)
    }

    pub fn push(&mut self, request: LandmarkRequest) -> RequestTicket {
        let ticket = self.issue_ticket();
        self.entries.push_back((ticket, request));
        ticket
    }

    /// Requeue under an existing ticket
    pub fn push_with_ticket(&mut self, ticket: RequestTicket, request: LandmarkRequest) {
        self.entries.push_back((ticket, request));
    }

    /// Remove a queued request before it is flushed
    pub fn cancel(&mut self, ticket: RequestTicket) -> Option<LandmarkRequest> {
        let position = self.entries.iter().position(|(t, _)| *t == ticket)?;
        self.entries.remove(position).map(|(_, request)| request)
    }

    /// Take every queued request in arrival order
    pub fn drain(&mut self) -> Vec<(RequestTicket, LandmarkRequest)> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(RequestTicket, LandmarkRequest)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: u64) -> LandmarkRequest {
        LandmarkRequest::new(Metadata::new(), ContentHandle(content), GeodeticPoint::new(1.0, 2.0))
    }

    #[test]
    fn test_drain_preserves_arrival_order() {
        let mut queue = PendingQueue::new();
        let first = queue.push(request(1));
        let second = queue.push(request(2));
        let third = queue.push(request(3));
        assert!(first < second && second < third);

        let drained = queue.drain();
        let contents: Vec<u64> = drained.iter().map(|(_, r)| r.content.0).collect();
        assert_eq!(contents, vec![1, 2, 3]);
        assert_eq!(drained[0].0, first);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_removes_single_entry() {
        let mut queue = PendingQueue::new();
        queue.push(request(1));
        let ticket = queue.push(request(2));
        queue.push(request(3));

        assert_eq!(queue.cancel(ticket).map(|r| r.content), Some(ContentHandle(2)));
        assert!(queue.cancel(ticket).is_none());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_tickets_are_never_reused() {
        let mut queue = PendingQueue::new();
        let first = queue.push(request(1));
        queue.drain();
        let second = queue.push(request(1));
        assert_ne!(first, second);
        assert_eq!(second.to_string(), "#2");
    }
}
