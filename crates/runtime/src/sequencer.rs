use std::collections::BTreeMap;

use tracing::debug;

/// Sequence stamp attached to one outgoing request.
///
/// Sequence numbers start at 1 on every channel; 0 means "nothing issued".
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket<C> {
    pub channel: C,
    pub seq: u64,
}

/// Per-channel last-write-wins ordering for asynchronous request/response.
///
/// Every request is stamped with a ticket from [`RequestSequencer::issue`].
/// When its response comes back, the consumer asks [`RequestSequencer::is_current`]
/// and drops the response unless it answers the most recent request issued on
/// that channel. Channels never affect each other.
#[derive(Debug, Clone)]
pub struct RequestSequencer<C> {
    latest: BTreeMap<C, u64>,
}

impl<C: Ord + Copy + std::fmt::Debug> RequestSequencer<C> {
    pub fn new() -> Self {
        Self {
            latest: BTreeMap::new(),
        }
    }

    pub fn issue(&mut self, channel: C) -> Ticket<C> {
        let seq = self.bump(channel);
        Ticket { channel, seq }
    }

    /// Makes every ticket issued so far on `channel` stale without issuing a new one.
    pub fn invalidate(&mut self, channel: C) {
        let seq = self.bump(channel);
        debug!(?channel, seq, "channel invalidated");
    }

    pub fn latest(&self, channel: C) -> u64 {
        self.latest.get(&channel).copied().unwrap_or(0)
    }

    pub fn is_current(&self, ticket: &Ticket<C>) -> bool {
        ticket.seq != 0 && ticket.seq == self.latest(ticket.channel)
    }

    fn bump(&mut self, channel: C) -> u64 {
        let seq = self.latest.entry(channel).or_insert(0);
        *seq += 1;
        *seq
    }
}

impl<C: Ord + Copy + std::fmt::Debug> Default for RequestSequencer<C> {
    fn default() -> Self {
        Self::new()
    }
}
