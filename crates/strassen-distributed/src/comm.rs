//! Point-to-point message passing between ranks.
//!
//! [`Communicator`] is the seam the engine is written against: rank
//! id, process count, tagged send/receive, a tag probe, and one
//! integer broadcast. [`ChannelCommunicator`] implements it over a
//! crossbeam channel mesh, one endpoint per rank, which is how the
//! test harness and the CLI run a whole coordinator/worker topology
//! inside a single process.

use std::collections::VecDeque;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

/// Integer message label routing a message to its logical channel.
pub type Tag = i32;

/// Transport failure. Always fatal to the run; the engine never
/// retries silently.
#[derive(Debug, thiserror::Error)]
pub enum CommError {
    /// The peer's endpoint is gone; a reply can never arrive.
    #[error("rank {rank} is disconnected")]
    Disconnected {
        /// Rank of the lost peer.
        rank: usize,
    },

    /// Coordinator and worker disagree about the message stream.
    #[error("protocol desynchronization: {0}")]
    Protocol(String),
}

/// Message-passing endpoint owned by one rank.
pub trait Communicator: Send {
    /// This process's rank in `[0, size)`. Rank 0 is the coordinator.
    fn rank(&self) -> usize;

    /// Total number of ranks.
    fn size(&self) -> usize;

    /// Send `payload` to `dest` under `tag`. Non-blocking: completion
    /// means the message is handed to the transport, not processed.
    fn send(&self, dest: usize, tag: Tag, payload: Vec<i32>) -> Result<(), CommError>;

    /// Blocking receive of the message from `src` carrying `tag`.
    /// Messages with other tags are held for later receives, so
    /// arrival order and receive order are independent.
    fn recv(&self, src: usize, tag: Tag) -> Result<Vec<i32>, CommError>;

    /// Blocking probe: the tag of the next pending message from `src`,
    /// without consuming it.
    fn probe(&self, src: usize) -> Result<Tag, CommError>;

    /// Collective broadcast of one integer from `root` to all ranks.
    /// Returns the broadcast value on every rank.
    fn broadcast(&self, root: usize, value: i32) -> Result<i32, CommError>;
}

struct Envelope {
    src: usize,
    tag: Tag,
    payload: Vec<i32>,
}

/// In-process communicator backed by a full mesh of unbounded
/// crossbeam channels.
pub struct ChannelCommunicator {
    rank: usize,
    // Senders to every other rank; the own-rank slot is `None` so that
    // this endpoint's inbox closes as soon as all peers are gone,
    // turning a lost peer into an error instead of a hang.
    peers: Vec<Option<Sender<Envelope>>>,
    inbox: Receiver<Envelope>,
    // Messages consumed from the inbox while looking for another tag.
    stash: Mutex<VecDeque<Envelope>>,
}

/// Reserved tag for the size broadcast, below the task-id tag space.
const BCAST_TAG: Tag = 1;

impl ChannelCommunicator {
    /// Build a mesh of `size` connected endpoints, one per rank.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    #[must_use]
    pub fn mesh(size: usize) -> Vec<Self> {
        assert!(size > 0, "a communicator needs at least one rank");
        let mut senders = Vec::with_capacity(size);
        let mut receivers = Vec::with_capacity(size);
        for _ in 0..size {
            let (tx, rx) = unbounded();
            senders.push(tx);
            receivers.push(rx);
        }
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| {
                let peers = senders
                    .iter()
                    .enumerate()
                    .map(|(dest, tx)| (dest != rank).then(|| tx.clone()))
                    .collect();
                Self {
                    rank,
                    peers,
                    inbox,
                    stash: Mutex::new(VecDeque::new()),
                }
            })
            .collect()
    }

    fn take_stashed(&self, src: usize, tag: Tag) -> Option<Vec<i32>> {
        let mut stash = self.stash.lock();
        let pos = stash.iter().position(|e| e.src == src && e.tag == tag)?;
        stash.remove(pos).map(|e| e.payload)
    }
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<i32>) -> Result<(), CommError> {
        let envelope = Envelope {
            src: self.rank,
            tag,
            payload,
        };
        let Some(peer) = self.peers.get(dest).and_then(Option::as_ref) else {
            return Err(CommError::Protocol(format!(
                "rank {} cannot send to itself or to unknown rank {dest}",
                self.rank
            )));
        };
        peer.send(envelope)
            .map_err(|_| CommError::Disconnected { rank: dest })
    }

    fn recv(&self, src: usize, tag: Tag) -> Result<Vec<i32>, CommError> {
        if let Some(payload) = self.take_stashed(src, tag) {
            return Ok(payload);
        }
        loop {
            let envelope = self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected { rank: src })?;
            if envelope.src == src && envelope.tag == tag {
                return Ok(envelope.payload);
            }
            self.stash.lock().push_back(envelope);
        }
    }

    fn probe(&self, src: usize) -> Result<Tag, CommError> {
        {
            let stash = self.stash.lock();
            if let Some(envelope) = stash.iter().find(|e| e.src == src) {
                return Ok(envelope.tag);
            }
        }
        loop {
            let envelope = self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected { rank: src })?;
            let found = envelope.src == src;
            let tag = envelope.tag;
            self.stash.lock().push_back(envelope);
            if found {
                return Ok(tag);
            }
        }
    }

    fn broadcast(&self, root: usize, value: i32) -> Result<i32, CommError> {
        if self.rank == root {
            for dest in 0..self.size() {
                if dest != root {
                    self.send(dest, BCAST_TAG, vec![value])?;
                }
            }
            Ok(value)
        } else {
            let payload = self.recv(root, BCAST_TAG)?;
            payload
                .first()
                .copied()
                .ok_or_else(|| CommError::Protocol("empty broadcast payload".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_and_recv_by_tag() {
        let mut mesh = ChannelCommunicator::mesh(2);
        let b = mesh.pop().unwrap();
        let a = mesh.pop().unwrap();

        a.send(1, 7, vec![1, 2, 3]).unwrap();
        assert_eq!(b.recv(0, 7).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn recv_reorders_by_tag() {
        let mut mesh = ChannelCommunicator::mesh(2);
        let b = mesh.pop().unwrap();
        let a = mesh.pop().unwrap();

        a.send(1, 10, vec![10]).unwrap();
        a.send(1, 20, vec![20]).unwrap();

        // Receive in the opposite order of arrival.
        assert_eq!(b.recv(0, 20).unwrap(), vec![20]);
        assert_eq!(b.recv(0, 10).unwrap(), vec![10]);
    }

    #[test]
    fn probe_does_not_consume() {
        let mut mesh = ChannelCommunicator::mesh(2);
        let b = mesh.pop().unwrap();
        let a = mesh.pop().unwrap();

        a.send(1, 42, vec![5]).unwrap();
        assert_eq!(b.probe(0).unwrap(), 42);
        assert_eq!(b.probe(0).unwrap(), 42);
        assert_eq!(b.recv(0, 42).unwrap(), vec![5]);
    }

    #[test]
    fn broadcast_reaches_all_ranks() {
        let mesh = ChannelCommunicator::mesh(3);
        let mut iter = mesh.into_iter();
        let root = iter.next().unwrap();
        let w1 = iter.next().unwrap();
        let w2 = iter.next().unwrap();

        let h1 = std::thread::spawn(move || w1.broadcast(0, 0).unwrap());
        let h2 = std::thread::spawn(move || w2.broadcast(0, 0).unwrap());
        assert_eq!(root.broadcast(0, 128).unwrap(), 128);
        assert_eq!(h1.join().unwrap(), 128);
        assert_eq!(h2.join().unwrap(), 128);
    }

    #[test]
    fn recv_after_peer_gone_is_disconnected() {
        let mut mesh = ChannelCommunicator::mesh(2);
        let b = mesh.pop().unwrap();
        drop(mesh); // rank 0 and its sender clones

        let err = b.recv(0, 99).unwrap_err();
        assert!(matches!(err, CommError::Disconnected { rank: 0 }));
    }

    #[test]
    fn send_to_self_is_a_protocol_error() {
        let mut mesh = ChannelCommunicator::mesh(2);
        let b = mesh.pop().unwrap();
        assert!(matches!(
            b.send(1, 5, vec![]).unwrap_err(),
            CommError::Protocol(_)
        ));
    }
}
