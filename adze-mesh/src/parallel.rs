//! Peer communication bus.
//!
//! A sweep runs SPMD over a fixed set of peers; every collective here is
//! blocking, and all peers must reach each collective in the same order.
//! [`SerialComm`] serves the single-peer case. [`LocalComm`] couples a group
//! of OS threads in one process, which is how the multi-peer test-suite
//! drives two meshes in lockstep.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Collective operations shared by every peer of a sweep.
pub trait Comm: Send + Sync {
    /// This peer's rank, in `0..peers()`.
    fn rank(&self) -> usize;
    /// Number of participating peers.
    fn peers(&self) -> usize;
    /// Blocking all-reduce sum.
    fn add_i64(&self, value: i64) -> i64;
    /// Blocking all-reduce logical or.
    fn or(&self, value: bool) -> bool;
    /// Blocking all-to-all exchange. `outgoing[q]` is the message for peer
    /// `q` (`outgoing[rank()]` must be empty); the result is indexed by
    /// source peer. No peer begins the next collective until every peer has
    /// collected its incoming messages.
    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> Vec<Vec<u8>>;
}

/// The trivial bus for a single peer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Comm for SerialComm {
    fn rank(&self) -> usize { 0 }
    fn peers(&self) -> usize { 1 }
    fn add_i64(&self, value: i64) -> i64 { value }
    fn or(&self, value: bool) -> bool { value }
    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        debug_assert!(outgoing.iter().all(Vec::is_empty));
        outgoing
    }
}

struct State {
    generation: u64,
    arrived: usize,
    acc_i64: i64,
    acc_bool: bool,
    result_i64: i64,
    result_bool: bool,
    // mailboxes[dest][src]
    mailboxes: Vec<Vec<Vec<u8>>>,
}

struct Shared {
    peers: usize,
    state: Mutex<State>,
    arrival: Condvar,
}

impl Shared {
    /// Generation barrier. `update` runs under the lock on arrival; the last
    /// arriver runs `publish` and releases the group.
    fn rendezvous(&self, update: impl FnOnce(&mut State), publish: impl FnOnce(&mut State)) {
        let mut state = self.state.lock();
        update(&mut state);
        state.arrived += 1;
        if state.arrived == self.peers {
            state.arrived = 0;
            publish(&mut state);
            state.generation += 1;
            self.arrival.notify_all();
        } else {
            let generation = state.generation;
            while state.generation == generation {
                self.arrival.wait(&mut state);
            }
        }
    }
}

/// In-process bus coupling one thread per peer.
///
/// ```
/// use adze_mesh::{Comm, LocalComm};
/// let group = LocalComm::group(2);
/// let handles: Vec<_> = group
///     .into_iter()
///     .map(|comm| std::thread::spawn(move || comm.add_i64(comm.rank() as i64 + 1)))
///     .collect();
/// for h in handles {
///     assert_eq!(h.join().unwrap(), 3);
/// }
/// ```
pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalComm({}/{})", self.rank, self.shared.peers)
    }
}

impl LocalComm {
    /// Creates a coupled group of `peers` buses, one per peer, rank in order.
    pub fn group(peers: usize) -> Vec<LocalComm> {
        assert!(peers > 0);
        let shared = Arc::new(Shared {
            peers,
            state: Mutex::new(State {
                generation: 0,
                arrived: 0,
                acc_i64: 0,
                acc_bool: false,
                result_i64: 0,
                result_bool: false,
                mailboxes: vec![vec![Vec::new(); peers]; peers],
            }),
            arrival: Condvar::new(),
        });
        (0..peers)
            .map(|rank| LocalComm { rank, shared: shared.clone() })
            .collect()
    }
}

impl Comm for LocalComm {
    fn rank(&self) -> usize { self.rank }
    fn peers(&self) -> usize { self.shared.peers }

    fn add_i64(&self, value: i64) -> i64 {
        self.shared.rendezvous(
            |s| s.acc_i64 += value,
            |s| {
                s.result_i64 = s.acc_i64;
                s.acc_i64 = 0;
            },
        );
        self.shared.state.lock().result_i64
    }

    fn or(&self, value: bool) -> bool {
        self.shared.rendezvous(
            |s| s.acc_bool |= value,
            |s| {
                s.result_bool = s.acc_bool;
                s.acc_bool = false;
            },
        );
        self.shared.state.lock().result_bool
    }

    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        assert_eq!(outgoing.len(), self.peers());
        debug_assert!(outgoing[self.rank].is_empty());
        self.shared.rendezvous(
            |s| {
                for (dest, message) in outgoing.into_iter().enumerate() {
                    s.mailboxes[dest][self.rank] = message;
                }
            },
            |_| {},
        );
        let incoming = {
            let mut state = self.shared.state.lock();
            state.mailboxes[self.rank]
                .iter_mut()
                .map(std::mem::take)
                .collect()
        };
        // Nobody deposits for the next exchange until everyone has taken.
        self.shared.rendezvous(|_| {}, |_| {});
        incoming
    }
}

/// Encodes a word buffer as a bus message.
#[inline]
pub fn pack_words(words: &[u64]) -> Vec<u8> { bytemuck::cast_slice(words).to_vec() }

/// Decodes a bus message produced by [`pack_words`].
pub fn unpack_words(bytes: &[u8]) -> Vec<u64> {
    assert_eq!(bytes.len() % 8, 0, "truncated bus message");
    bytes
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}
