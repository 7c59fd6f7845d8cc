//! A minimal in-process collective: all-gather and broadcast across a
//! fixed set of workers sharing one process, used to coordinate Parareal's
//! predictor-corrector exchange. This stands in for MPI;
//! binding to a real MPI implementation is out of scope (spec's explicit
//! Non-goal on distributed-memory transport).

use std::sync::{Arc, Barrier, Mutex};

/// A barrier-synchronized collective shared by `world_size` workers. Each
/// worker calls [`Collective::all_gather`] or [`Collective::broadcast`]
/// with its own rank; the call blocks until every worker has arrived.
pub struct Collective<T> {
    world_size: usize,
    barrier: Barrier,
    slots: Vec<Mutex<Option<T>>>,
}

impl<T: Clone> Collective<T> {
    pub fn new(world_size: usize) -> Arc<Self> {
        Arc::new(Self {
            world_size,
            barrier: Barrier::new(world_size),
            slots: (0..world_size).map(|_| Mutex::new(None)).collect(),
        })
    }

    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// Every worker contributes `value`; every worker receives the full,
    /// rank-ordered vector of contributions.
    pub fn all_gather(&self, rank: usize, value: T) -> Vec<T> {
        *self.slots[rank].lock().unwrap() = Some(value);
        self.barrier.wait();
        let gathered = self
            .slots
            .iter()
            .map(|slot| slot.lock().unwrap().clone().expect("every rank contributed before the barrier released"))
            .collect();
        self.barrier.wait();
        gathered
    }

    /// Rank `root` contributes `value` (ignored on other ranks); every
    /// worker receives it.
    pub fn broadcast(&self, rank: usize, root: usize, value: Option<T>) -> T {
        if rank == root {
            *self.slots[root].lock().unwrap() = value;
        }
        self.barrier.wait();
        let received = self.slots[root]
            .lock()
            .unwrap()
            .clone()
            .expect("root contributed a value before the barrier released");
        self.barrier.wait();
        received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn all_gather_collects_every_rank_in_order() {
        let collective = Collective::new(4);
        let handles: Vec<_> = (0..4)
            .map(|rank| {
                let collective = Arc::clone(&collective);
                thread::spawn(move || collective.all_gather(rank, rank * 10))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec![0, 10, 20, 30]);
        }
    }

    #[test]
    fn broadcast_delivers_the_root_value_to_every_worker() {
        let collective = Collective::new(3);
        let handles: Vec<_> = (0..3)
            .map(|rank| {
                let collective = Arc::clone(&collective);
                thread::spawn(move || collective.broadcast(rank, 1, if rank == 1 { Some(42) } else { None }))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
    }
}
