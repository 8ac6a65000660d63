use crate::error::{AccessFault, SimError};

/// Per-set least-recently-used state: one fixed-capacity recency queue per
/// cache set
///
/// The queue *is* the LRU ordering. Front is least recently used, back is
/// most recently used, and a slot holding `None` is still empty. Capacity is
/// the associativity, so a tag falls out of the queue exactly when its block
/// is evicted from the set.
pub struct LruQueues {
    queues: Vec<Vec<Option<u32>>>,
}

impl LruQueues {
    pub fn new(num_sets: u32, associativity: u32) -> Self {
        Self {
            queues: vec![vec![None; associativity as usize]; num_sets as usize],
        }
    }

    /// Records an access to `tag` in `set` and reports the eviction it causes.
    ///
    /// A tag already in the queue is moved to the back; nothing leaves
    /// residency. An absent tag takes over the front slot (shifting the rest
    /// forward) and is appended at the back: if the vacated slot was still
    /// empty the set had room and nothing is evicted, otherwise the front
    /// occupant was the least recently used tag and is the one evicted.
    pub fn touch(&mut self, set: usize, tag: u32) -> Result<Option<u32>, SimError> {
        let queue = self
            .queues
            .get_mut(set)
            .ok_or(SimError::InvalidAddress(AccessFault::SetOutOfRange(set)))?;
        match queue.iter().position(|slot| *slot == Some(tag)) {
            Some(position) => {
                // Already resident, only refresh recency
                queue.remove(position);
                queue.push(Some(tag));
                Ok(None)
            }
            None => {
                let vacated = queue.remove(0);
                queue.push(Some(tag));
                Ok(vacated)
            }
        }
    }

    /// The resident tags of a set, oldest to newest, empty slots omitted
    pub fn residency(&self, set: usize) -> Vec<u32> {
        self.queues[set].iter().flatten().copied().collect()
    }
}
