/// Handle into a [`ConfArena`]. Cheap to copy, valid for the arena's
/// whole lifetime, and only meaningful for the arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfId(u32);

impl ConfId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bump arena for fixed-stride configuration buffers.
///
/// Configurations are isotope-count vectors of a stride fixed per search
/// (the per-element isotope count, or the dimension count for the ordered
/// generator). They are allocated in bulk during enumeration and never
/// freed individually, so a flat backing vector handing out slot indices
/// covers the allocator's whole contract: O(1) amortized allocation,
/// stable handles, one deallocation when the search is dropped.
#[derive(Debug, Clone)]
pub struct ConfArena {
    stride: usize,
    data: Vec<u32>,
}

impl ConfArena {
    pub fn new(stride: usize) -> Self {
        Self {
            stride,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(stride: usize, slots: usize) -> Self {
        Self {
            stride,
            data: Vec::with_capacity(stride * slots),
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy `conf` into a fresh slot.
    pub fn alloc(&mut self, conf: &[u32]) -> ConfId {
        assert_eq!(conf.len(), self.stride, "conf does not match arena stride");
        let id = ConfId(self.len() as u32);
        self.data.extend_from_slice(conf);
        id
    }

    pub fn alloc_zeroed(&mut self) -> ConfId {
        let id = ConfId(self.len() as u32);
        self.data.resize(self.data.len() + self.stride, 0);
        id
    }

    /// Copy the slot at `id` into a fresh slot.
    pub fn alloc_copy(&mut self, id: ConfId) -> ConfId {
        let start = id.index() * self.stride;
        let new_id = ConfId(self.len() as u32);
        self.data.extend_from_within(start..start + self.stride);
        new_id
    }

    pub fn get(&self, id: ConfId) -> &[u32] {
        let start = id.index() * self.stride;
        &self.data[start..start + self.stride]
    }

    pub fn get_mut(&mut self, id: ConfId) -> &mut [u32] {
        let start = id.index() * self.stride;
        &mut self.data[start..start + self.stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_get() {
        let mut arena = ConfArena::new(3);
        let a = arena.alloc(&[1, 2, 3]);
        let b = arena.alloc(&[4, 5, 6]);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), &[1, 2, 3]);
        assert_eq!(arena.get(b), &[4, 5, 6]);
    }

    #[test]
    fn test_handles_survive_growth() {
        let mut arena = ConfArena::new(2);
        let first = arena.alloc(&[7, 8]);
        for i in 0..10_000 {
            arena.alloc(&[i, i + 1]);
        }
        assert_eq!(arena.get(first), &[7, 8]);
    }

    #[test]
    fn test_alloc_copy_is_independent() {
        let mut arena = ConfArena::new(2);
        let a = arena.alloc(&[1, 1]);
        let b = arena.alloc_copy(a);
        arena.get_mut(b)[0] = 9;
        assert_eq!(arena.get(a), &[1, 1]);
        assert_eq!(arena.get(b), &[9, 1]);
    }
}
