//! Memory management utilities
//!
//! Scratch buffers used on the per-pair detection path are drawn from a
//! [`PoolAllocator`] owned by the caller. The pool grows when every buffer is
//! checked out and never shrinks, so a warm pool performs no heap allocation.

/// Grow-only free-list pool of reusable objects
///
/// Not synchronized: one pool per thread.
#[derive(Debug)]
pub struct PoolAllocator<T> {
    free: Vec<T>,
    allocated: usize,
}

impl<T: Default> PoolAllocator<T> {
    /// Create a new pool allocator with `capacity` objects ready for checkout
    pub fn new(capacity: usize) -> Self {
        let free = (0..capacity).map(|_| T::default()).collect();
        Self {
            free,
            allocated: capacity,
        }
    }

    /// Take an object out of the pool, allocating a new one if the pool is empty
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(item) => item,
            None => {
                self.allocated += 1;
                log::debug!("Scratch pool grew to {} buffers", self.allocated);
                T::default()
            }
        }
    }

    /// Return an object to the pool for reuse
    pub fn release(&mut self, item: T) {
        self.free.push(item);
    }

    /// Number of objects currently available without allocating
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total number of objects this pool has ever created
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

impl<T: Default> Default for PoolAllocator<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_reuses_released_items() {
        let mut pool: PoolAllocator<Vec<u32>> = PoolAllocator::new(1);
        let mut item = pool.acquire();
        item.push(7);
        pool.release(item);

        let reused = pool.acquire();
        assert_eq!(reused, vec![7]);
        assert_eq!(pool.allocated(), 1);
    }

    #[test]
    fn test_pool_grows_but_never_shrinks() {
        let mut pool: PoolAllocator<Vec<u32>> = PoolAllocator::new(0);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.allocated(), 2);

        pool.release(a);
        pool.release(b);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.allocated(), 2);
    }
}
