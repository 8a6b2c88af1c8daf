use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted handle with read-write locking.
///
/// `MtResource` is how chunk data crosses thread boundaries. The chunk grid keeps
/// one handle per resident chunk and worker jobs receive clones of it, so a job
/// never holds a reference into the grid's map itself: inserting or evicting
/// other chunks cannot invalidate what a job is working on.
///
/// # Examples
///
/// ```
/// use voxel_world::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let handle = counter.clone();
///
/// std::thread::spawn(move || *handle.get_mut() += 1)
///     .join()
///     .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Wraps `resource` in a new shared handle.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard on the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned, which only happens after a writer panicked.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap()
    }

    /// Returns a write guard on the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned, which only happens after a writer panicked.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap()
    }

    /// Returns `true` when both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_value() {
        let resource = MtResource::new(vec![1, 2, 3]);
        let clone = resource.clone();

        clone.get_mut().push(4);

        assert_eq!(resource.get().len(), 4);
        assert!(resource.ptr_eq(&clone));
        assert!(!resource.ptr_eq(&MtResource::new(vec![1, 2, 3, 4])));
    }
}
