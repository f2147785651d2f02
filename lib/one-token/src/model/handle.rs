use std::fmt;

/// Opaque reference to an object held by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    /// Never assigned to an object.
    pub const INVALID: Self = Self(0);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ObjectHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub(crate) u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic handle source; handles are never reused.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    next: u64,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self {
            next: ObjectHandle::INVALID.0 + 1,
        }
    }
}

impl HandleAllocator {
    pub fn allocate(&mut self) -> ObjectHandle {
        let handle = ObjectHandle(self.next);
        self.next += 1;
        handle
    }
}
