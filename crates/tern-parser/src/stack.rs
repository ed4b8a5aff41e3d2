//! Fixed-capacity stacks for the compiler's auxiliary state.

/// Stack enforced and size limited vector.
///
/// A push past capacity is refused with the stack's overflow message, which
/// the compiler reports as a "too complex" error.
pub struct BoundedStack<T> {
    overflow_message: &'static str,
    capacity: usize,
    vec: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for BoundedStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.vec)
    }
}

impl<T> BoundedStack<T> {
    pub fn new(capacity: usize, overflow_message: &'static str) -> Self {
        Self {
            overflow_message,
            capacity,
            vec: Vec::with_capacity(capacity.min(64)),
        }
    }

    pub fn push(&mut self, val: T) -> Result<(), &'static str> {
        if self.vec.len() >= self.capacity {
            return Err(self.overflow_message);
        }
        self.vec.push(val);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.vec.pop()
    }

    pub fn last(&self) -> Option<&T> {
        self.vec.last()
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
}
