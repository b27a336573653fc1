//! Reactive properties with change detection.
//!
//! A [`Property`] wraps a value behind a read/write lock. Setters report
//! whether the value actually changed so the owner can decide whether to emit
//! its notification signal.
//!
//! ```
//! use tablero_core::{Property, Signal};
//!
//! let page = Property::new(0usize);
//! let page_changed = Signal::<usize>::new();
//!
//! if page.set(3) {
//!     page_changed.emit(3);
//! }
//! assert!(!page.set(3));
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A reactive property that tracks changes.
///
/// `Property<T>` uses interior mutability and is `Send + Sync` whenever `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without change detection.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }

    /// Modify the value in place under the write lock.
    ///
    /// Returns the new value when the modification changed it. The whole
    /// read-modify-write happens atomically with respect to other callers.
    pub fn update<F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut current = self.value.write();
        let mut next = current.clone();
        f(&mut next);
        if *current != next {
            *current = next.clone();
            Some(next)
        } else {
            None
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_set_reports_change() {
        let prop = Property::new(42);
        assert_eq!(prop.get(), 42);
        assert!(!prop.set(42));
        assert!(prop.set(100));
        assert_eq!(prop.get(), 100);
    }

    #[test]
    fn test_property_replace() {
        let prop = Property::new(String::from("a"));
        assert_eq!(prop.replace("a".into()), None);
        assert_eq!(prop.replace("b".into()), Some("a".to_string()));
        assert_eq!(prop.get(), "b");
    }

    #[test]
    fn test_property_update() {
        let prop = Property::new(vec![1, 2]);
        assert_eq!(prop.update(|v| v.push(3)), Some(vec![1, 2, 3]));
        assert_eq!(prop.update(|v| v.retain(|_| true)), None);
        assert_eq!(prop.with(|v| v.len()), 3);
    }

    #[test]
    fn test_property_set_silent() {
        let prop = Property::<u8>::default();
        prop.set_silent(7);
        assert_eq!(prop.get(), 7);
    }
}
