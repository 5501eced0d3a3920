//! An async mutex for cooperative tasks.
//!
//! The mutex serializes access between concurrent branches of a single
//! task (typically composed with `select`/`join`). [`Mutex::try_lock`]
//! exists for contexts that must not block, such as the TSCH slot
//! callback, which abandons its slot instead of waiting.

use core::cell::{Cell, RefCell, UnsafeCell};
use core::future::poll_fn;
use core::ops::{Deref, DerefMut};
use core::task::{Poll, Waker};

/// An async mutual exclusion primitive.
pub struct Mutex<T> {
    value: UnsafeCell<T>,
    locked: Cell<bool>,
    waiter: RefCell<Option<Waker>>,
}

impl<T> Mutex<T> {
    /// Create a new mutex holding `value`.
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
            locked: Cell::new(false),
            waiter: RefCell::new(None),
        }
    }

    /// Acquire the mutex, waiting until it is available.
    pub async fn lock(&self) -> MutexGuard<'_, T> {
        poll_fn(|cx| {
            if self.locked.get() {
                // Only remember the most recent waiter; an older one is
                // woken so it can re-register.
                let mut waiter = self.waiter.borrow_mut();
                if let Some(previous) = waiter.replace(cx.waker().clone()) {
                    if !previous.will_wake(cx.waker()) {
                        previous.wake();
                    }
                }
                Poll::Pending
            } else {
                self.locked.set(true);
                Poll::Ready(())
            }
        })
        .await;

        MutexGuard { mutex: self }
    }

    /// Try to acquire the mutex without waiting.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        if self.locked.get() {
            None
        } else {
            self.locked.set(true);
            Some(MutexGuard { mutex: self })
        }
    }

    /// Get mutable access to the value without locking. Requires exclusive
    /// access to the mutex itself.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

/// Exclusive access to the value protected by a [`Mutex`].
pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Safety: the guard exists, so the lock is held.
        #[allow(unsafe_code)]
        unsafe {
            &*self.mutex.value.get()
        }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: the guard exists, so the lock is held.
        #[allow(unsafe_code)]
        unsafe {
            &mut *self.mutex.value.get()
        }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.locked.set(false);

        if let Some(waker) = self.mutex.waiter.borrow_mut().take() {
            waker.wake();
        }
    }
}
