//! A single-slot signalling channel.
//!
//! The channel carries one message at a time between two branches of a
//! task. [`Sender::send`] never blocks and overwrites an unread message;
//! [`Sender::send_async`] waits for the slot to drain instead.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Poll, Waker};

struct State<T> {
    message: Option<T>,
    recv_waker: Option<Waker>,
    send_waker: Option<Waker>,
}

/// A single-slot channel.
pub struct Channel<T> {
    state: RefCell<State<T>>,
}

impl<T> Channel<T> {
    /// Create a new, empty channel.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                message: None,
                recv_waker: None,
                send_waker: None,
            }),
        }
    }

    /// Split the channel into its sender and receiver halves, resetting
    /// any previous state.
    pub fn split(&mut self) -> (Sender<'_, T>, Receiver<'_, T>) {
        *self = Self::new();
        (Sender { channel: self }, Receiver { channel: self })
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The sending half of a [`Channel`].
pub struct Sender<'a, T> {
    channel: &'a Channel<T>,
}

impl<T> Sender<'_, T> {
    /// Send a message, overwriting an unread one. Returns `true` when a
    /// previous message was overwritten.
    pub fn send(&self, message: T) -> bool {
        let mut state = self.channel.state.borrow_mut();
        let replaced = state.message.replace(message).is_some();

        if let Some(waker) = state.recv_waker.take() {
            waker.wake();
        }

        replaced
    }

    /// Returns `true` when an unread message sits in the channel.
    pub fn has_item(&self) -> bool {
        self.channel.state.borrow().message.is_some()
    }

    /// Wait for the channel to drain, then send.
    pub async fn send_async(&self, message: T) {
        poll_fn(|cx| {
            let mut state = self.channel.state.borrow_mut();
            if state.message.is_some() {
                match &mut state.send_waker {
                    Some(waker) if waker.will_wake(cx.waker()) => waker.clone_from(cx.waker()),
                    Some(waker) => {
                        waker.wake_by_ref();
                        waker.clone_from(cx.waker());
                    }
                    waker @ None => *waker = Some(cx.waker().clone()),
                }
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
        .await;

        self.send(message);
    }
}

/// The receiving half of a [`Channel`].
pub struct Receiver<'a, T> {
    channel: &'a Channel<T>,
}

impl<T> Receiver<'_, T> {
    /// Wait for a message.
    pub async fn receive(&self) -> T {
        poll_fn(|cx| {
            let mut state = self.channel.state.borrow_mut();

            match state.message.take() {
                Some(message) => {
                    if let Some(waker) = state.send_waker.take() {
                        waker.wake();
                    }
                    Poll::Ready(message)
                }
                None => {
                    match &mut state.recv_waker {
                        Some(waker) => waker.clone_from(cx.waker()),
                        waker @ None => *waker = Some(cx.waker().clone()),
                    }
                    Poll::Pending
                }
            }
        })
        .await
    }

    /// Returns `true` when an unread message sits in the channel.
    pub fn has_item(&self) -> bool {
        self.channel.state.borrow().message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use pollster::FutureExt as _;

    use super::Channel;
    use crate::sync::{join::join, yield_now::yield_now};

    #[test]
    fn send_then_receive() {
        async {
            let mut channel = Channel::new();
            let (tx, rx) = channel.split();
            tx.send(1);
            assert_eq!(rx.receive().await, 1);
        }
        .block_on();
    }

    #[test]
    fn send_overwrites() {
        async {
            let mut channel = Channel::new();
            let (tx, rx) = channel.split();
            assert!(!tx.send(1));
            assert!(tx.send(2));
            assert_eq!(rx.receive().await, 2);
        }
        .block_on();
    }

    #[test]
    fn ping_pong() {
        async {
            let mut channel = Channel::new();
            let (tx, rx) = channel.split();

            join(
                async {
                    for i in 0..10 {
                        tx.send_async(i).await;
                        yield_now().await;
                    }
                },
                async {
                    for i in 0..10 {
                        assert_eq!(rx.receive().await, i);
                    }
                },
            )
            .await;
        }
        .block_on();
    }
}
