//! Wait for both of two futures.

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

/// Run two futures concurrently, returning both outputs once both have
/// completed.
pub fn join<F1: Future, F2: Future>(
    f1: F1,
    f2: F2,
) -> impl Future<Output = (F1::Output, F2::Output)> {
    Join {
        f1,
        f2,
        o1: None,
        o2: None,
    }
}

struct Join<F1: Future, F2: Future> {
    f1: F1,
    f2: F2,
    o1: Option<F1::Output>,
    o2: Option<F2::Output>,
}

impl<F1, F2> Future for Join<F1, F2>
where
    F1: Future,
    F2: Future,
{
    type Output = (F1::Output, F2::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: the fields are never moved out of the pinned struct.
        #[allow(unsafe_code)]
        let this = unsafe { self.get_unchecked_mut() };

        if this.o1.is_none() {
            #[allow(unsafe_code)]
            if let Poll::Ready(output) = unsafe { Pin::new_unchecked(&mut this.f1) }.poll(cx) {
                this.o1 = Some(output);
            }
        }

        if this.o2.is_none() {
            #[allow(unsafe_code)]
            if let Poll::Ready(output) = unsafe { Pin::new_unchecked(&mut this.f2) }.poll(cx) {
                this.o2 = Some(output);
            }
        }

        if this.o1.is_some() && this.o2.is_some() {
            Poll::Ready((this.o1.take().unwrap(), this.o2.take().unwrap()))
        } else {
            Poll::Pending
        }
    }
}
