//! Wait for the first of two futures.

use super::Either;
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

/// Run two futures concurrently, returning the output of the first to
/// complete. The other future is dropped.
pub fn select<F1: Future, F2: Future>(
    f1: F1,
    f2: F2,
) -> impl Future<Output = Either<F1::Output, F2::Output>> {
    Select { f1, f2 }
}

struct Select<F1, F2> {
    f1: F1,
    f2: F2,
}

impl<F1, F2> Future for Select<F1, F2>
where
    F1: Future,
    F2: Future,
{
    type Output = Either<F1::Output, F2::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: the fields are never moved out of the pinned struct.
        #[allow(unsafe_code)]
        let this = unsafe { self.get_unchecked_mut() };

        #[allow(unsafe_code)]
        if let Poll::Ready(output) = unsafe { Pin::new_unchecked(&mut this.f1) }.poll(cx) {
            return Poll::Ready(Either::First(output));
        }

        #[allow(unsafe_code)]
        if let Poll::Ready(output) = unsafe { Pin::new_unchecked(&mut this.f2) }.poll(cx) {
            return Poll::Ready(Either::Second(output));
        }

        Poll::Pending
    }
}
