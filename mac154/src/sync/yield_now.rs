//! Cooperative yielding.

use core::future::poll_fn;
use core::task::Poll;

/// Yield once to the executor, giving sibling branches a chance to run.
pub async fn yield_now() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use pollster::FutureExt as _;

    use super::yield_now;

    #[test]
    fn yields_once() {
        async {
            yield_now().await;
        }
        .block_on();
    }
}
