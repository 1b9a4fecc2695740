//! Waiting between queue status polls.

use async_trait::async_trait;

/// Suspends a poll loop between two status requests.
///
/// The edge runtime has no timer, so the default does not wait at all. Hosts
/// with a clock can pause for a real interval.
#[async_trait(?Send)]
pub trait Pause {
    async fn pause(&self);
}

/// Continue polling right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

#[async_trait(?Send)]
impl Pause for NoPause {
    async fn pause(&self) {}
}

#[async_trait(?Send)]
impl<P: Pause + ?Sized> Pause for &P {
    async fn pause(&self) {
        (**self).pause().await
    }
}
