//! Cancellable rebuild scheduling.
//!
//! Every rebuild takes a [`RebuildToken`] from the shared [`RebuildGeneration`].
//! Starting a newer rebuild bumps the generation, and older rebuilds notice at
//! their next yield point and stop.

use core::future::Future;
use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::{task, time};

/// Shared generation counter for pane rebuilds.
#[derive(Debug, Default)]
pub struct RebuildGeneration {
    current: AtomicU64,
}

impl RebuildGeneration {
    pub const fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
        }
    }

    /// Start a new rebuild; every older token becomes stale.
    pub fn begin(self: &Arc<Self>) -> RebuildToken {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        RebuildToken {
            counter: Arc::clone(self),
            generation,
        }
    }

    /// Abandon whatever rebuild is running.
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

/// Ticket of one rebuild.
#[derive(Clone, Debug)]
pub struct RebuildToken {
    counter: Arc<RebuildGeneration>,
    generation: u64,
}

impl RebuildToken {
    pub fn is_cancelled(&self) -> bool {
        self.counter.current() != self.generation
    }

    /// Yield to the executor after every `batch` units of work.
    ///
    /// Returns `false` once the rebuild was superseded.
    pub async fn checkpoint(&self, done: usize, batch: usize) -> bool {
        if done > 0 && done.is_multiple_of(batch.max(1)) {
            task::yield_now().await;
        }
        !self.is_cancelled()
    }
}

/// Flag the host reads to draw the loading affordance.
#[derive(Clone, Debug, Default)]
pub struct LoadingIndicator {
    shown: Arc<AtomicBool>,
}

impl LoadingIndicator {
    pub fn is_shown(&self) -> bool {
        self.shown.load(Ordering::Acquire)
    }

    fn set(&self, shown: bool) {
        self.shown.store(shown, Ordering::Release);
    }
}

/// Await `work`, raising `indicator` if it takes longer than `delay`.
///
/// The indicator is always lowered when `work` finishes.
pub async fn with_loading_indicator<F: Future>(
    work: F,
    delay: Duration,
    indicator: &LoadingIndicator,
) -> F::Output {
    tokio::pin!(work);
    let timer = time::sleep(delay);
    tokio::pin!(timer);
    let mut timer_fired = false;
    let output = loop {
        tokio::select! {
            output = &mut work => break output,
            () = &mut timer, if !timer_fired => {
                timer_fired = true;
                indicator.set(true);
            }
        }
    };
    indicator.set(false);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn newer_rebuild_cancels_older() {
        let generation = Arc::new(RebuildGeneration::new());
        let first = generation.begin();
        assert!(first.checkpoint(1, 1).await);
        let second = generation.begin();
        assert!(!first.checkpoint(2, 1).await);
        assert!(second.checkpoint(0, 1).await);
        generation.cancel();
        assert!(second.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_raises_indicator() {
        let indicator = LoadingIndicator::default();
        let observer = indicator.clone();
        let value = with_loading_indicator(
            async {
                time::sleep(Duration::from_millis(500)).await;
                observer.is_shown()
            },
            Duration::from_millis(200),
            &indicator,
        )
        .await;
        assert!(value);
        assert!(!indicator.is_shown());
    }

    #[tokio::test]
    async fn fast_work_never_shows_indicator() {
        let indicator = LoadingIndicator::default();
        let value = with_loading_indicator(async { 7i32 }, Duration::from_secs(5), &indicator).await;
        assert_eq!(value, 7i32);
        assert!(!indicator.is_shown());
    }
}
