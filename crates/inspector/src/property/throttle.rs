//! Single-slot apply queue for one row.

use log::trace;

/// A declaration text waiting to reach the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingApply {
    pub text: String,
    pub major: bool,
}

/// At most one pending apply per row; scheduling replaces the pending one.
#[derive(Clone, Debug, Default)]
pub struct ApplyThrottler {
    pending: Option<PendingApply>,
    superseded: usize,
}

impl ApplyThrottler {
    pub fn schedule(&mut self, text: String, major: bool) {
        if let Some(previous) = self.pending.replace(PendingApply { text, major }) {
            self.superseded += 1;
            trace!("superseded pending apply `{}`", previous.text);
        }
    }

    pub fn take(&mut self) -> Option<PendingApply> {
        self.pending.take()
    }

    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies dropped because a newer one replaced them.
    pub const fn superseded(&self) -> usize {
        self.superseded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_apply_supersedes() {
        let mut throttler = ApplyThrottler::default();
        throttler.schedule("color: r".to_owned(), false);
        throttler.schedule("color: re".to_owned(), false);
        assert_eq!(throttler.superseded(), 1);
        assert_eq!(
            throttler.take(),
            Some(PendingApply {
                text: "color: re".to_owned(),
                major: false
            })
        );
        assert!(!throttler.has_pending());
    }
}
