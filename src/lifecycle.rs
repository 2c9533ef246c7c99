//! Subsystem lifecycle: Uninitialized → Initialized | Failed.
//!
//! `Failed` is terminal. Once native init has failed the reason is kept and handed
//! back on every later attempt; the native call is never repeated.

use crate::error::{HidError, Result};

#[derive(Debug, Default)]
pub(crate) enum Lifecycle<T> {
    #[default]
    Uninitialized,
    Initialized(T),
    Failed(String),
}

impl<T> Lifecycle<T> {
    /// Return the live context, running `init` only from `Uninitialized`.
    pub(crate) fn get_or_init(&mut self, init: impl FnOnce() -> Result<T>) -> Result<&mut T> {
        if let Self::Failed(reason) = self {
            return Err(HidError::Init(reason.clone()));
        }
        if let Self::Uninitialized = self {
            match init() {
                Ok(ctx) => *self = Self::Initialized(ctx),
                Err(err) => {
                    let reason = match err {
                        HidError::Init(reason) => reason,
                        other => other.to_string(),
                    };
                    *self = Self::Failed(reason.clone());
                    return Err(HidError::Init(reason));
                }
            }
        }
        match self {
            Self::Initialized(ctx) => Ok(ctx),
            Self::Failed(reason) => Err(HidError::Init(reason.clone())),
            Self::Uninitialized => Err(HidError::Init("not initialized".into())),
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> Option<&T> {
        match self {
            Self::Initialized(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Hand back the live context (for the caller to drop) and return to
    /// `Uninitialized`. `Failed` stays `Failed`.
    pub(crate) fn release(&mut self) -> Option<T> {
        match std::mem::take(self) {
            Self::Initialized(ctx) => Some(ctx),
            Self::Failed(reason) => {
                *self = Self::Failed(reason);
                None
            }
            Self::Uninitialized => None,
        }
    }

    pub(crate) fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized(_))
    }

    pub(crate) fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn init_runs_once_on_success() {
        let calls = Cell::new(0);
        let mut lc: Lifecycle<u32> = Lifecycle::default();
        for _ in 0..3 {
            let v = lc
                .get_or_init(|| {
                    calls.set(calls.get() + 1);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*v, 7);
        }
        assert_eq!(calls.get(), 1);
        assert!(lc.is_initialized());
    }

    #[test]
    fn failure_is_sticky() {
        let calls = Cell::new(0);
        let mut lc: Lifecycle<u32> = Lifecycle::default();
        for _ in 0..3 {
            let err = lc
                .get_or_init(|| {
                    calls.set(calls.get() + 1);
                    Err(HidError::Init("no backend".into()))
                })
                .unwrap_err();
            assert_eq!(err, HidError::Init("no backend".into()));
        }
        assert_eq!(calls.get(), 1);
        assert!(lc.is_failed());
    }

    #[test]
    fn non_init_errors_are_recorded_as_init_failures() {
        let mut lc: Lifecycle<u32> = Lifecycle::default();
        let err = lc
            .get_or_init(|| Err(HidError::Native("boom".into())))
            .unwrap_err();
        assert_eq!(err, HidError::Init("native HID error: boom".into()));
    }

    #[test]
    fn release_is_idempotent_and_allows_reinit() {
        let mut lc: Lifecycle<u32> = Lifecycle::default();
        assert!(lc.release().is_none());
        lc.get_or_init(|| Ok(1)).unwrap();
        assert_eq!(lc.release(), Some(1));
        assert!(lc.release().is_none());
        assert!(lc.get().is_none());
        assert_eq!(*lc.get_or_init(|| Ok(2)).unwrap(), 2);
    }

    #[test]
    fn release_keeps_failed_state() {
        let mut lc: Lifecycle<u32> = Lifecycle::default();
        let _ = lc.get_or_init(|| Err(HidError::Init("x".into())));
        assert!(lc.release().is_none());
        assert!(lc.is_failed());
        assert!(lc.get_or_init(|| Ok(3)).is_err());
    }
}
