use std::time::Duration;

use pxfx::Ccy;

/// Interval between readiness probes of the host dialog surface.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Probe budget before the dialog is declared unavailable (10 seconds).
pub const READY_POLL_ATTEMPTS: u32 = 100;

// -----------------------------------------------------------------------------
// PromptError
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("currency dialog did not become available within {waited:?}")]
    DialogUnavailable { waited: Duration },
}

// -----------------------------------------------------------------------------
// CurrencyPrompt
// -----------------------------------------------------------------------------
/// The one-time target-currency selection dialog.
///
/// The host surface may not exist yet when startup runs, hence the
/// separate readiness probe; [`wait_until_ready`] bounds the wait instead
/// of polling forever.
pub trait CurrencyPrompt {
    /// Whether the host dialog surface can be shown right now.
    fn is_ready(&self) -> bool;

    /// Ask the user to pick a target currency from `codes`.
    ///
    /// Returns [None] when the user cancels.
    ///
    /// # Errors
    /// - The host dialog fails while being shown.
    fn choose(&mut self, codes: &[Ccy]) -> anyhow::Result<Option<Ccy>>;
}

/// Poll `prompt` until it reports ready, up to `attempts` probes spaced
/// `interval` apart.
///
/// # Errors
/// - [`PromptError::DialogUnavailable`]: the probe budget ran out.
pub fn wait_until_ready<P: CurrencyPrompt>(
    prompt: &P,
    attempts: u32,
    interval: Duration,
) -> Result<(), PromptError> {
    for attempt in 0..attempts {
        if prompt.is_ready() {
            return Ok(());
        }
        if attempt + 1 < attempts {
            std::thread::sleep(interval);
        }
    }
    Err(PromptError::DialogUnavailable {
        waited: interval * attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct ReadyAfter {
        probes_left: Cell<u32>,
    }

    impl CurrencyPrompt for ReadyAfter {
        fn is_ready(&self) -> bool {
            if self.probes_left.get() == 0 {
                return true;
            }
            self.probes_left.set(self.probes_left.get() - 1);
            false
        }

        fn choose(&mut self, codes: &[Ccy]) -> anyhow::Result<Option<Ccy>> {
            Ok(codes.first().copied())
        }
    }

    #[test]
    fn test_ready_immediately() {
        let prompt = ReadyAfter {
            probes_left: Cell::new(0),
        };

        let res = wait_until_ready(&prompt, 3, Duration::ZERO);

        assert_eq!(res, Ok(()));
    }

    #[test]
    fn test_ready_mid_poll() {
        let prompt = ReadyAfter {
            probes_left: Cell::new(2),
        };

        let res = wait_until_ready(&prompt, 5, Duration::ZERO);

        assert_eq!(res, Ok(()));
    }

    #[test]
    fn test_budget_exhausted() {
        let prompt = ReadyAfter {
            probes_left: Cell::new(u32::MAX),
        };

        let res = wait_until_ready(&prompt, 4, Duration::from_millis(1));

        assert_eq!(
            res,
            Err(PromptError::DialogUnavailable {
                waited: Duration::from_millis(4),
            })
        );
    }
}
