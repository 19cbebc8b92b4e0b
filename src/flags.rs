//! Driver-level behavior flags (§6.4), a plain bit mask in the original's
//! own style: `flg & FLAG` gates a behavior, set once at startup from CLI
//! switches.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(pub u32);

impl Flags {
    /// Skip the WG cache entirely; every `wg` call recomputes from scratch.
    /// Useful for isolating a correctness bug from a cache bug.
    pub const DISABLE_WG_CACHE: u32 = 0x01;

    /// Skip the L2 regularization term in both the objective value and its
    /// gradient.
    pub const DISABLE_REGULARIZATION: u32 = 0x02;

    /// Disable AdaGrad scaling inside optimizers that support it.
    pub const DISABLE_ADAGRAD: u32 = 0x04;

    /// Compute the regularized log-likelihood once and print diagnostics,
    /// skipping the optimization loop entirely.
    pub const ENABLE_LIKELIHOOD_ONLY: u32 = 0x08;

    /// Suppress the build-date banner normally printed at startup — set
    /// automatically in reproducible-build environments.
    pub const DISABLE_DATE_VERSION: u32 = 0x10;

    pub fn empty() -> Self {
        Flags(0)
    }

    pub fn has(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u32, enabled: bool) {
        if enabled {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_has_round_trip() {
        let mut flags = Flags::empty();
        assert!(!flags.has(Flags::DISABLE_WG_CACHE));
        flags.set(Flags::DISABLE_WG_CACHE, true);
        assert!(flags.has(Flags::DISABLE_WG_CACHE));
        assert!(!flags.has(Flags::ENABLE_LIKELIHOOD_ONLY));
    }
}
