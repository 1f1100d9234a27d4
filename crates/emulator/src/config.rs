//! Emulator tuning knobs.

use std::time::Duration;

/// Probability of a device-reported failure per command family.
///
/// Each rate is clamped to `0.0..=1.0` when used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRates {
    pub shift: f64,
    pub payment: f64,
    pub check: f64,
}

impl ErrorRates {
    /// Rates of a well-behaved but imperfect device.
    pub const REALISTIC: Self = Self {
        shift: 0.10,
        payment: 0.15,
        check: 0.05,
    };

    /// Every command succeeds.
    pub const NONE: Self = Self {
        shift: 0.0,
        payment: 0.0,
        check: 0.0,
    };
}

impl Default for ErrorRates {
    fn default() -> Self {
        Self::REALISTIC
    }
}

/// Deferred results kept by default before the oldest is dropped.
pub const DEFAULT_MAX_PENDING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct EmulatorConfig {
    /// Fixed RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Simulated round-trip time, sampled uniformly from `min..=max`.
    pub latency: (Duration, Duration),
    /// Number of `GetRezult` queries before a mutating command completes.
    /// Zero answers synchronously.
    pub async_steps: u32,
    /// Upper bound on results waiting for `GetRezult`. When full, the oldest
    /// pending command is forgotten and later queries for it get `NotFound`.
    pub max_pending: usize,
    pub error_rates: ErrorRates,
}

impl EmulatorConfig {
    /// Deterministic, instant and error-free. Intended for tests.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            latency: (Duration::ZERO, Duration::ZERO),
            async_steps: 0,
            max_pending: DEFAULT_MAX_PENDING,
            error_rates: ErrorRates::NONE,
        }
    }

    pub fn with_async_steps(mut self, steps: u32) -> Self {
        self.async_steps = steps;
        self
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn with_error_rates(mut self, rates: ErrorRates) -> Self {
        self.error_rates = rates;
        self
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.latency = (min, max);
        self
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            latency: (Duration::from_millis(500), Duration::from_millis(1_500)),
            async_steps: 0,
            max_pending: DEFAULT_MAX_PENDING,
            error_rates: ErrorRates::REALISTIC,
        }
    }
}
