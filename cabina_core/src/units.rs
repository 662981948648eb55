//! # Unit Types
//!
//! Type-safe wrappers for the electrical units used across the engine.
//! They stay lightweight (plain f64 newtypes) and serialize as bare numbers.
//!
//! ## SI Units
//!
//! - Current: amperes (A), kiloamperes (kA)
//! - Voltage: volts (V), kilovolts (kV)
//! - Apparent power: kilovolt-amperes (kVA)
//! - Time: seconds (s), milliseconds (ms)
//! - Impedance: ohms (Ω)
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::units::{Amperes, KiloAmperes, Seconds, Milliseconds};
//!
//! let fault: KiloAmperes = Amperes(25_000.0).into();
//! assert_eq!(fault.0, 25.0);
//!
//! let delay: Milliseconds = Seconds(0.3).into();
//! assert!((delay.0 - 300.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Current
// ============================================================================

/// Current in amperes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amperes(pub f64);

/// Current in kiloamperes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloAmperes(pub f64);

impl From<Amperes> for KiloAmperes {
    fn from(a: Amperes) -> Self {
        KiloAmperes(a.0 / 1000.0)
    }
}

impl From<KiloAmperes> for Amperes {
    fn from(ka: KiloAmperes) -> Self {
        Amperes(ka.0 * 1000.0)
    }
}

// ============================================================================
// Voltage
// ============================================================================

/// Voltage in volts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volts(pub f64);

/// Voltage in kilovolts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloVolts(pub f64);

impl From<Volts> for KiloVolts {
    fn from(v: Volts) -> Self {
        KiloVolts(v.0 / 1000.0)
    }
}

impl From<KiloVolts> for Volts {
    fn from(kv: KiloVolts) -> Self {
        Volts(kv.0 * 1000.0)
    }
}

// ============================================================================
// Power
// ============================================================================

/// Apparent power in kilovolt-amperes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloVoltAmperes(pub f64);

impl KiloVoltAmperes {
    /// Three-phase line current drawn at the given line-to-line voltage.
    ///
    /// I = S / (√3 · V)
    pub fn line_current(self, voltage: Volts) -> Amperes {
        Amperes(self.0 * 1000.0 / (3f64.sqrt() * voltage.0))
    }
}

// ============================================================================
// Time
// ============================================================================

/// Time in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(pub f64);

/// Time in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milliseconds(pub f64);

impl From<Seconds> for Milliseconds {
    fn from(s: Seconds) -> Self {
        Milliseconds(s.0 * 1000.0)
    }
}

impl From<Milliseconds> for Seconds {
    fn from(ms: Milliseconds) -> Self {
        Seconds(ms.0 / 1000.0)
    }
}

// ============================================================================
// Impedance
// ============================================================================

/// Resistance, reactance or impedance magnitude in ohms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ohms(pub f64);

impl Ohms {
    /// Magnitude of R + jX
    pub fn magnitude(r: Ohms, x: Ohms) -> Ohms {
        Ohms(r.0.hypot(x.0))
    }

    /// Refer an impedance across a transformer with turns ratio `ratio`
    /// (high side / low side). Going from the low to the high side multiplies
    /// by ratio², the reverse divides.
    pub fn referred(self, ratio: f64) -> Ohms {
        Ohms(self.0 * ratio * ratio)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Amperes);
impl_arithmetic!(KiloAmperes);
impl_arithmetic!(Volts);
impl_arithmetic!(KiloVolts);
impl_arithmetic!(KiloVoltAmperes);
impl_arithmetic!(Seconds);
impl_arithmetic!(Milliseconds);
impl_arithmetic!(Ohms);
