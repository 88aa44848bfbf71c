//! Sampling of the encryption mask `r` from `Z*_n`.
//!
//! Encryption never samples on its own; it asks a [`RandomnessSource`] which the caller owns and
//! passes in. [`CoprimeSampler`] is the production source and wraps any cryptographically secure
//! generator, [`SharedRandomness`] lets several threads draw from one sampler.

use crate::error::PaillierError;
use crypto_bigint::{
    modular::SafeGcdInverter, subtle::ConstantTimeLess, Odd, PrecomputeInverter, Random, Uint,
};
use log::{trace, warn};
use rand_core::CryptoRngCore;

/// Number of candidates drawn before giving up. For a modulus with two large prime factors the
/// probability of a candidate being rejected is below 1/2, so reaching this means the generator is broken.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// Source of encryption masks.
pub trait RandomnessSource<const LIMBS: usize> {
    /// Returns `r` with `1 <= r < n` and `gcd(r, n) = 1`. Every call must return a fresh value.
    fn sample_coprime(&mut self, n: &Odd<Uint<LIMBS>>) -> Result<Uint<LIMBS>, PaillierError>;
}

/// Rejection sampler over a cryptographically secure generator.
///
/// Candidates have as many bits as the modulus passed to [`RandomnessSource::sample_coprime`], so the
/// same sampler serves keys of any size. Candidates that are 0, not less than `n` or share a factor
/// with `n` are discarded.
#[derive(Debug)]
pub struct CoprimeSampler<R> {
    rng: R,
    max_attempts: u32,
}

impl<R: CryptoRngCore> CoprimeSampler<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Bound the number of candidates drawn per sample
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[cfg(feature = "std")]
impl CoprimeSampler<rand_core::OsRng> {
    /// Sampler reading directly from the operating system's CSPRNG
    pub fn from_os_rng() -> Self {
        Self::new(rand_core::OsRng)
    }
}

impl<R, const LIMBS: usize, const UNSAT_LIMBS: usize> RandomnessSource<LIMBS> for CoprimeSampler<R>
where
    R: CryptoRngCore,
    Odd<Uint<LIMBS>>: PrecomputeInverter<Inverter = SafeGcdInverter<LIMBS, UNSAT_LIMBS>>,
{
    fn sample_coprime(&mut self, n: &Odd<Uint<LIMBS>>) -> Result<Uint<LIMBS>, PaillierError> {
        // Keep only the low `bits(n)` bits of a full width draw so that candidates are uniform in `[0, 2^k)`
        // with `2^{k-1} <= n < 2^k`
        let shift = Uint::<LIMBS>::BITS - n.bits();
        for attempt in 1..=self.max_attempts {
            let r = Uint::<LIMBS>::random(&mut self.rng) >> shift;
            if r == Uint::ZERO || !bool::from(r.ct_lt(n.as_ref())) {
                trace!("mask candidate {attempt} out of range");
                continue;
            }
            if r.gcd(n.as_ref()) != Uint::ONE {
                trace!("mask candidate {attempt} not coprime to the modulus");
                continue;
            }
            return Ok(r);
        }
        warn!(
            "no mask coprime to a {} bit modulus after {} attempts",
            n.bits(),
            self.max_attempts
        );
        Err(PaillierError::RandomnessExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// A [`CoprimeSampler`] behind a mutex so that one seeded generator can be used from many threads.
/// `&SharedRandomness` is itself a [`RandomnessSource`].
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct SharedRandomness<R> {
    inner: std::sync::Mutex<CoprimeSampler<R>>,
}

#[cfg(feature = "std")]
impl<R: CryptoRngCore> SharedRandomness<R> {
    pub fn new(sampler: CoprimeSampler<R>) -> Self {
        Self {
            inner: std::sync::Mutex::new(sampler),
        }
    }
}

#[cfg(feature = "std")]
impl SharedRandomness<rand_core::OsRng> {
    pub fn from_os_rng() -> Self {
        Self::new(CoprimeSampler::from_os_rng())
    }
}

#[cfg(feature = "std")]
impl<R, const LIMBS: usize> RandomnessSource<LIMBS> for &SharedRandomness<R>
where
    CoprimeSampler<R>: RandomnessSource<LIMBS>,
{
    fn sample_coprime(&mut self, n: &Odd<Uint<LIMBS>>) -> Result<Uint<LIMBS>, PaillierError> {
        // A panic while holding the lock can't leave a half written draw behind, so poisoning is ignored
        let mut sampler = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sampler.sample_coprime(n)
    }
}
