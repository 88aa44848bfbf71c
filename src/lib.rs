//! Paillier encryption as described in Scheme 1 of [Public-Key Cryptosystems Based on Composite Degree Residuosity Classes](https://link.springer.com/content/pdf/10.1007/3-540-48910-X_16.pdf)
//! with the generator `g = n+1`.
//!
//! Keys are derived from two caller supplied primes (no prime generation happens here). Encryption
//! draws a fresh mask `r` in `Z*_n` from a [`RandomnessSource`] on every call and never returns it.
//! Ciphertexts support the additive homomorphism: multiplying two ciphertexts mod `n^2` gives an
//! encryption of the sum of their messages.
//!
//! All values are fixed width `crypto_bigint::Uint`s. `PRIME_LIMBS`, `MODULUS_LIMBS` and
//! `MODULUS_SQR_LIMBS` are the limbs needed for a prime, the modulus `n` and `n^2`, so a 3072-bit
//! modulus on a 64-bit platform uses 24, 48 and 96 limbs.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod error;
pub mod paillier;
pub mod randomness;
pub mod util;

pub use error::{KeyMaterialFault, PaillierError};
pub use paillier::{generate_keys, Ciphertext, PrivateKey, PublicKey};
#[cfg(feature = "std")]
pub use randomness::SharedRandomness;
pub use randomness::{CoprimeSampler, RandomnessSource, DEFAULT_MAX_ATTEMPTS};
