use thiserror::Error;

/// Why a pair of primes could not be turned into a key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyMaterialFault {
    /// `p = q`, so `n` is a perfect square
    #[error("p and q are equal")]
    IdenticalPrimes,
    /// `lambda = (p-1)(q-1)` has no inverse mod `n`. Can't happen for distinct primes of equal size.
    #[error("lambda is not invertible mod n")]
    NonInvertibleLambda,
}

/// Errors returned by key derivation, encryption and decryption
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaillierError {
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(KeyMaterialFault),
    #[error("plaintext must be in [0, n)")]
    PlaintextOutOfRange,
    #[error("ciphertext must be in [0, n^2)")]
    CiphertextOutOfRange,
    /// The sampler gave up, the generator is most likely broken
    #[error("no mask coprime to n found after {attempts} attempts")]
    RandomnessExhausted { attempts: u32 },
    /// A [`RandomnessSource`](crate::RandomnessSource) returned `r` outside `Z*_n`
    #[error("mask must be in [1, n) and coprime to n")]
    InvalidMask,
    /// `c^lambda mod n^2` isn't of the form `1 + k*n`
    #[error("ciphertext does not decrypt under this key")]
    InvalidCiphertext,
}
