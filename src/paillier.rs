//! Paillier key derivation, encryption and decryption with `g = 1+n`.
//!
//! Keys come from [`generate_keys`] which takes the primes `p` and `q` from the caller. The public key
//! carries `n`, `g = n+1` and `n^2` and the private key `lambda = (p-1)*(q-1)` and `mu = lambda^-1 mod n`,
//! each with Montgomery parameters precomputed for the moduli they work with.
//!
//! Encryption is `c = g^m * r^n mod n^2` with a fresh `r` from a [`RandomnessSource`] and decryption is
//! `m = L(c^lambda mod n^2) * mu mod n` where `L(x) = (x-1)/n`.

use crate::{
    error::{KeyMaterialFault, PaillierError},
    join,
    randomness::RandomnessSource,
    util::{euler_totient, l},
};
use core::fmt;
use crypto_bigint::{
    modular::{MontyForm, MontyParams, SafeGcdInverter},
    subtle::ConstantTimeLess,
    Concat, Odd, PrecomputeInverter, Uint,
};
use log::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key used to encrypt messages and to combine ciphertexts. `MODULUS_LIMBS` are the limbs required to
/// represent the modulus `n` and `MODULUS_SQR_LIMBS` to represent square of the modulus `n^2`
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize> {
    /// Modulus `n`: product of prime numbers `p` and `q`
    pub n: Odd<Uint<MODULUS_LIMBS>>,
    /// Generator `g = n+1`
    pub g: Uint<MODULUS_SQR_LIMBS>,
    /// Modulus squared, i.e. `n^2`
    pub n_sqr: Odd<Uint<MODULUS_SQR_LIMBS>>,
    /// Montgomery params for reducing mod `n^2`
    pub n_sqr_mtg_params: MontyParams<MODULUS_SQR_LIMBS>,
    /// `n mod n^2` in Montgomery form
    pub n_mtg: MontyForm<MODULUS_SQR_LIMBS>,
}

/// Key used to decrypt. `lambda` and `mu` are wiped on drop.
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize> {
    /// `lambda = (p-1)*(q-1)`
    lambda: Uint<MODULUS_LIMBS>,
    /// `mu = lambda^-1 mod n`
    mu: Uint<MODULUS_LIMBS>,
    #[zeroize(skip)]
    n: Odd<Uint<MODULUS_LIMBS>>,
    #[zeroize(skip)]
    n_sqr: Odd<Uint<MODULUS_SQR_LIMBS>>,
    /// Montgomery params for reducing mod `n`
    #[zeroize(skip)]
    n_mtg_params: MontyParams<MODULUS_LIMBS>,
    /// Montgomery params for reducing mod `n^2`
    #[zeroize(skip)]
    n_sqr_mtg_params: MontyParams<MODULUS_SQR_LIMBS>,
}

/// Encryption of a message in `[0, n)`, a value in `[0, n^2)`
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize>(
    Uint<MODULUS_SQR_LIMBS>,
);

/// Derive a key pair from the primes `p` and `q`. The primes aren't tested for primality.
///
/// Fails with [`KeyMaterialFault::IdenticalPrimes`] when `p = q` and with
/// [`KeyMaterialFault::NonInvertibleLambda`] when `gcd((p-1)*(q-1), p*q) != 1`, which can only happen
/// when the inputs aren't distinct primes of similar size.
pub fn generate_keys<
    const PRIME_LIMBS: usize,
    const MODULUS_LIMBS: usize,
    const MODULUS_SQR_LIMBS: usize,
    const MODULUS_UNSAT_LIMBS: usize,
>(
    p: &Odd<Uint<PRIME_LIMBS>>,
    q: &Odd<Uint<PRIME_LIMBS>>,
) -> Result<
    (
        PublicKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>,
        PrivateKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>,
    ),
    PaillierError,
>
where
    Uint<PRIME_LIMBS>: Concat<Output = Uint<MODULUS_LIMBS>>,
    Uint<MODULUS_LIMBS>: Concat<Output = Uint<MODULUS_SQR_LIMBS>>,
    Odd<Uint<MODULUS_LIMBS>>:
        PrecomputeInverter<Inverter = SafeGcdInverter<MODULUS_LIMBS, MODULUS_UNSAT_LIMBS>>,
{
    if p == q {
        warn!("refusing to derive a key from identical primes");
        return Err(PaillierError::InvalidKeyMaterial(
            KeyMaterialFault::IdenticalPrimes,
        ));
    }

    let n: Uint<MODULUS_LIMBS> = p.widening_mul(q);
    // unwrap is fine since n is a product of 2 odd numbers
    let n = n.to_odd().unwrap();

    let mut lambda: Uint<MODULUS_LIMBS> = euler_totient(p.as_ref(), q.as_ref());
    if lambda.gcd(n.as_ref()) != Uint::ONE {
        lambda.zeroize();
        log::error!(
            "lambda has no inverse modulo a {} bit modulus, the inputs aren't distinct primes",
            n.bits()
        );
        return Err(PaillierError::InvalidKeyMaterial(
            KeyMaterialFault::NonInvertibleLambda,
        ));
    }
    // unwrap is fine since gcd(lambda, n) = 1
    let mu = lambda.inv_odd_mod(&n).unwrap();

    let pk = PublicKey::from_modulus(n);
    let sk = PrivateKey {
        lambda,
        mu,
        n,
        n_sqr: pk.n_sqr,
        n_mtg_params: MontyParams::new_vartime(n),
        n_sqr_mtg_params: pk.n_sqr_mtg_params,
    };
    debug!("derived Paillier key pair with a {} bit modulus", n.bits());
    Ok((pk, sk))
}

impl<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize>
    PublicKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>
where
    Uint<MODULUS_LIMBS>: Concat<Output = Uint<MODULUS_SQR_LIMBS>>,
{
    const CHECK_MOD_SQR_LIMBS: () = assert!((2 * MODULUS_LIMBS) == MODULUS_SQR_LIMBS);

    /// Public key for the modulus `n = p*q`
    pub fn from_modulus(n: Odd<Uint<MODULUS_LIMBS>>) -> Self {
        let _ = Self::CHECK_MOD_SQR_LIMBS;

        let n_sqr: Uint<MODULUS_SQR_LIMBS> = n.square();
        // unwrap is fine since the square of an odd number is odd
        let n_sqr = n_sqr.to_odd().unwrap();
        let n_sqr_mtg_params = MontyParams::new_vartime(n_sqr);
        let n_wide = n.resize::<MODULUS_SQR_LIMBS>();
        Self {
            n,
            g: n_wide.wrapping_add(&Uint::ONE),
            n_sqr,
            n_sqr_mtg_params,
            n_mtg: MontyForm::new(&n_wide, n_sqr_mtg_params),
        }
    }

    /// Returns true if `n^2` and `g` match `n`
    pub fn is_valid(&self) -> bool {
        let n_sqr: Uint<MODULUS_SQR_LIMBS> = self.n.square();
        *self.n_sqr.as_ref() == n_sqr
            && self.g == self.n.resize::<MODULUS_SQR_LIMBS>().wrapping_add(&Uint::ONE)
    }
}

impl<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize>
    PublicKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>
{
    /// Encrypt the given message with a mask drawn from `source`. The mask is wiped once the ciphertext
    /// is computed. Fails with [`PaillierError::PlaintextOutOfRange`] unless `msg < n`, with
    /// [`PaillierError::InvalidMask`] if the mask isn't in `Z*_n` and passes on errors of `source`.
    pub fn encrypt<R, const MODULUS_UNSAT_LIMBS: usize>(
        &self,
        msg: &Uint<MODULUS_LIMBS>,
        source: &mut R,
    ) -> Result<Ciphertext<MODULUS_LIMBS, MODULUS_SQR_LIMBS>, PaillierError>
    where
        R: RandomnessSource<MODULUS_LIMBS> + ?Sized,
        Odd<Uint<MODULUS_LIMBS>>:
            PrecomputeInverter<Inverter = SafeGcdInverter<MODULUS_LIMBS, MODULUS_UNSAT_LIMBS>>,
    {
        if !bool::from(msg.ct_lt(self.n.as_ref())) {
            warn!("refusing to encrypt a plaintext outside [0, n)");
            return Err(PaillierError::PlaintextOutOfRange);
        }
        let mut r = source.sample_coprime(&self.n)?;
        // A mask of 0, one >= n or one sharing a factor with n gives a ciphertext that can't be decrypted
        if r == Uint::ZERO
            || !bool::from(r.ct_lt(self.n.as_ref()))
            || r.gcd(self.n.as_ref()) != Uint::ONE
        {
            r.zeroize();
            warn!("randomness source returned a mask outside Z*_n");
            return Err(PaillierError::InvalidMask);
        }
        let ct = self.encrypt_with_mask(msg, &r);
        r.zeroize();
        Ok(ct)
    }

    fn encrypt_with_mask(
        &self,
        msg: &Uint<MODULUS_LIMBS>,
        r: &Uint<MODULUS_LIMBS>,
    ) -> Ciphertext<MODULUS_LIMBS, MODULUS_SQR_LIMBS> {
        // g = 1 + n
        // g^m = (1 + n)^m mod n^2 = 1 + n*m mod n^2 from binomial expansion
        // g_m = 1 + n*m mod n^2
        let (g_m, r_n) = join!(
            {
                let n_m = self.n_mtg * MontyForm::new(&msg.resize(), self.n_sqr_mtg_params);
                n_m + MontyForm::one(self.n_sqr_mtg_params)
            },
            {
                let r = r.resize::<MODULUS_SQR_LIMBS>();
                MontyForm::new(&r, self.n_sqr_mtg_params).pow(self.n.as_ref())
            }
        );
        Ciphertext((g_m * r_n).retrieve())
    }
}

impl<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize>
    PrivateKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>
{
    /// Decrypt the ciphertext and return the message.
    ///
    /// Fails with [`PaillierError::CiphertextOutOfRange`] unless the ciphertext is in `[0, n^2)` and with
    /// [`PaillierError::InvalidCiphertext`] when `c^lambda mod n^2` isn't `1 mod n`, which happens when
    /// `c` shares a factor with `n`. A unit `c` always passes, so a ciphertext made under another key
    /// decrypts to an unrelated message rather than failing.
    pub fn decrypt(
        &self,
        ct: &Ciphertext<MODULUS_LIMBS, MODULUS_SQR_LIMBS>,
    ) -> Result<Uint<MODULUS_LIMBS>, PaillierError> {
        if !bool::from(ct.0.ct_lt(self.n_sqr.as_ref())) {
            warn!("refusing to decrypt a ciphertext outside [0, n^2)");
            return Err(PaillierError::CiphertextOutOfRange);
        }

        // c^lambda = (1+n)^{m*lambda} * r^{n*lambda} mod n^2. The order of Z*_{n^2} is n*lambda so
        // r^{n*lambda} = 1 mod n^2 and c^lambda = 1 + m*lambda*n mod n^2
        let x = MontyForm::new(&ct.0, self.n_sqr_mtg_params)
            .pow(&self.lambda)
            .retrieve();
        // L(x) = m*lambda mod n
        let m_lambda = l(&x, self.n.as_nz_ref()).inspect_err(|_| {
            warn!("ciphertext is not a unit modulo n");
        })?;
        let m = MontyForm::new(&m_lambda, self.n_mtg_params)
            * MontyForm::new(&self.mu, self.n_mtg_params);
        Ok(m.retrieve())
    }

    pub fn lambda(&self) -> &Uint<MODULUS_LIMBS> {
        &self.lambda
    }

    pub fn mu(&self) -> &Uint<MODULUS_LIMBS> {
        &self.mu
    }

    pub fn n(&self) -> &Odd<Uint<MODULUS_LIMBS>> {
        &self.n
    }
}

impl<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize> fmt::Debug
    for PrivateKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("n", &self.n)
            .finish_non_exhaustive()
    }
}

impl<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize>
    Ciphertext<MODULUS_LIMBS, MODULUS_SQR_LIMBS>
{
    /// Combine another ciphertext with this ciphertext such that the resulting ciphertext
    /// encrypts the sum of the 2 messages mod `n`
    pub fn add(
        &self,
        rhs: &Self,
        pk: &PublicKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>,
    ) -> Result<Self, PaillierError> {
        if !self.is_valid(pk) || !rhs.is_valid(pk) {
            return Err(PaillierError::CiphertextOutOfRange);
        }
        let l = MontyForm::new(&self.0, pk.n_sqr_mtg_params);
        let r = MontyForm::new(&rhs.0, pk.n_sqr_mtg_params);
        Ok(Self((l * r).retrieve()))
    }

    /// Return an updated ciphertext which encrypts the product of current encrypted message and
    /// the given message
    pub fn mul(
        &self,
        msg: &Uint<MODULUS_LIMBS>,
        pk: &PublicKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>,
    ) -> Result<Self, PaillierError> {
        if !bool::from(msg.ct_lt(pk.n.as_ref())) {
            return Err(PaillierError::PlaintextOutOfRange);
        }
        if !self.is_valid(pk) {
            return Err(PaillierError::CiphertextOutOfRange);
        }
        let l = MontyForm::new(&self.0, pk.n_sqr_mtg_params);
        Ok(Self(l.pow(msg).retrieve()))
    }

    /// Returns true if ciphertext is valid, i.e. in `[0, n^2)`
    pub fn is_valid(&self, pk: &PublicKey<MODULUS_LIMBS, MODULUS_SQR_LIMBS>) -> bool {
        self.0.lt(pk.n_sqr.as_ref())
    }

    pub fn as_uint(&self) -> &Uint<MODULUS_SQR_LIMBS> {
        &self.0
    }

    pub fn into_uint(self) -> Uint<MODULUS_SQR_LIMBS> {
        self.0
    }
}

/// Wraps a received value. Its range is checked when it's used.
impl<const MODULUS_LIMBS: usize, const MODULUS_SQR_LIMBS: usize> From<Uint<MODULUS_SQR_LIMBS>>
    for Ciphertext<MODULUS_LIMBS, MODULUS_SQR_LIMBS>
{
    fn from(value: Uint<MODULUS_SQR_LIMBS>) -> Self {
        Self(value)
    }
}
