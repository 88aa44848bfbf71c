use crate::error::PaillierError;
use crypto_bigint::{Concat, NonZero, Uint};

/// Returns Euler's totient of given primes which is `(p-1)*(q-1)`. With `g = 1+n` this is the
/// decryption exponent `lambda`.
pub fn euler_totient<const PRIME_LIMBS: usize, const OUTPUT_LIMBS: usize>(
    p: &Uint<PRIME_LIMBS>,
    q: &Uint<PRIME_LIMBS>,
) -> Uint<OUTPUT_LIMBS>
where
    Uint<PRIME_LIMBS>: Concat<Output = Uint<OUTPUT_LIMBS>>,
{
    p.wrapping_sub(&Uint::<PRIME_LIMBS>::ONE)
        .widening_mul(&q.wrapping_sub(&Uint::<PRIME_LIMBS>::ONE))
}

/// Return `(u-1)/n`. This is the logarithm function for `(1+n)^m mod n^2` and returns the logarithm
/// `m` as `(1+n)^m mod n^2 = 1 + m*n` and `l(1 + m*n) = m`.
///
/// `u` must be less than `n^2`. The division has to be exact, a non-zero remainder (or `u = 0`) means `u`
/// wasn't of the form `1 + m*n` and is reported as [`PaillierError::InvalidCiphertext`].
pub fn l<const U: usize, const N: usize>(
    u: &Uint<U>,
    n: &NonZero<Uint<N>>,
) -> Result<Uint<N>, PaillierError> {
    if *u == Uint::ZERO {
        return Err(PaillierError::InvalidCiphertext);
    }
    // u-1
    let m = u.wrapping_sub(&Uint::ONE);
    // unwrap is fine since widening a non-zero value keeps it non-zero
    let n_wide = n.resize::<U>().to_nz().unwrap();
    let (m, r) = m.div_rem(&n_wide);
    if r != Uint::ZERO {
        return Err(PaillierError::InvalidCiphertext);
    }
    // u < n^2 so the quotient is less than n
    debug_assert!(m.bits() <= Uint::<N>::BITS);
    Ok(m.resize::<N>())
}

#[cfg(feature = "parallel")]
#[macro_export]
macro_rules! join {
    ($a: expr, $b: expr) => {
        rayon::join(|| $a, || $b)
    };
}

#[cfg(not(feature = "parallel"))]
#[macro_export]
macro_rules! join {
    ($a: expr, $b: expr) => {
        ($a, $b)
    };
}

#[cfg(test)]
pub fn get_1024_bit_primes() -> (
    crypto_bigint::Odd<crypto_bigint::U1024>,
    crypto_bigint::Odd<crypto_bigint::U1024>,
) {
    let p = crypto_bigint::U1024::from_str_radix_vartime("148677972634832330983979593310074301486537017973460461278300587514468301043894574906886127642530475786889672304776052879927627556769456140664043088700743909632312483413393134504352834240399191134336344285483935856491230340093391784574980688823380828143810804684752914935441384845195613674104960646037368551517", 10).unwrap();
    let q = crypto_bigint::U1024::from_str_radix_vartime("158741574437007245654463598139927898730476924736461654463975966787719309357536545869203069369466212089132653564188443272208127277664424448947476335413293018778018615899291704693105620242763173357203898195318179150836424196645745308205164116144020613415407736216097185962171301808761138424668335445923774195463", 10).unwrap();
    (p.to_odd().unwrap(), q.to_odd().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_bigint::{U128, U64};

    #[test]
    fn totient_of_small_primes() {
        let lambda: U128 = euler_totient(&U64::from_u64(7), &U64::from_u64(11));
        assert_eq!(lambda, U128::from_u64(60));

        let lambda: U128 = euler_totient(&U64::from_u64(3), &U64::from_u64(5));
        assert_eq!(lambda, U128::from_u64(8));
    }

    #[test]
    fn l_function() {
        let n = U64::from_u64(77).to_nz().unwrap();

        // 1 + 42*77
        let m: U64 = l(&U128::from_u64(3235), &n).unwrap();
        assert_eq!(m, U64::from_u64(42));

        // l(1) = 0
        let m: U64 = l(&U128::ONE, &n).unwrap();
        assert_eq!(m, U64::ZERO);

        // Largest input, (n^2 - n + 1 - 1)/n = n - 1
        let m: U64 = l(&U128::from_u64(77 * 77 - 77 + 1), &n).unwrap();
        assert_eq!(m, U64::from_u64(76));
    }

    #[test]
    fn l_function_rejects_inexact_division() {
        let n = U64::from_u64(77).to_nz().unwrap();

        assert_eq!(
            l::<{ U128::LIMBS }, { U64::LIMBS }>(&U128::ZERO, &n),
            Err(PaillierError::InvalidCiphertext)
        );
        assert_eq!(
            l::<{ U128::LIMBS }, { U64::LIMBS }>(&U128::from_u64(980), &n),
            Err(PaillierError::InvalidCiphertext)
        );
        assert_eq!(
            l::<{ U128::LIMBS }, { U64::LIMBS }>(&U128::from_u64(2), &n),
            Err(PaillierError::InvalidCiphertext)
        );
    }
}
