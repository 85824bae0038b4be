use std::{error::Error, f64::consts::PI, fmt::Display};

pub use num_complex::Complex64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// The radix-2 transform only works on sequences whose length is a nonzero power of two.
    NotPowerOfTwo { len: usize },
}

impl Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::NotPowerOfTwo { len } => {
                write!(f, "Sequence length {len} is not a power of two")
            }
        }
    }
}

impl Error for TransformError {}

/// Smallest power of two that is at least `n`.
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

fn bit_reverse_permute(data: &mut [Complex64]) {
    let bits = data.len().trailing_zeros();
    if bits == 0 {
        return;
    }
    for i in 0..data.len() {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            data.swap(i, j);
        }
    }
}

fn transform(data: &mut [Complex64], sign: f64) -> Result<(), TransformError> {
    let n = data.len();
    if !n.is_power_of_two() {
        return Err(TransformError::NotPowerOfTwo { len: n });
    }

    bit_reverse_permute(data);

    let mut m = 2;
    while m <= n {
        let half = m / 2;
        // Twiddles are accumulated by repeated multiplication rather than computed per index.
        let wm = Complex64::from_polar(1.0, sign * 2.0 * PI / m as f64);
        for block in data.chunks_exact_mut(m) {
            let mut w = Complex64::new(1.0, 0.0);
            let (lo, hi) = block.split_at_mut(half);
            for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
                let t = w * *b;
                let u = *a;
                *a = u + t;
                *b = u - t;
                w *= wm;
            }
        }
        m <<= 1;
    }

    Ok(())
}

/// In-place forward DFT.
pub fn forward_transform(data: &mut [Complex64]) -> Result<(), TransformError> {
    transform(data, -1.0)
}

/// In-place inverse DFT, normalized by 1/N.
pub fn inverse_transform(data: &mut [Complex64]) -> Result<(), TransformError> {
    transform(data, 1.0)?;
    let scale = (data.len() as f64).recip();
    for value in data.iter_mut() {
        *value *= scale;
    }
    Ok(())
}

/// Move the zero-frequency bin to the center by swapping the two halves. Applying it twice is the identity for even
/// lengths, which is all the radix-2 transform produces.
pub fn spectrum_shift(data: &mut [Complex64]) {
    let half = data.len() / 2;
    data.rotate_left(half);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn signal(n: usize) -> Vec<Complex64> {
        (0..n)
            .map(|i| Complex64::new(((i * 37) % 255) as f64 - 100.0, 0.0))
            .collect()
    }

    fn round_trip(n: usize) {
        let original = signal(n);
        let mut data = original.clone();
        forward_transform(&mut data).unwrap();
        inverse_transform(&mut data).unwrap();
        for (a, b) in data.iter().zip(original.iter()) {
            assert_relative_eq!(a.re, b.re, max_relative = 1e-9, epsilon = 1e-9);
            assert!(a.im.abs() < 1e-9);
        }
    }

    #[test]
    fn round_trip_4() {
        round_trip(4);
    }

    #[test]
    fn round_trip_16() {
        round_trip(16);
    }

    #[test]
    fn round_trip_256() {
        round_trip(256);
    }

    #[test]
    fn forward_matches_naive_dft() {
        let original = signal(16);
        let mut data = original.clone();
        forward_transform(&mut data).unwrap();
        for (k, out) in data.iter().enumerate() {
            let expected: Complex64 = original
                .iter()
                .enumerate()
                .map(|(n, x)| x * Complex64::from_polar(1.0, -2.0 * PI * (k * n) as f64 / 16.0))
                .sum();
            assert_relative_eq!(out.re, expected.re, epsilon = 1e-8);
            assert_relative_eq!(out.im, expected.im, epsilon = 1e-8);
        }
    }

    #[test]
    fn dc_lands_in_bin_zero() {
        let mut data = vec![Complex64::new(3.0, 0.0); 8];
        forward_transform(&mut data).unwrap();
        assert_relative_eq!(data[0].re, 24.0, epsilon = 1e-12);
        for bin in &data[1..] {
            assert!(bin.norm() < 1e-9);
        }
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut data = vec![Complex64::new(0.0, 0.0); 12];
        assert_eq!(
            forward_transform(&mut data),
            Err(TransformError::NotPowerOfTwo { len: 12 })
        );
        let mut empty: Vec<Complex64> = Vec::new();
        assert_eq!(
            inverse_transform(&mut empty),
            Err(TransformError::NotPowerOfTwo { len: 0 })
        );
    }

    #[test]
    fn spectrum_shift_is_involution() {
        let original = signal(16);
        let mut data = original.clone();
        spectrum_shift(&mut data);
        assert_eq!(data[0], original[8]);
        spectrum_shift(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn next_pow2_rounds_up() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(17), 32);
        assert_eq!(next_pow2(64), 64);
    }
}
