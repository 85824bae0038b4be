use crate::{
    fft::{
        Complex64, TransformError, forward_transform, inverse_transform, next_pow2, spectrum_shift,
    },
    ntsc::FieldContext,
    random::XorWowRandom,
    settings::{NtscConfig, RingingAlgorithm},
};

/// Frequency response of the ringing filter, from the lowest negative frequency through DC (index 32) to the highest
/// positive frequency. The shoulders on either side of the passband are what produce the overshoot.
pub const RING_PATTERN: [f64; 64] = [
    0.001679, 0.002163, 0.002810, 0.003682, 0.004870, 0.006504, 0.008776, 0.011972,
    0.016519, 0.023064, 0.032593, 0.046604, 0.067356, 0.098179, 0.143796, 0.211193,
    0.313643, 0.473215, 0.683793, 0.858451, 0.926882, 0.940660, 0.958258, 0.978409,
    0.991088, 0.996895, 0.999092, 0.999789, 0.999965, 0.999996, 1.000000, 1.000000,
    1.000000, 1.000000, 1.000000, 0.999996, 0.999965, 0.999789, 0.999092, 0.996895,
    0.991088, 0.978409, 0.958258, 0.940660, 0.926882, 0.858451, 0.683793, 0.473215,
    0.313643, 0.211193, 0.143796, 0.098179, 0.067356, 0.046604, 0.032593, 0.023064,
    0.016519, 0.011972, 0.008776, 0.006504, 0.004870, 0.003682, 0.002810, 0.002163,
];

/// Random perturbation of the high-frequency part of the spectral mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyNoise {
    /// Fraction of the spectrum, from the center outwards, left unperturbed is `1 - size`.
    pub size: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ringing {
    /// Overshoot from a first-difference kernel. `gain` of 1 is a no-op.
    Spatial { gain: f64 },
    /// Shape each row's spectrum with [`RING_PATTERN`].
    Spectral {
        power: i32,
        shift: i32,
        frequency_noise: Option<FrequencyNoise>,
    },
}

impl Ringing {
    pub fn from_config(config: &NtscConfig) -> Self {
        match config.ringing_algorithm {
            RingingAlgorithm::Spatial => Ringing::Spatial { gain: config.ringing },
            RingingAlgorithm::Spectral => Ringing::Spectral {
                power: config.ringing_power,
                shift: config.ringing_shift,
                frequency_noise: (config.freq_noise_size > 0.0).then_some(FrequencyNoise {
                    size: config.freq_noise_size,
                    amplitude: config.freq_noise_amplitude,
                }),
            },
        }
    }
}

/// Build the spectral mask for a spectrum of length `len`. The pattern is stretched over `len * (1 + shift)` bins and
/// the centered `len` of them are kept, so larger shifts narrow the ringing.
pub fn spectral_mask(len: usize, power: i32, shift: i32) -> Vec<f64> {
    let scale_cols = ((len as f64 * (1.0 + shift as f64)) as i64).max(1);
    let start = scale_cols / 2 - len as i64 / 2;

    (0..len as i64)
        .map(|i| {
            let col = start + i;
            if col < 0 || col >= scale_cols {
                return 0.0;
            }
            let index = ((col as f64 / scale_cols as f64 * RING_PATTERN.len() as f64) as usize)
                .min(RING_PATTERN.len() - 1);
            let value = RING_PATTERN[index];
            let mut powered = value;
            for _ in 1..power {
                powered *= value;
            }
            powered
        })
        .collect()
}

fn ringing_spatial_row(row: &mut [i32], original: &mut [i32], gain: f64) {
    let width = row.len();
    let original = &mut original[..width];
    original.copy_from_slice(row);
    for x in 1..width.saturating_sub(1) {
        let diff = (original[x + 1] - original[x - 1]) as f64;
        row[x] += (diff * (gain - 1.0) * 0.1) as i32;
    }
}

struct SpectralRow<'a> {
    mask: &'a [f64],
    noisy_mask: &'a mut [f64],
    spectrum: &'a mut [Complex64],
    frequency_noise: Option<FrequencyNoise>,
}

impl SpectralRow<'_> {
    fn apply(&mut self, row: &mut [i32], rng: &mut XorWowRandom) -> Result<(), TransformError> {
        let Some(&last) = row.last() else {
            return Ok(());
        };

        for (dst, src) in self.spectrum.iter_mut().zip(row.iter().chain(std::iter::repeat(&last))) {
            *dst = Complex64::new(*src as f64, 0.0);
        }

        forward_transform(self.spectrum)?;
        spectrum_shift(self.spectrum);

        let mask = match self.frequency_noise {
            Some(noise) => {
                self.noisy_mask.copy_from_slice(self.mask);
                let center = (self.mask.len() / 2) as f64;
                let start = (center - (1.0 - noise.size) * center) as usize;
                let stop = (center + (1.0 - noise.size) * center) as usize;
                for (i, value) in self.noisy_mask.iter_mut().enumerate() {
                    if i < start || i >= stop {
                        *value += (rng.uniform01() - 0.5) * noise.amplitude;
                    }
                }
                &*self.noisy_mask
            }
            None => self.mask,
        };

        for (bin, m) in self.spectrum.iter_mut().zip(mask.iter()) {
            *bin *= *m;
        }

        spectrum_shift(self.spectrum);
        inverse_transform(self.spectrum)?;

        if self.frequency_noise.is_some() {
            let (min, max) = row
                .iter()
                .fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
            for (dst, src) in row.iter_mut().zip(self.spectrum.iter()) {
                *dst = (src.re as i32).clamp(min, max);
            }
        } else {
            for (dst, src) in row.iter_mut().zip(self.spectrum.iter()) {
                *dst = src.re as i32;
            }
        }

        Ok(())
    }
}

/// Apply ringing to the Y, I, and Q planes of the field, in that order.
pub(crate) fn ringing(ctx: &mut FieldContext) {
    let width = ctx.yiq.width;
    match Ringing::from_config(ctx.config) {
        Ringing::Spatial { gain } => {
            let original = ctx.scratch.row.get();
            for plane in ctx.yiq.planes() {
                for row in plane.iter_mut() {
                    ringing_spatial_row(row, original, gain);
                }
            }
        }
        Ringing::Spectral {
            power,
            shift,
            frequency_noise,
        } => {
            let len = next_pow2(width);
            let mask = spectral_mask(len, power, shift);
            let mut noisy_mask = vec![0.0; len];
            let mut spectrum = vec![Complex64::new(0.0, 0.0); len];
            let mut spectral = SpectralRow {
                mask: &mask,
                noisy_mask: &mut noisy_mask,
                spectrum: &mut spectrum,
                frequency_noise,
            };
            for plane in ctx.yiq.planes() {
                for row in plane.iter_mut() {
                    if let Err(err) = spectral.apply(row, &mut ctx.rng) {
                        log::warn!("skipping spectral ringing for row: {err}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_symmetric_about_dc() {
        assert_eq!(RING_PATTERN[32], 1.0);
        for i in 1..32 {
            assert_eq!(RING_PATTERN[32 - i], RING_PATTERN[32 + i], "index {i}");
        }
    }

    #[test]
    fn unshifted_mask_passes_dc() {
        let mask = spectral_mask(16, 1, 0);
        assert_eq!(mask.len(), 16);
        assert_eq!(mask[8], 1.0);
        assert_eq!(mask[0], RING_PATTERN[0]);
    }

    #[test]
    fn shifted_mask_is_wider() {
        let narrow = spectral_mask(64, 1, 0);
        let wide = spectral_mask(64, 1, 1);
        assert!(wide[4] > narrow[4]);
        assert_eq!(wide[32], 1.0);
    }

    #[test]
    fn mask_power_is_repeated_multiplication() {
        let single = spectral_mask(32, 1, 0);
        let cubed = spectral_mask(32, 3, 0);
        for (a, b) in single.iter().zip(cubed.iter()) {
            assert_eq!(a * a * a, *b);
        }
    }

    #[test]
    fn spatial_gain_of_one_is_identity() {
        let mut row = [10, 50, 20, 90, 0, 30];
        let mut scratch = [0; 6];
        ringing_spatial_row(&mut row, &mut scratch, 1.0);
        assert_eq!(row, [10, 50, 20, 90, 0, 30]);
    }

    #[test]
    fn spatial_ringing_reads_original_samples() {
        let mut row = [0, 0, 100, 100, 0];
        let mut scratch = [0; 5];
        ringing_spatial_row(&mut row, &mut scratch, 2.0);
        assert_eq!(row, [0, 10, 110, 90, 0]);
    }

    #[test]
    fn spectral_flat_row_stays_flat() {
        let mask = spectral_mask(16, 2, 0);
        let mut noisy = vec![0.0; 16];
        let mut spectrum = vec![Complex64::new(0.0, 0.0); 16];
        let mut spectral = SpectralRow {
            mask: &mask,
            noisy_mask: &mut noisy,
            spectrum: &mut spectrum,
            frequency_noise: None,
        };
        let mut row = [77; 12];
        let mut rng = XorWowRandom::new(5);
        spectral.apply(&mut row, &mut rng).unwrap();
        for v in row {
            assert!((76..=77).contains(&v), "{v}");
        }
    }

    #[test]
    fn frequency_noise_stays_within_row_range() {
        let mask = spectral_mask(32, 2, 0);
        let mut noisy = vec![0.0; 32];
        let mut spectrum = vec![Complex64::new(0.0, 0.0); 32];
        let mut spectral = SpectralRow {
            mask: &mask,
            noisy_mask: &mut noisy,
            spectrum: &mut spectrum,
            frequency_noise: Some(FrequencyNoise {
                size: 0.5,
                amplitude: 2.0,
            }),
        };
        let mut row: Vec<i32> = (0..32).map(|x| if x % 8 < 4 { 20 } else { 200 }).collect();
        let mut rng = XorWowRandom::new(9);
        spectral.apply(&mut row, &mut rng).unwrap();
        assert!(row.iter().all(|v| (20..=200).contains(v)));
    }
}
