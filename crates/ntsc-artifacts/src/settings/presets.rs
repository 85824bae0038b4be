use num_traits::FromPrimitive;

use crate::random::XorWowRandom;

use super::{NtscConfig, PhaseShift, RingingAlgorithm, VHSTapeSpeed};

/// Built-in named starting points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Default,
    Composite,
    Vhs,
    Broadcast,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Default,
        Preset::Composite,
        Preset::Vhs,
        Preset::Broadcast,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Composite => "composite",
            Preset::Vhs => "vhs",
            Preset::Broadcast => "broadcast",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.name() == name)
    }

    pub fn config(&self) -> NtscConfig {
        let mut config = NtscConfig::default();
        match self {
            Preset::Default => {}
            Preset::Composite => {
                config.composite_preemphasis = 0.8;
                config.color_bleed_horiz = 6;
                config.ringing = 0.4;
            }
            Preset::Vhs => {
                config.emulating_vhs = true;
                config.vhs_chroma_vert_blend = true;
                config.vhs_out_sharpen = 0.4;
                config.vhs_edge_wave = 20;
                config.video_chroma_loss = 30;
            }
            Preset::Broadcast => {
                config.video_noise = 10;
                config.video_chroma_noise = 5;
                config.video_chroma_phase_noise = 2;
            }
        }
        config
    }
}

impl NtscConfig {
    /// Look up a preset by name. Unknown names give the default configuration.
    pub fn named_preset(name: &str) -> Self {
        Preset::from_name(name)
            .map(|preset| preset.config())
            .unwrap_or_default()
    }

    /// Draw a random configuration. The same non-zero seed always gives the same configuration; a seed of 0 seeds from
    /// the clock.
    pub fn random(seed: u32) -> Self {
        const PHASES: [PhaseShift; 4] = [
            PhaseShift::Degrees0,
            PhaseShift::Degrees90,
            PhaseShift::Degrees180,
            PhaseShift::Degrees270,
        ];

        let mut rng = XorWowRandom::new(seed);
        let mut config = NtscConfig::default();

        // The draw order is fixed; reordering these changes every random preset.
        config.composite_preemphasis = rng.uniform_range(0.0, 8.0);
        config.vhs_out_sharpen = rng.triangular(1.0, 5.0, 1.5);
        config.composite_in_chroma_lowpass = rng.uniform01() < 0.8;
        config.composite_out_chroma_lowpass = rng.uniform01() < 0.8;
        config.composite_out_chroma_lowpass_lite = rng.uniform01() < 0.8;
        config.video_chroma_noise = rng.triangular(0.0, 16384.0, 2.0) as i32;
        config.video_chroma_phase_noise = rng.triangular(0.0, 50.0, 2.0) as i32;
        config.video_chroma_loss = rng.triangular(0.0, 50000.0, 10.0) as i32;
        config.video_noise = rng.triangular(0.0, 4200.0, 2.0) as i32;
        config.emulating_vhs = rng.uniform01() < 0.2;
        config.vhs_edge_wave = rng.triangular(0.0, 5.0, 0.0) as i32;

        config.video_scanline_phase_shift = PHASES[rng.next_i32().rem_euclid(4) as usize];
        config.video_scanline_phase_shift_offset = rng.next_i32().rem_euclid(4);
        config.output_vhs_tape_speed =
            VHSTapeSpeed::from_i32(rng.next_i32().rem_euclid(3)).unwrap_or(VHSTapeSpeed::SP);

        if rng.uniform01() < 0.8 {
            config.ringing = rng.uniform_range(0.3, 0.7);
            if rng.uniform01() < 0.8 {
                config.freq_noise_size = rng.uniform_range(0.5, 0.99);
                config.freq_noise_amplitude = rng.uniform_range(0.5, 2.0);
            }
            config.ringing_algorithm = if rng.uniform01() < 0.5 {
                RingingAlgorithm::Spectral
            } else {
                RingingAlgorithm::Spatial
            };
            config.ringing_power = rng.next_i32().rem_euclid(6) + 2;
        }

        config.color_bleed_before = rng.next_i32().rem_euclid(2) == 1;
        config.color_bleed_horiz = rng.triangular(0.0, 8.0, 0.0) as i32;
        config.color_bleed_vert = rng.triangular(0.0, 8.0, 0.0) as i32;

        config.head_switching_speed = rng.triangular(0.0, 100.0, 0.0) as i32;
        config.black_line_cut = rng.uniform01() < 0.1;
        config.precise = rng.uniform01() < 0.3;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vhs_preset_deltas() {
        let config = NtscConfig::named_preset("vhs");
        assert!(config.emulating_vhs);
        assert!(config.vhs_chroma_vert_blend);
        assert_eq!(config.vhs_out_sharpen, 0.4);
        assert_eq!(config.vhs_edge_wave, 20);
        assert_eq!(config.video_chroma_loss, 30);
        assert_eq!(config.video_noise, NtscConfig::default().video_noise);
    }

    #[test]
    fn composite_and_broadcast_presets() {
        let composite = NtscConfig::named_preset("composite");
        assert_eq!(composite.composite_preemphasis, 0.8);
        assert_eq!(composite.color_bleed_horiz, 6);
        assert_eq!(composite.ringing, 0.4);

        let broadcast = NtscConfig::named_preset("broadcast");
        assert_eq!(broadcast.video_noise, 10);
        assert_eq!(broadcast.video_chroma_noise, 5);
        assert_eq!(broadcast.video_chroma_phase_noise, 2);
    }

    #[test]
    fn unknown_preset_is_default() {
        assert_eq!(NtscConfig::named_preset("betamax"), NtscConfig::default());
        assert_eq!(NtscConfig::named_preset("default"), NtscConfig::default());
    }

    #[test]
    fn random_is_deterministic() {
        assert_eq!(NtscConfig::random(42), NtscConfig::random(42));
        assert_ne!(NtscConfig::random(42), NtscConfig::random(43));
    }

    #[test]
    fn random_values_in_range() {
        for seed in 1..200 {
            let config = NtscConfig::random(seed);
            assert!((0.0..=8.0).contains(&config.composite_preemphasis));
            assert!((1.0..=5.0).contains(&config.vhs_out_sharpen));
            assert!((0..=3).contains(&config.video_scanline_phase_shift_offset));
            assert!((2..=7).contains(&config.ringing_power));
            assert!((0..=8).contains(&config.color_bleed_horiz));
            assert!((0..=100).contains(&config.head_switching_speed));
        }
    }
}
