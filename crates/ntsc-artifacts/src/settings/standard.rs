use std::collections::HashMap;

use tinyjson::JsonValue;

use super::{
    GetAndExpect, MenuItem, ParseSettingsError, SettingDescriptor, SettingKind, Settings,
    SettingsEnum, SettingsList,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum PhaseShift {
    Degrees0 = 0,
    Degrees90,
    Degrees180,
    Degrees270,
}
impl SettingsEnum for PhaseShift {}

impl PhaseShift {
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Degrees0),
            90 => Some(Self::Degrees90),
            180 => Some(Self::Degrees180),
            270 => Some(Self::Degrees270),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum VHSTapeSpeed {
    SP = 0,
    LP,
    EP,
}
impl SettingsEnum for VHSTapeSpeed {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VHSTapeParams {
    pub luma_cut: f64,
    pub chroma_cut: f64,
    pub chroma_delay: usize,
}

impl VHSTapeSpeed {
    pub fn filter_params(&self) -> VHSTapeParams {
        match self {
            Self::SP => VHSTapeParams {
                luma_cut: 2400000.0,
                chroma_cut: 320000.0,
                chroma_delay: 9,
            },
            Self::LP => VHSTapeParams {
                luma_cut: 1900000.0,
                chroma_cut: 300000.0,
                chroma_delay: 12,
            },
            Self::EP => VHSTapeParams {
                luma_cut: 1400000.0,
                chroma_cut: 280000.0,
                chroma_delay: 14,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RingingAlgorithm {
    Spatial = 0,
    Spectral,
}
impl SettingsEnum for RingingAlgorithm {}

pub type NtscSettingID = super::SettingID<NtscConfig>;

#[rustfmt::skip]
pub mod setting_id {
    use super::NtscSettingID;
    use crate::setting_id;

    pub const COMPOSITE_PREEMPHASIS: NtscSettingID = setting_id!(0, "composite_preemphasis", composite_preemphasis);
    pub const COMPOSITE_PREEMPHASIS_CUT: NtscSettingID = setting_id!(1, "composite_preemphasis_cut", composite_preemphasis_cut);
    pub const VHS_OUT_SHARPEN: NtscSettingID = setting_id!(2, "vhs_out_sharpen", vhs_out_sharpen);
    pub const VHS_EDGE_WAVE: NtscSettingID = setting_id!(3, "vhs_edge_wave", vhs_edge_wave);
    pub const VHS_HEAD_SWITCHING: NtscSettingID = setting_id!(4, "vhs_head_switching", vhs_head_switching);
    pub const VHS_HEAD_SWITCHING_POINT: NtscSettingID = setting_id!(5, "vhs_head_switching_point", vhs_head_switching_point);
    pub const VHS_HEAD_SWITCHING_PHASE: NtscSettingID = setting_id!(6, "vhs_head_switching_phase", vhs_head_switching_phase);
    pub const VHS_HEAD_SWITCHING_PHASE_NOISE: NtscSettingID = setting_id!(7, "vhs_head_switching_phase_noise", vhs_head_switching_phase_noise);
    pub const HEAD_SWITCHING_SPEED: NtscSettingID = setting_id!(8, "head_switching_speed", head_switching_speed);
    pub const COLOR_BLEED_BEFORE: NtscSettingID = setting_id!(9, "color_bleed_before", color_bleed_before);
    pub const COLOR_BLEED_HORIZ: NtscSettingID = setting_id!(10, "color_bleed_horiz", color_bleed_horiz);
    pub const COLOR_BLEED_VERT: NtscSettingID = setting_id!(11, "color_bleed_vert", color_bleed_vert);
    pub const RINGING: NtscSettingID = setting_id!(12, "ringing", ringing);
    pub const RINGING_ALGORITHM: NtscSettingID = setting_id!(13, "ringing_algorithm", ringing_algorithm);
    pub const RINGING_POWER: NtscSettingID = setting_id!(14, "ringing_power", ringing_power);
    pub const RINGING_SHIFT: NtscSettingID = setting_id!(15, "ringing_shift", ringing_shift);
    pub const FREQ_NOISE_SIZE: NtscSettingID = setting_id!(16, "freq_noise_size", freq_noise_size);
    pub const FREQ_NOISE_AMPLITUDE: NtscSettingID = setting_id!(17, "freq_noise_amplitude", freq_noise_amplitude);
    pub const COMPOSITE_IN_CHROMA_LOWPASS: NtscSettingID = setting_id!(18, "composite_in_chroma_lowpass", composite_in_chroma_lowpass);
    pub const COMPOSITE_OUT_CHROMA_LOWPASS: NtscSettingID = setting_id!(19, "composite_out_chroma_lowpass", composite_out_chroma_lowpass);
    pub const COMPOSITE_OUT_CHROMA_LOWPASS_LITE: NtscSettingID = setting_id!(20, "composite_out_chroma_lowpass_lite", composite_out_chroma_lowpass_lite);
    pub const VIDEO_CHROMA_NOISE: NtscSettingID = setting_id!(21, "video_chroma_noise", video_chroma_noise);
    pub const VIDEO_CHROMA_PHASE_NOISE: NtscSettingID = setting_id!(22, "video_chroma_phase_noise", video_chroma_phase_noise);
    pub const VIDEO_CHROMA_LOSS: NtscSettingID = setting_id!(23, "video_chroma_loss", video_chroma_loss);
    pub const VIDEO_NOISE: NtscSettingID = setting_id!(24, "video_noise", video_noise);
    pub const SUBCARRIER_AMPLITUDE: NtscSettingID = setting_id!(25, "subcarrier_amplitude", subcarrier_amplitude);
    pub const SUBCARRIER_AMPLITUDE_BACK: NtscSettingID = setting_id!(26, "subcarrier_amplitude_back", subcarrier_amplitude_back);
    pub const EMULATING_VHS: NtscSettingID = setting_id!(27, "emulating_vhs", emulating_vhs);
    pub const NO_COLOR_SUBCARRIER: NtscSettingID = setting_id!(28, "no_color_subcarrier", no_color_subcarrier);
    pub const VHS_CHROMA_VERT_BLEND: NtscSettingID = setting_id!(29, "vhs_chroma_vert_blend", vhs_chroma_vert_blend);
    pub const VHS_SVIDEO_OUT: NtscSettingID = setting_id!(30, "vhs_svideo_out", vhs_svideo_out);
    pub const OUTPUT_NTSC: NtscSettingID = setting_id!(31, "output_ntsc", output_ntsc);
    pub const VIDEO_SCANLINE_PHASE_SHIFT: NtscSettingID = setting_id!(32, "video_scanline_phase_shift", video_scanline_phase_shift);
    pub const VIDEO_SCANLINE_PHASE_SHIFT_OFFSET: NtscSettingID = setting_id!(33, "video_scanline_phase_shift_offset", video_scanline_phase_shift_offset);
    pub const OUTPUT_VHS_TAPE_SPEED: NtscSettingID = setting_id!(34, "output_vhs_tape_speed", output_vhs_tape_speed);
    pub const BLACK_LINE_CUT: NtscSettingID = setting_id!(35, "black_line_cut", black_line_cut);
    pub const PRECISE: NtscSettingID = setting_id!(36, "precise", precise);
    pub const RANDOM_SEED: NtscSettingID = setting_id!(37, "random_seed", random_seed);
    pub const RANDOM_SEED2: NtscSettingID = setting_id!(38, "random_seed2", random_seed2);
}

/// Every knob of the effect. Constructed once per request and never mutated by processing.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct NtscConfig {
    pub composite_preemphasis: f64,
    pub composite_preemphasis_cut: f64,
    pub vhs_out_sharpen: f64,
    pub vhs_edge_wave: i32,
    pub vhs_head_switching: bool,
    pub vhs_head_switching_point: f64,
    pub vhs_head_switching_phase: f64,
    pub vhs_head_switching_phase_noise: f64,
    pub head_switching_speed: i32,
    pub color_bleed_before: bool,
    pub color_bleed_horiz: i32,
    pub color_bleed_vert: i32,
    pub ringing: f64,
    pub ringing_algorithm: RingingAlgorithm,
    pub ringing_power: i32,
    pub ringing_shift: i32,
    pub freq_noise_size: f64,
    pub freq_noise_amplitude: f64,
    pub composite_in_chroma_lowpass: bool,
    pub composite_out_chroma_lowpass: bool,
    pub composite_out_chroma_lowpass_lite: bool,
    pub video_chroma_noise: i32,
    pub video_chroma_phase_noise: i32,
    pub video_chroma_loss: i32,
    pub video_noise: i32,
    pub subcarrier_amplitude: i32,
    pub subcarrier_amplitude_back: i32,
    pub emulating_vhs: bool,
    pub no_color_subcarrier: bool,
    pub vhs_chroma_vert_blend: bool,
    pub vhs_svideo_out: bool,
    pub output_ntsc: bool,
    pub video_scanline_phase_shift: PhaseShift,
    pub video_scanline_phase_shift_offset: i32,
    pub output_vhs_tape_speed: VHSTapeSpeed,
    pub black_line_cut: bool,
    pub precise: bool,
    pub random_seed: u32,
    pub random_seed2: u32,
}

impl Default for NtscConfig {
    fn default() -> Self {
        Self {
            composite_preemphasis: 0.0,
            composite_preemphasis_cut: 1000000.0,
            vhs_out_sharpen: 1.5,
            vhs_edge_wave: 0,
            vhs_head_switching: false,
            vhs_head_switching_point: 1.0 - (4.5 + 0.01) / 262.5,
            vhs_head_switching_phase: (1.0 - 0.01) / 262.5,
            vhs_head_switching_phase_noise: 1.0 / 500.0 / 262.5,
            head_switching_speed: 0,
            color_bleed_before: true,
            color_bleed_horiz: 0,
            color_bleed_vert: 0,
            ringing: 1.0,
            ringing_algorithm: RingingAlgorithm::Spatial,
            ringing_power: 2,
            ringing_shift: 0,
            freq_noise_size: 0.0,
            freq_noise_amplitude: 2.0,
            composite_in_chroma_lowpass: true,
            composite_out_chroma_lowpass: true,
            composite_out_chroma_lowpass_lite: true,
            video_chroma_noise: 0,
            video_chroma_phase_noise: 0,
            video_chroma_loss: 0,
            video_noise: 2,
            subcarrier_amplitude: 50,
            subcarrier_amplitude_back: 50,
            emulating_vhs: false,
            no_color_subcarrier: false,
            vhs_chroma_vert_blend: true,
            vhs_svideo_out: false,
            output_ntsc: true,
            video_scanline_phase_shift: PhaseShift::Degrees180,
            video_scanline_phase_shift_offset: 0,
            output_vhs_tape_speed: VHSTapeSpeed::SP,
            black_line_cut: false,
            precise: false,
            random_seed: 12345,
            random_seed2: 67890,
        }
    }
}

impl Settings for NtscConfig {
    fn setting_descriptors() -> Box<[SettingDescriptor<Self>]> {
        vec![
            SettingDescriptor {
                label: "Random seed (even field)",
                description: Some("Seed for the noise applied to the even-numbered rows."),
                kind: SettingKind::Seed,
                id: setting_id::RANDOM_SEED,
            },
            SettingDescriptor {
                label: "Random seed (odd field)",
                description: Some("Seed for the noise applied to the odd-numbered rows."),
                kind: SettingKind::Seed,
                id: setting_id::RANDOM_SEED2,
            },
            SettingDescriptor {
                label: "Black line cut",
                description: Some("Blank out a thin strip along the right edge of the image."),
                kind: SettingKind::Boolean,
                id: setting_id::BLACK_LINE_CUT,
            },
            SettingDescriptor {
                label: "Color bleed before modulation",
                description: Some("Shift the chrominance before it is modulated into the composite signal instead of at the very end."),
                kind: SettingKind::Boolean,
                id: setting_id::COLOR_BLEED_BEFORE,
            },
            SettingDescriptor {
                label: "Color bleed horizontal",
                description: Some("Horizontal offset, in pixels, of the chrominance relative to the luminance."),
                kind: SettingKind::IntRange { range: -64..=64 },
                id: setting_id::COLOR_BLEED_HORIZ,
            },
            SettingDescriptor {
                label: "Color bleed vertical",
                description: Some("Vertical offset, in rows, of the chrominance relative to the luminance."),
                kind: SettingKind::IntRange { range: -16..=16 },
                id: setting_id::COLOR_BLEED_VERT,
            },
            SettingDescriptor {
                label: "Chroma low-pass in",
                description: Some("Band-limit the input chrominance (color) signal before modulation."),
                kind: SettingKind::Boolean,
                id: setting_id::COMPOSITE_IN_CHROMA_LOWPASS,
            },
            SettingDescriptor {
                label: "Ringing",
                description: Some("Strength of the ringing around sharp edges. 1.0 disables the effect."),
                kind: SettingKind::FloatRange { range: 0.0..=3.0 },
                id: setting_id::RINGING,
            },
            SettingDescriptor {
                label: "Ringing algorithm",
                description: Some("How the ringing is produced."),
                kind: SettingKind::Enumeration {
                    options: vec![
                        MenuItem {
                            label: "Spatial",
                            description: Some("Add a scaled neighbor difference to each sample. Cheap and subtle."),
                            index: RingingAlgorithm::Spatial as u32,
                        },
                        MenuItem {
                            label: "Spectral",
                            description: Some("Mask each row's frequency spectrum with a ringing pattern."),
                            index: RingingAlgorithm::Spectral as u32,
                        },
                    ],
                },
                id: setting_id::RINGING_ALGORITHM,
            },
            SettingDescriptor {
                label: "Ringing power",
                description: Some("Exponent applied to the spectral ringing mask. Higher values ring harder."),
                kind: SettingKind::IntRange { range: 1..=8 },
                id: setting_id::RINGING_POWER,
            },
            SettingDescriptor {
                label: "Ringing shift",
                description: Some("Stretch of the spectral ringing mask relative to the row length."),
                kind: SettingKind::IntRange { range: 0..=8 },
                id: setting_id::RINGING_SHIFT,
            },
            SettingDescriptor {
                label: "Frequency noise size",
                description: Some("Fraction of the spectrum, measured from the edges, that receives random noise. 0 disables it."),
                kind: SettingKind::FloatRange { range: 0.0..=1.0 },
                id: setting_id::FREQ_NOISE_SIZE,
            },
            SettingDescriptor {
                label: "Frequency noise amplitude",
                description: Some("Amplitude of the spectral noise."),
                kind: SettingKind::FloatRange { range: 0.0..=5.0 },
                id: setting_id::FREQ_NOISE_AMPLITUDE,
            },
            SettingDescriptor {
                label: "Subcarrier amplitude",
                description: Some("Strength of the chroma subcarrier when modulating."),
                kind: SettingKind::IntRange { range: 0..=100 },
                id: setting_id::SUBCARRIER_AMPLITUDE,
            },
            SettingDescriptor {
                label: "Composite preemphasis",
                description: Some("Boost high frequencies in the composite signal, sharpening the image and intensifying colors."),
                kind: SettingKind::FloatRange { range: 0.0..=10.0 },
                id: setting_id::COMPOSITE_PREEMPHASIS,
            },
            SettingDescriptor {
                label: "Composite preemphasis cutoff",
                description: Some("Cutoff frequency, in Hz, of the preemphasis filter."),
                kind: SettingKind::FloatRange { range: 1.0..=10000000.0 },
                id: setting_id::COMPOSITE_PREEMPHASIS_CUT,
            },
            SettingDescriptor {
                label: "Composite noise",
                description: Some("Noise added to the composite signal."),
                kind: SettingKind::IntRange { range: 0..=4200 },
                id: setting_id::VIDEO_NOISE,
            },
            SettingDescriptor {
                label: "Head switching",
                description: Some("Emulate VHS head-switching artifacts at the bottom of the image."),
                kind: SettingKind::Group {
                    children: vec![
                        SettingDescriptor {
                            label: "Switch point",
                            description: Some("Position of the switch within the frame, as a fraction of a frame."),
                            kind: SettingKind::FloatRange { range: 0.0..=1.0 },
                            id: setting_id::VHS_HEAD_SWITCHING_POINT,
                        },
                        SettingDescriptor {
                            label: "Switch phase",
                            description: Some("Horizontal position at which the first shifted row starts."),
                            kind: SettingKind::FloatRange { range: 0.0..=1.0 },
                            id: setting_id::VHS_HEAD_SWITCHING_PHASE,
                        },
                        SettingDescriptor {
                            label: "Phase noise",
                            description: Some("Random jitter of the switch point and phase."),
                            kind: SettingKind::FloatRange { range: 0.0..=1.0 },
                            id: setting_id::VHS_HEAD_SWITCHING_PHASE_NOISE,
                        },
                        SettingDescriptor {
                            label: "Speed",
                            description: Some("Random drift of the switch point from frame to frame."),
                            kind: SettingKind::IntRange { range: 0..=100 },
                            id: setting_id::HEAD_SWITCHING_SPEED,
                        },
                    ],
                },
                id: setting_id::VHS_HEAD_SWITCHING,
            },
            SettingDescriptor {
                label: "Disable color subcarrier",
                description: Some("Skip demodulation, leaving the chroma pattern in the luminance."),
                kind: SettingKind::Boolean,
                id: setting_id::NO_COLOR_SUBCARRIER,
            },
            SettingDescriptor {
                label: "Subcarrier amplitude (demodulation)",
                description: Some("Subcarrier strength assumed when demodulating."),
                kind: SettingKind::IntRange { range: 0..=100 },
                id: setting_id::SUBCARRIER_AMPLITUDE_BACK,
            },
            SettingDescriptor {
                label: "Chroma noise",
                description: Some("Noise added to the chrominance (color) signal."),
                kind: SettingKind::IntRange { range: 0..=16384 },
                id: setting_id::VIDEO_CHROMA_NOISE,
            },
            SettingDescriptor {
                label: "Chroma phase noise",
                description: Some("Random per-row rotation of the chroma phase."),
                kind: SettingKind::IntRange { range: 0..=50 },
                id: setting_id::VIDEO_CHROMA_PHASE_NOISE,
            },
            SettingDescriptor {
                label: "Emulate VHS",
                description: Some("Emulate the bandwidth limits and distortions of VHS tape."),
                kind: SettingKind::Group {
                    children: vec![
                        SettingDescriptor {
                            label: "Tape speed",
                            description: Some("Emulate cutoff frequency of various VHS tape speeds."),
                            kind: SettingKind::Enumeration {
                                options: vec![
                                    MenuItem {
                                        label: "SP (Standard Play)",
                                        description: None,
                                        index: VHSTapeSpeed::SP as u32,
                                    },
                                    MenuItem {
                                        label: "LP (Long Play)",
                                        description: None,
                                        index: VHSTapeSpeed::LP as u32,
                                    },
                                    MenuItem {
                                        label: "EP (Extended Play)",
                                        description: None,
                                        index: VHSTapeSpeed::EP as u32,
                                    },
                                ],
                            },
                            id: setting_id::OUTPUT_VHS_TAPE_SPEED,
                        },
                        SettingDescriptor {
                            label: "Edge wave",
                            description: Some("Maximum horizontal wobble, in pixels, of each row."),
                            kind: SettingKind::IntRange { range: 0..=100 },
                            id: setting_id::VHS_EDGE_WAVE,
                        },
                        SettingDescriptor {
                            label: "Chroma vertical blend",
                            description: Some("Blend each chroma row with the one above it, as VHS decks do."),
                            kind: SettingKind::Boolean,
                            id: setting_id::VHS_CHROMA_VERT_BLEND,
                        },
                        SettingDescriptor {
                            label: "Sharpen",
                            description: Some("Strength of the playback sharpening filter."),
                            kind: SettingKind::FloatRange { range: 0.0..=5.0 },
                            id: setting_id::VHS_OUT_SHARPEN,
                        },
                        SettingDescriptor {
                            label: "S-Video out",
                            description: Some("Keep luminance and chrominance separate on playback instead of re-encoding them."),
                            kind: SettingKind::Boolean,
                            id: setting_id::VHS_SVIDEO_OUT,
                        },
                    ],
                },
                id: setting_id::EMULATING_VHS,
            },
            SettingDescriptor {
                label: "Chroma loss",
                description: Some("Chance, out of 100000, that a row loses its color entirely."),
                kind: SettingKind::IntRange { range: 0..=100000 },
                id: setting_id::VIDEO_CHROMA_LOSS,
            },
            SettingDescriptor {
                label: "Chroma low-pass out",
                description: Some("Band-limit the output chrominance (color) signal."),
                kind: SettingKind::Boolean,
                id: setting_id::COMPOSITE_OUT_CHROMA_LOWPASS,
            },
            SettingDescriptor {
                label: "Light chroma low-pass out",
                description: Some("Use a less intense output filter, like a TV would."),
                kind: SettingKind::Boolean,
                id: setting_id::COMPOSITE_OUT_CHROMA_LOWPASS_LITE,
            },
            SettingDescriptor {
                label: "NTSC output",
                description: Some("Use NTSC timing. When disabled, PAL timing is used for head switching and the chroma vertical blend is skipped."),
                kind: SettingKind::Boolean,
                id: setting_id::OUTPUT_NTSC,
            },
            SettingDescriptor {
                label: "Scanline phase shift",
                description: Some("Phase shift of the chrominance (color) signal each scanline. Usually 180 degrees."),
                kind: SettingKind::Enumeration {
                    options: vec![
                        MenuItem {
                            label: "0 degrees",
                            description: None,
                            index: PhaseShift::Degrees0 as u32,
                        },
                        MenuItem {
                            label: "90 degrees",
                            description: None,
                            index: PhaseShift::Degrees90 as u32,
                        },
                        MenuItem {
                            label: "180 degrees",
                            description: None,
                            index: PhaseShift::Degrees180 as u32,
                        },
                        MenuItem {
                            label: "270 degrees",
                            description: None,
                            index: PhaseShift::Degrees270 as u32,
                        },
                    ],
                },
                id: setting_id::VIDEO_SCANLINE_PHASE_SHIFT,
            },
            SettingDescriptor {
                label: "Scanline phase shift offset",
                description: None,
                kind: SettingKind::IntRange { range: 0..=3 },
                id: setting_id::VIDEO_SCANLINE_PHASE_SHIFT_OFFSET,
            },
            SettingDescriptor {
                label: "Precise noise",
                description: Some("Use the slower, smoother noise generators."),
                kind: SettingKind::Boolean,
                id: setting_id::PRECISE,
            },
        ]
        .into_boxed_slice()
    }
}

/// Field names used by presets saved from the browser front end, which predate versioned presets, and the stable name
/// of the same setting. `VideoScanlinePhaseShift` and `EnableRinging2` are re-encoded and handled separately.
const PASCAL_CASE_NAMES: [(&str, &str); 37] = [
    ("CompositePreemphasis", "composite_preemphasis"),
    ("CompositePreemphasisCut", "composite_preemphasis_cut"),
    ("VHSOutSharpen", "vhs_out_sharpen"),
    ("VHSEdgeWave", "vhs_edge_wave"),
    ("VHSHeadSwitching", "vhs_head_switching"),
    ("VHSHeadSwitchingPoint", "vhs_head_switching_point"),
    ("VHSHeadSwitchingPhase", "vhs_head_switching_phase"),
    ("VHSHeadSwitchingPhaseNoise", "vhs_head_switching_phase_noise"),
    ("HeadSwitchingSpeed", "head_switching_speed"),
    ("ColorBleedBefore", "color_bleed_before"),
    ("ColorBleedHoriz", "color_bleed_horiz"),
    ("ColorBleedVert", "color_bleed_vert"),
    ("Ringing", "ringing"),
    ("RingingPower", "ringing_power"),
    ("RingingShift", "ringing_shift"),
    ("FreqNoiseSize", "freq_noise_size"),
    ("FreqNoiseAmplitude", "freq_noise_amplitude"),
    ("CompositeInChromaLowpass", "composite_in_chroma_lowpass"),
    ("CompositeOutChromaLowpass", "composite_out_chroma_lowpass"),
    ("CompositeOutChromaLowpassLite", "composite_out_chroma_lowpass_lite"),
    ("VideoChromaNoise", "video_chroma_noise"),
    ("VideoChromaPhaseNoise", "video_chroma_phase_noise"),
    ("VideoChromaLoss", "video_chroma_loss"),
    ("VideoNoise", "video_noise"),
    ("SubcarrierAmplitude", "subcarrier_amplitude"),
    ("SubcarrierAmplitudeBack", "subcarrier_amplitude_back"),
    ("EmulatingVHS", "emulating_vhs"),
    ("NoColorSubcarrier", "no_color_subcarrier"),
    ("VHSChromaVertBlend", "vhs_chroma_vert_blend"),
    ("VHSSVideoOut", "vhs_svideo_out"),
    ("OutputNTSC", "output_ntsc"),
    ("VideoScanlinePhaseShiftOffset", "video_scanline_phase_shift_offset"),
    ("OutputVHSTapeSpeed", "output_vhs_tape_speed"),
    ("BlackLineCut", "black_line_cut"),
    ("Precise", "precise"),
    ("RandomSeed", "random_seed"),
    ("RandomSeed2", "random_seed2"),
];

fn is_pascal_case_preset(json: &HashMap<String, JsonValue>) -> bool {
    !json.contains_key("version")
        && json
            .keys()
            .any(|key| key.starts_with(|c: char| c.is_ascii_uppercase()))
}

impl SettingsList<NtscConfig> {
    /// Parse settings from a given string of JSON. Unversioned objects with PascalCase keys are read as presets from
    /// the browser front end.
    pub fn from_json(&self, json: &str) -> Result<NtscConfig, ParseSettingsError> {
        let parsed = json.parse::<JsonValue>()?;

        let parsed_map = parsed.get::<HashMap<_, _>>().ok_or_else(|| {
            ParseSettingsError::InvalidSettingType {
                key: "<root>".to_string(),
                expected: "object",
            }
        })?;

        if is_pascal_case_preset(parsed_map) {
            return self.from_pascal_case_json(parsed_map);
        }

        let version = parsed_map
            .get_and_expect::<f64>("version")?
            .ok_or(ParseSettingsError::MissingField { field: "version" })?;
        if version != 1.0 {
            return Err(ParseSettingsError::UnsupportedVersion { version });
        }

        let mut dst_settings = NtscConfig::default();
        Self::settings_from_json(parsed_map, &self.setting_descriptors, &mut dst_settings)?;

        Ok(dst_settings)
    }

    /// Read a front-end preset. Keys match their setting case-insensitively. The scanline phase shift is given in
    /// degrees, where anything other than 90, 180 or 270 means no shift, and `EnableRinging2` picks spectral ringing.
    pub fn from_pascal_case_json(
        &self,
        json: &HashMap<String, JsonValue>,
    ) -> Result<NtscConfig, ParseSettingsError> {
        let lookup = |name: &str| {
            json.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(key, value)| (key.clone(), value.clone()))
        };

        let mut renamed = HashMap::with_capacity(PASCAL_CASE_NAMES.len());
        for (pascal, snake) in PASCAL_CASE_NAMES {
            if let Some((_, value)) = lookup(pascal) {
                renamed.insert(snake.to_owned(), value);
            }
        }

        let mut settings = NtscConfig::default();
        Self::settings_from_json(&renamed, &self.setting_descriptors, &mut settings)?;

        if let Some((key, value)) = lookup("VideoScanlinePhaseShift") {
            let degrees = value
                .get::<f64>()
                .ok_or(ParseSettingsError::InvalidSettingType { key, expected: "f64" })?;
            settings.video_scanline_phase_shift =
                PhaseShift::from_degrees(*degrees as i32).unwrap_or(PhaseShift::Degrees0);
        }
        if let Some((key, value)) = lookup("EnableRinging2") {
            let spectral = value
                .get::<bool>()
                .ok_or(ParseSettingsError::InvalidSettingType { key, expected: "bool" })?;
            settings.ringing_algorithm = if *spectral {
                RingingAlgorithm::Spectral
            } else {
                RingingAlgorithm::Spatial
            };
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn json_round_trip() {
        let list = SettingsList::<NtscConfig>::new();
        let mut config = NtscConfig::default();
        config.composite_preemphasis = 2.5;
        config.ringing_algorithm = RingingAlgorithm::Spectral;
        config.output_vhs_tape_speed = VHSTapeSpeed::EP;
        config.color_bleed_horiz = -3;
        config.emulating_vhs = true;
        config.random_seed = 4000000000;

        let json = list.to_json_string(&config).unwrap();
        let parsed = list.from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn writes_stable_names() {
        let list = SettingsList::<NtscConfig>::new();
        let json = list.to_json_string(&NtscConfig::default()).unwrap();
        assert!(json.contains("\"output_vhs_tape_speed\":0"));
        assert!(json.contains("\"video_scanline_phase_shift\":2"));
        assert!(json.contains("\"random_seed2\":67890"));
        assert!(json.contains("\"version\":1"));
    }

    #[test]
    fn every_field_has_a_descriptor() {
        let list = SettingsList::<NtscConfig>::new();
        let mut ids = list.all_descriptors().map(|d| d.id.id).collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids, (0..39).collect::<Vec<u32>>());
    }

    #[test]
    fn clamps_and_keeps_defaults() {
        let list = SettingsList::<NtscConfig>::new();
        let config = list
            .from_json(r#"{"version": 1, "video_noise": 99999, "ringing": -4, "unknown": true}"#)
            .unwrap();
        assert_eq!(config.video_noise, 4200);
        assert_eq!(config.ringing, 0.0);
        assert_eq!(config.subcarrier_amplitude, 50);
    }

    #[test]
    fn rejects_bad_version_and_types() {
        let list = SettingsList::<NtscConfig>::new();
        assert!(matches!(
            list.from_json(r#"{"version": 2}"#),
            Err(ParseSettingsError::UnsupportedVersion { .. })
        ));
        assert!(matches!(
            list.from_json(r#"{"video_noise": 3}"#),
            Err(ParseSettingsError::MissingField { field: "version" })
        ));
        assert!(matches!(
            list.from_json(r#"{"version": 1, "precise": 3}"#),
            Err(ParseSettingsError::InvalidSettingType { .. })
        ));
        assert!(matches!(
            list.from_json("[1, 2]"),
            Err(ParseSettingsError::InvalidSettingType { .. })
        ));
        assert!(matches!(
            list.from_json("{"),
            Err(ParseSettingsError::InvalidJSON(_))
        ));
    }

    #[test]
    fn reads_pascal_case_presets() {
        let list = SettingsList::<NtscConfig>::new();
        let config = list
            .from_json(
                r#"{
                    "CompositePreemphasis": 1.5,
                    "ColorBleedBefore": false,
                    "ColorBleedHoriz": 3,
                    "Ringing": 0.6,
                    "EnableRinging2": true,
                    "RingingPower": 4,
                    "VideoNoise": 10,
                    "EmulatingVHS": true,
                    "VHSSVideoOut": true,
                    "VHSHeadSwitchingPhaseNoise": 0.05,
                    "OutputNTSC": false,
                    "VideoScanlinePhaseShift": 90,
                    "VideoScanlinePhaseShiftOffset": 1,
                    "OutputVHSTapeSpeed": 2,
                    "RandomSeed": 424242,
                    "RandomSeed2": 7
                }"#,
            )
            .unwrap();
        assert_eq!(config.composite_preemphasis, 1.5);
        assert!(!config.color_bleed_before);
        assert_eq!(config.color_bleed_horiz, 3);
        assert_eq!(config.ringing, 0.6);
        assert_eq!(config.ringing_algorithm, RingingAlgorithm::Spectral);
        assert_eq!(config.ringing_power, 4);
        assert_eq!(config.video_noise, 10);
        assert!(config.emulating_vhs);
        assert!(config.vhs_svideo_out);
        assert_eq!(config.vhs_head_switching_phase_noise, 0.05);
        assert!(!config.output_ntsc);
        assert_eq!(config.video_scanline_phase_shift, PhaseShift::Degrees90);
        assert_eq!(config.video_scanline_phase_shift_offset, 1);
        assert_eq!(config.output_vhs_tape_speed, VHSTapeSpeed::EP);
        assert_eq!(config.random_seed, 424242);
        assert_eq!(config.random_seed2, 7);
        // Untouched fields keep their defaults.
        assert_eq!(config.subcarrier_amplitude, 50);
        assert!(config.composite_in_chroma_lowpass);
    }

    #[test]
    fn pascal_case_keys_ignore_case_and_odd_values() {
        let list = SettingsList::<NtscConfig>::new();
        let config = list
            .from_json(
                r#"{"VideoNoise": 3, "videoScanlinePhaseShift": 45, "outputVHSTapeSpeed": 9}"#,
            )
            .unwrap();
        assert_eq!(config.video_noise, 3);
        assert_eq!(config.video_scanline_phase_shift, PhaseShift::Degrees0);
        assert_eq!(config.output_vhs_tape_speed, VHSTapeSpeed::SP);

        assert!(matches!(
            list.from_json(r#"{"EnableRinging2": 1}"#),
            Err(ParseSettingsError::InvalidSettingType { .. })
        ));
    }

    #[test]
    fn pascal_case_names_are_all_settings() {
        let list = SettingsList::<NtscConfig>::new();
        for (pascal, snake) in PASCAL_CASE_NAMES {
            assert!(list.descriptor_by_name(snake).is_some(), "{pascal} -> {snake}");
        }
    }

    #[test]
    fn out_of_range_enum_falls_back_to_default() {
        let list = SettingsList::<NtscConfig>::new();
        let config = list
            .from_json(r#"{"version": 1, "output_vhs_tape_speed": 7}"#)
            .unwrap();
        assert_eq!(config.output_vhs_tape_speed, VHSTapeSpeed::SP);

        let config = list
            .from_json(r#"{"version": 1, "video_scanline_phase_shift": 9}"#)
            .unwrap();
        assert_eq!(config.video_scanline_phase_shift, PhaseShift::Degrees180);

        let config = list
            .from_json(r#"{"version": 1, "ringing_algorithm": -1, "output_vhs_tape_speed": 1.5}"#)
            .unwrap();
        assert_eq!(config.ringing_algorithm, RingingAlgorithm::Spatial);
        assert_eq!(config.output_vhs_tape_speed, VHSTapeSpeed::SP);

        let config = list
            .from_json(r#"{"version": 1, "video_scanline_phase_shift": 1}"#)
            .unwrap();
        assert_eq!(config.video_scanline_phase_shift, PhaseShift::Degrees90);
    }

    #[test]
    fn typed_field_access() {
        let mut config = NtscConfig::default();
        config.set_field(&setting_id::VIDEO_NOISE, 7i32).unwrap();
        assert_eq!(config.get_field::<i32>(&setting_id::VIDEO_NOISE).unwrap(), 7);
        assert!(config.set_field(&setting_id::VIDEO_NOISE, true).is_err());
        assert!(config.get_field::<f64>(&setting_id::PRECISE).is_err());
        assert_eq!(
            config
                .get_field::<VHSTapeSpeed>(&setting_id::OUTPUT_VHS_TAPE_SPEED)
                .unwrap(),
            VHSTapeSpeed::SP
        );
    }
}
