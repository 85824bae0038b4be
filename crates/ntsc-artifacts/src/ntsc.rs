use std::time::Instant;

use image::RgbImage;
use log::{debug, trace};

use crate::{
    composite, noise,
    random::{Seeder, XorWowRandom},
    ringing,
    settings::NtscConfig,
    shift::{BoundaryHandling, shift_row_to},
    thread_pool::with_thread_pool,
    vhs,
    yiq_fielding::{FieldView, YiqPlanes},
};

/// Sample rate of the simulated composite signal: four times the NTSC color subcarrier.
pub const NTSC_RATE: f64 = (315000000.00 / 88.0) * 4.0;

/// Seed for the processor's own generator, which hands out one nonce per processed frame.
const PROCESSOR_SEED: u32 = 31374242;

/// Lazily-allocated buffer that's reused across rows.
pub(crate) struct ScratchBuffer<T> {
    buf: Option<Box<[T]>>,
    len: usize,
}

impl<T: Copy + Default> ScratchBuffer<T> {
    pub fn new(len: usize) -> Self {
        ScratchBuffer { buf: None, len }
    }

    pub fn get(&mut self) -> &mut [T] {
        let len = self.len;
        self.buf
            .get_or_insert_with(|| vec![T::default(); len].into_boxed_slice())
    }
}

pub(crate) struct Scratch {
    /// One row of filter samples.
    pub samples: ScratchBuffer<f64>,
    /// A second row of filter samples, for stages that need the input and output at once.
    pub aux: ScratchBuffer<f64>,
    /// One row of integer samples.
    pub row: ScratchBuffer<i32>,
    /// A whole plane's worth of the field.
    pub plane: ScratchBuffer<i32>,
}

impl Scratch {
    fn new(width: usize, num_rows: usize) -> Self {
        Scratch {
            samples: ScratchBuffer::new(width),
            aux: ScratchBuffer::new(width),
            row: ScratchBuffer::new(width),
            plane: ScratchBuffer::new(width * num_rows),
        }
    }
}

/// Everything a stage gets to work with while processing one field.
pub(crate) struct FieldContext<'a> {
    pub yiq: FieldView<'a>,
    pub config: &'a NtscConfig,
    pub rng: XorWowRandom,
    pub scratch: Scratch,
}

struct Stage {
    name: &'static str,
    enabled: fn(&NtscConfig) -> bool,
    apply: fn(&mut FieldContext<'_>),
}

/// The effect chain, in order. Each field runs every enabled stage in turn.
const PIPELINE: [Stage; 16] = [
    Stage {
        name: "black line cut",
        enabled: |c| c.black_line_cut,
        apply: black_line_cut,
    },
    Stage {
        name: "color bleed (before)",
        enabled: |c| c.color_bleed_before && has_color_bleed(c),
        apply: color_bleed,
    },
    Stage {
        name: "input chroma lowpass",
        enabled: |c| c.composite_in_chroma_lowpass,
        apply: composite::composite_chroma_lowpass,
    },
    Stage {
        name: "ringing",
        enabled: |c| c.ringing != 1.0,
        apply: ringing::ringing,
    },
    Stage {
        name: "chroma into luma",
        enabled: |_| true,
        apply: composite::chroma_into_luma_stage,
    },
    Stage {
        name: "composite preemphasis",
        enabled: |c| c.composite_preemphasis != 0.0 && c.composite_preemphasis_cut > 0.0,
        apply: composite::composite_preemphasis,
    },
    Stage {
        name: "video noise",
        enabled: |c| c.video_noise != 0,
        apply: noise::video_noise,
    },
    Stage {
        name: "head switching",
        enabled: |c| c.vhs_head_switching,
        apply: vhs::head_switching,
    },
    Stage {
        name: "chroma from luma",
        enabled: |c| !c.no_color_subcarrier,
        apply: composite::chroma_from_luma_stage,
    },
    Stage {
        name: "chroma noise",
        enabled: |c| c.video_chroma_noise != 0,
        apply: noise::chroma_noise,
    },
    Stage {
        name: "chroma phase noise",
        enabled: |c| c.video_chroma_phase_noise != 0,
        apply: noise::chroma_phase_noise,
    },
    Stage {
        name: "VHS emulation",
        enabled: |c| c.emulating_vhs,
        apply: vhs::emulate_vhs,
    },
    Stage {
        name: "chroma loss",
        enabled: |c| c.video_chroma_loss != 0,
        apply: noise::chroma_loss,
    },
    Stage {
        name: "output chroma lowpass",
        enabled: |c| c.composite_out_chroma_lowpass,
        apply: output_chroma_lowpass,
    },
    Stage {
        name: "color bleed (after)",
        enabled: |c| !c.color_bleed_before && has_color_bleed(c),
        apply: color_bleed,
    },
    Stage {
        name: "chroma blur",
        enabled: |_| true,
        apply: chroma_blur,
    },
];

fn has_color_bleed(config: &NtscConfig) -> bool {
    config.color_bleed_horiz != 0 || config.color_bleed_vert != 0
}

/// Blank out the right edge of the picture, where a real capture would show the start of horizontal blanking.
fn black_line_cut(ctx: &mut FieldContext) {
    let width = ctx.yiq.width;
    let cut = (width as f64 * 0.017) as usize;
    for plane in ctx.yiq.planes() {
        for row in plane.iter_mut() {
            row[width - cut..].fill(0);
        }
    }
}

/// Offset the chroma planes relative to the luma. Samples whose source lies outside the field keep their values.
///
/// The vertical offset is measured in frame rows. A field holds every other row, so it moves by half as many field
/// lines, and the leftover half row of an odd offset is dropped.
fn color_bleed(ctx: &mut FieldContext) {
    let width = ctx.yiq.width;
    let horiz = ctx.config.color_bleed_horiz;
    let vert = ctx.config.color_bleed_vert as i64 / 2;
    let copy = ctx.scratch.plane.get();

    for plane in ctx.yiq.chroma_planes() {
        let num_rows = plane.len();
        for (dst, src) in copy.chunks_exact_mut(width).zip(plane.iter()) {
            dst.copy_from_slice(src);
        }
        for (k, row) in plane.iter_mut().enumerate() {
            let src_row = k as i64 - vert;
            if src_row < 0 || src_row >= num_rows as i64 {
                continue;
            }
            let src_start = src_row as usize * width;
            shift_row_to(
                &copy[src_start..src_start + width],
                row,
                horiz,
                BoundaryHandling::Preserve,
            );
        }
    }
}

fn output_chroma_lowpass(ctx: &mut FieldContext) {
    if ctx.config.composite_out_chroma_lowpass_lite {
        composite::composite_chroma_lowpass_lite(ctx);
    } else {
        composite::composite_chroma_lowpass(ctx);
    }
}

/// Soften the chroma horizontally with a [1 2 1] kernel.
fn chroma_blur(ctx: &mut FieldContext) {
    let original = ctx.scratch.row.get();
    for plane in ctx.yiq.chroma_planes() {
        for row in plane.iter_mut() {
            let width = row.len();
            let original = &mut original[..width];
            original.copy_from_slice(row);
            for x in 1..width.saturating_sub(1) {
                row[x] = (original[x - 1] + 2 * original[x] + original[x + 1]) / 4;
            }
        }
    }
}

/// Run every enabled stage over one field, then write the field's rows out as RGB.
fn process_field(yiq: FieldView, dst_rows: &mut [&mut [u8]], config: &NtscConfig, seed: u32) {
    let field = yiq.field;
    let scratch = Scratch::new(yiq.width, yiq.num_rows());
    let mut ctx = FieldContext {
        yiq,
        config,
        rng: XorWowRandom::with_seed(seed),
        scratch,
    };

    let timing = log::log_enabled!(log::Level::Trace);
    for stage in PIPELINE.iter() {
        if !(stage.enabled)(config) {
            continue;
        }
        if timing {
            let start = Instant::now();
            (stage.apply)(&mut ctx);
            trace!("field {field}: {} took {:?}", stage.name, start.elapsed());
        } else {
            (stage.apply)(&mut ctx);
        }
    }

    ctx.yiq.write_rgb(dst_rows);
}

/// Applies the composite video effect to still frames.
///
/// Each call to [`NtscProcessor::process`] advances an internal generator, so consecutive frames get different noise.
/// Two processors created with the same configuration produce the same sequence of frames.
pub struct NtscProcessor {
    config: NtscConfig,
    rng: XorWowRandom,
}

impl NtscProcessor {
    pub fn new(config: NtscConfig) -> Self {
        NtscProcessor {
            config,
            rng: XorWowRandom::new(PROCESSOR_SEED),
        }
    }

    pub fn config(&self) -> &NtscConfig {
        &self.config
    }

    /// Derive the generator seeds for both fields from the configured seeds and a per-frame nonce.
    pub fn field_seeds(&self, nonce: u32) -> [u32; 2] {
        let config_seeds = [self.config.random_seed, self.config.random_seed2];
        std::array::from_fn(|field| {
            Seeder::new(config_seeds[field])
                .mix(nonce)
                .mix(field)
                .finalize::<u32>()
        })
    }

    pub fn process(&mut self, image: &RgbImage) -> RgbImage {
        let nonce = self.rng.next_u32();
        let seeds = self.field_seeds(nonce);
        self.process_with_field_seeds(image, seeds)
    }

    /// Process a frame with explicit generator seeds for the even (upper) and odd (lower) fields. The output depends
    /// only on the configuration, the image, and these seeds. Zero is an ordinary seed here and never reads the clock.
    pub fn process_with_field_seeds(&self, image: &RgbImage, seeds: [u32; 2]) -> RgbImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }
        debug!("processing {width}x{height} frame with field seeds {seeds:?}");

        let mut planes = YiqPlanes::from_rgb(image);
        let mut output = RgbImage::new(width, height);

        let mut even_rows = Vec::with_capacity(height.div_ceil(2) as usize);
        let mut odd_rows = Vec::with_capacity(height as usize / 2);
        for (y, row) in output.chunks_exact_mut(width as usize * 3).enumerate() {
            if y % 2 == 0 {
                even_rows.push(row);
            } else {
                odd_rows.push(row);
            }
        }

        let [upper, lower] = planes.fields_mut();
        let config = &self.config;
        with_thread_pool(|| {
            rayon::join(
                || process_field(upper, &mut even_rows, config, seeds[0]),
                || process_field(lower, &mut odd_rows, config, seeds[1]),
            )
        });

        output
    }
}

/// Process a single image with a fresh processor.
pub fn process_image(image: &RgbImage, config: &NtscConfig) -> RgbImage {
    NtscProcessor::new(config.clone()).process(image)
}
