use crate::{filter::LowpassFilter, ntsc::FieldContext, random::XorWowRandom};

/// Draw a noise sample in `-amount..=amount`. Negative draws skew the result downward, which the effect relies on.
#[inline(always)]
fn centered_noise(rng: &mut XorWowRandom, amount: i32) -> i32 {
    let modulus = amount.wrapping_mul(2).wrapping_add(1);
    rng.next_i32().wrapping_rem(modulus).wrapping_sub(amount)
}

/// Add noise to the composite signal. The fast path smooths one long run of noise that spans every row of the field;
/// the precise path restarts a leaky accumulator on each row.
pub(crate) fn video_noise(ctx: &mut FieldContext) {
    let amount = ctx.config.video_noise;
    let width = ctx.yiq.width;
    let rng = &mut ctx.rng;

    if ctx.config.precise {
        for row in ctx.yiq.y.iter_mut() {
            let mut acc = 0;
            for sample in row.iter_mut() {
                *sample += acc;
                acc = (acc + centered_noise(rng, amount)) / 2;
            }
        }
        return;
    }

    // Noise is drawn for the taller of the two fields so that both consume the same number of draws.
    let total = width * ctx.yiq.frame_height.div_ceil(2);
    let mut filter = LowpassFilter::with_alpha(0.5, 0.0);
    let mut rows = ctx.yiq.y.iter_mut().flat_map(|row| row.iter_mut());
    let mut delayed = 0;
    for _ in 0..total {
        let filtered = filter.lowpass(centered_noise(rng, amount) as f64) as i32;
        if let Some(sample) = rows.next() {
            *sample += delayed;
        }
        delayed = filtered;
    }
}

/// Add noise to the I and Q planes.
pub(crate) fn chroma_noise(ctx: &mut FieldContext) {
    let amount = ctx.config.video_chroma_noise;
    let rng = &mut ctx.rng;
    let [i_plane, q_plane] = ctx.yiq.chroma_planes();

    if ctx.config.precise {
        let (mut noise_i, mut noise_q) = (0, 0);
        for (i_row, q_row) in i_plane.iter_mut().zip(q_plane.iter_mut()) {
            for (i, q) in i_row.iter_mut().zip(q_row.iter_mut()) {
                *i += noise_i;
                noise_i = (noise_i + centered_noise(rng, amount)) / 2;
                *q += noise_q;
                noise_q = (noise_q + centered_noise(rng, amount)) / 2;
            }
        }
        return;
    }

    for (i_row, q_row) in i_plane.iter_mut().zip(q_plane.iter_mut()) {
        for (i, q) in i_row.iter_mut().zip(q_row.iter_mut()) {
            *i += centered_noise(rng, amount);
            *q += centered_noise(rng, amount);
        }
    }
}

/// Rotate each row's chroma by a random-walk phase error.
pub(crate) fn chroma_phase_noise(ctx: &mut FieldContext) {
    let amount = ctx.config.video_chroma_phase_noise;
    let rng = &mut ctx.rng;
    let [i_plane, q_plane] = ctx.yiq.chroma_planes();

    let mut noise = 0;
    for (i_row, q_row) in i_plane.iter_mut().zip(q_plane.iter_mut()) {
        noise = (noise + centered_noise(rng, amount)) / 2;
        let angle = noise as f64 * std::f64::consts::PI / 100.0;
        let (sin_angle, cos_angle) = angle.sin_cos();

        for (i, q) in i_row.iter_mut().zip(q_row.iter_mut()) {
            let (u, v) = (*i as f64, *q as f64);
            *i = (u * cos_angle - v * sin_angle) as i32;
            *q = (u * sin_angle + v * cos_angle) as i32;
        }
    }
}

/// Drop out the chroma of random rows. `video_chroma_loss` is the chance per row, out of 100000.
pub(crate) fn chroma_loss(ctx: &mut FieldContext) {
    let loss = ctx.config.video_chroma_loss;
    let rng = &mut ctx.rng;
    let [i_plane, q_plane] = ctx.yiq.chroma_planes();

    for (i_row, q_row) in i_plane.iter_mut().zip(q_plane.iter_mut()) {
        if rng.next_i32() % 100000 < loss {
            i_row.fill(0);
            q_row.fill(0);
        }
    }
}
