use crate::{
    filter::{LowpassCascade, LowpassFilter},
    ntsc::{FieldContext, NTSC_RATE},
    settings::PhaseShift,
    yiq_fielding::FieldView,
};

const I_MULT: [i32; 4] = [1, 0, -1, 0];
const Q_MULT: [i32; 4] = [0, 1, 0, -1];

/// Calculate the chroma subcarrier phase for a given row/field.
pub fn chroma_phase_offset(
    scanline_phase_shift: PhaseShift,
    offset: i32,
    field: usize,
    line_num: usize,
) -> usize {
    let (field, line_num) = (field as i32, line_num as i32);
    (match scanline_phase_shift {
        PhaseShift::Degrees90 => field + offset + (line_num >> 1),
        PhaseShift::Degrees180 => ((field + line_num) & 2) + offset,
        PhaseShift::Degrees270 => field + offset,
        PhaseShift::Degrees0 => offset,
    } & 3) as usize
}

fn chroma_into_luma_line(
    y: &mut [i32],
    i: &mut [i32],
    q: &mut [i32],
    xi: usize,
    subcarrier_amplitude: i32,
) {
    for (index, ((y, i), q)) in y.iter_mut().zip(i.iter_mut()).zip(q.iter_mut()).enumerate() {
        let phase = (index + xi) & 3;
        let chroma =
            *i * subcarrier_amplitude * I_MULT[phase] + *q * subcarrier_amplitude * Q_MULT[phase];
        *y += chroma / 50;
        *i = 0;
        *q = 0;
    }
}

/// Modulate the chrominance signal (I and Q planes) into the Y (luminance) plane, leaving the chroma planes empty.
pub fn chroma_into_luma(
    yiq: &mut FieldView,
    phase_shift: PhaseShift,
    phase_offset: i32,
    subcarrier_amplitude: i32,
) {
    let field = yiq.field;
    let rows = yiq.y.iter_mut().zip(yiq.i.iter_mut()).zip(yiq.q.iter_mut());
    for (k, ((y, i), q)) in rows.enumerate() {
        let xi = chroma_phase_offset(phase_shift, phase_offset, field, field + 2 * k);
        chroma_into_luma_line(y, i, q, xi, subcarrier_amplitude);
    }
}

/// Demodulate one row. `chroma` is scratch space at least as long as the row.
fn chroma_from_luma_line(
    y: &mut [i32],
    i: &mut [i32],
    q: &mut [i32],
    chroma: &mut [i32],
    xi: usize,
    subcarrier_amplitude: i32,
) {
    let width = y.len();
    let chroma = &mut chroma[..width];

    // Four-tap box filter: the running sum covers y[x-1..=x+2], so luma is the local average and whatever remains of
    // y[x+2] is the modulated chroma.
    let mut acc = y.first().copied().unwrap_or(0) + y.get(1).copied().unwrap_or(0);
    let (mut prev2, mut prev1) = (0, 0);
    for x in 0..width {
        let original = y[x];
        let ahead = if x + 2 < width { y[x + 2] } else { 0 };
        let behind = if x >= 2 { prev2 } else { 0 };
        acc += ahead - behind;
        let luma = acc / 4;
        chroma[x] = ahead - luma;
        y[x] = luma;
        prev2 = prev1;
        prev1 = original;
    }

    let start = (4 - xi) & 3;
    for x in (start + 2..width).step_by(4) {
        chroma[x] = -chroma[x];
    }
    for x in (start + 3..width).step_by(4) {
        chroma[x] = -chroma[x];
    }

    for c in chroma.iter_mut() {
        *c = if subcarrier_amplitude != 0 {
            *c * 50 / subcarrier_amplitude
        } else {
            0
        };
    }

    i.fill(0);
    q.fill(0);
    for (dst, src) in (0..width).step_by(2).zip((xi..width).step_by(2)) {
        i[dst] = -chroma[src];
    }
    for (dst, src) in (0..width).step_by(2).zip((xi + 1..width).step_by(2)) {
        q[dst] = -chroma[src];
    }

    // Fill in the odd samples by averaging their neighbors.
    for x in (1..width.saturating_sub(2)).step_by(2) {
        i[x] = (i[x - 1] + i[x + 1]) >> 1;
        q[x] = (q[x - 1] + q[x + 1]) >> 1;
    }
    for x in width.saturating_sub(2)..width {
        i[x] = 0;
        q[x] = 0;
    }
}

/// Demodulate the chroma back out of the luma plane.
pub fn chroma_from_luma(
    yiq: &mut FieldView,
    phase_shift: PhaseShift,
    phase_offset: i32,
    subcarrier_amplitude: i32,
    scratch: &mut [i32],
) {
    let field = yiq.field;
    let rows = yiq.y.iter_mut().zip(yiq.i.iter_mut()).zip(yiq.q.iter_mut());
    for (k, ((y, i), q)) in rows.enumerate() {
        let xi = chroma_phase_offset(phase_shift, phase_offset, field, field + 2 * k);
        chroma_from_luma_line(y, i, q, scratch, xi, subcarrier_amplitude);
    }
}

/// Run a lowpass cascade over each row in turn, carrying the filter state from row to row, and write the output back
/// shifted left by `delay` samples. The last `delay` samples of each row keep their old values.
pub(crate) fn filter_rows(
    rows: &mut [&mut [i32]],
    cascade: &mut LowpassCascade,
    delay: usize,
    samples: &mut [f64],
) {
    for row in rows.iter_mut() {
        let samples = &mut samples[..row.len()];
        for (s, v) in samples.iter_mut().zip(row.iter()) {
            *s = *v as f64;
        }
        cascade.filter_in_place(samples);
        for (dst, src) in row.iter_mut().zip(samples.iter().skip(delay)) {
            *dst = *src as i32;
        }
    }
}

/// Apply a lowpass filter to the chroma, emulating broadcast NTSC's bandwidth cutoffs.
pub(crate) fn composite_chroma_lowpass(ctx: &mut FieldContext) {
    let samples = ctx.scratch.samples.get();
    let mut i_filter = LowpassCascade::new(NTSC_RATE, 1300000.0, 0.0);
    let mut q_filter = LowpassCascade::new(NTSC_RATE, 600000.0, 0.0);
    filter_rows(&mut ctx.yiq.i, &mut i_filter, 2, samples);
    filter_rows(&mut ctx.yiq.q, &mut q_filter, 4, samples);
}

/// Apply a less intense lowpass filter to the chroma.
pub(crate) fn composite_chroma_lowpass_lite(ctx: &mut FieldContext) {
    let samples = ctx.scratch.samples.get();
    for plane in ctx.yiq.chroma_planes() {
        let mut filter = LowpassCascade::new(NTSC_RATE, 2600000.0, 0.0);
        filter_rows(plane, &mut filter, 1, samples);
    }
}

pub(crate) fn chroma_into_luma_stage(ctx: &mut FieldContext) {
    let config = ctx.config;
    chroma_into_luma(
        &mut ctx.yiq,
        config.video_scanline_phase_shift,
        config.video_scanline_phase_shift_offset,
        config.subcarrier_amplitude,
    );
}

pub(crate) fn chroma_from_luma_stage(ctx: &mut FieldContext) {
    let config = ctx.config;
    chroma_from_luma(
        &mut ctx.yiq,
        config.video_scanline_phase_shift,
        config.video_scanline_phase_shift_offset,
        config.subcarrier_amplitude_back,
        ctx.scratch.row.get(),
    );
}

/// Boost the high frequencies of the composite signal. Each row gets a fresh filter.
pub(crate) fn composite_preemphasis(ctx: &mut FieldContext) {
    let preemphasis = ctx.config.composite_preemphasis;
    let cut = ctx.config.composite_preemphasis_cut;
    for row in ctx.yiq.y.iter_mut() {
        let mut filter = LowpassFilter::new(NTSC_RATE, cut, 16.0);
        for sample in row.iter_mut() {
            let s = *sample as f64;
            *sample = (s + filter.highpass(s) * preemphasis) as i32;
        }
    }
}
