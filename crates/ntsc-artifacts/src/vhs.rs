use crate::{
    composite::{chroma_from_luma, chroma_into_luma, filter_rows},
    filter::{LowpassCascade, LowpassFilter},
    ntsc::{FieldContext, NTSC_RATE},
    random::XorWowRandom,
    settings::{NtscConfig, VHSTapeParams},
    shift::{BoundaryHandling, shift_row},
    yiq_fielding::FieldView,
};

/// Where the head switch lands and how far the picture is dragged sideways, worked out once per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeadSwitch {
    /// Frame row of the first affected scanline. May be negative, in which case the first rows are skipped.
    start_row: i64,
    /// Initial horizontal shift, in samples of the tape line.
    shift: i64,
}

fn head_switch_position(
    config: &NtscConfig,
    rng: &mut XorWowRandom,
    width: usize,
    field: usize,
) -> HeadSwitch {
    let tape_width = (width + width / 10) as i64;

    let mut noise = 0.0;
    if config.vhs_head_switching_phase_noise != 0.0 {
        let x = rng
            .next_i32()
            .wrapping_mul(rng.next_i32())
            .wrapping_mul(rng.next_i32())
            .wrapping_mul(rng.next_i32());
        noise = ((x % 2_000_000_000) as f64 / 1_000_000_000.0 - 1.0)
            * config.vhs_head_switching_phase_noise;
    }

    let (lines, offset) = if config.output_ntsc {
        (262.5, 44)
    } else {
        (312.5, 48)
    };
    let frame_len = tape_width as f64 * lines;

    let mut point = config.vhs_head_switching_point;
    if config.head_switching_speed != 0 {
        let frame_offset = (rng.next_i32() % 1000) as f64 / 1000.0;
        point += config.head_switching_speed as f64 / 1000.0 * frame_offset;
    }

    let switch_point = (((point + noise) % 1.0) * frame_len) as i64;
    let row = (switch_point as f64 / tape_width as f64 * 2.0) as i64;
    let start_row = (row & !1) + field as i64 - offset;

    let phase_point = (((config.vhs_head_switching_phase + noise) % 1.0) * frame_len) as i64;
    // Truncating remainder: a negative phase gives a negative shift, which reads the tape line from its end.
    let x = phase_point % tape_width;
    let shift = if x < tape_width / 2 { x } else { x - tape_width / 2 };

    HeadSwitch { start_row, shift }
}

/// Read `row` circularly out of a tape line `tape.len()` samples wide, starting `shift` samples in. The part of the
/// tape line past the end of the row is blank.
fn head_switch_row(row: &mut [i32], tape: &mut [i32], shift: i64) {
    let tape_width = tape.len();
    tape[..row.len()].copy_from_slice(row);
    tape[row.len()..].fill(0);
    let mut x = (tape_width as i64 + shift).rem_euclid(tape_width as i64) as usize;
    for sample in row.iter_mut() {
        *sample = tape[x];
        x = (x + 1) % tape_width;
    }
}

/// Emulate VHS head-switching noise at the bottom of the field.
pub(crate) fn head_switching(ctx: &mut FieldContext) {
    let width = ctx.yiq.width;
    if width == 0 {
        return;
    }
    let field = ctx.yiq.field;
    let frame_height = ctx.yiq.frame_height as i64;
    let HeadSwitch { start_row, shift: initial_shift } =
        head_switch_position(ctx.config, &mut ctx.rng, width, field);

    let mut tape = vec![0; width + width / 10];
    let mut shift = 0;
    let mut first = true;
    let mut y = start_row;
    while y < frame_height {
        if y >= 0 && shift != 0 {
            let k = (y as usize - field) / 2;
            head_switch_row(&mut ctx.yiq.y[k], &mut tape, shift);
        }
        if first {
            shift = initial_shift;
            first = false;
        } else {
            shift = shift * 7 / 8;
        }
        y += 2;
    }
}

/// Shift each row of the field horizontally by a smoothed random amount.
fn edge_wave(
    yiq: &mut FieldView,
    rng: &mut XorWowRandom,
    amount: i32,
    params: &VHSTapeParams,
    scratch: &mut [i32],
) {
    let mut filter = LowpassFilter::new(NTSC_RATE, params.luma_cut, 0.0);
    let shifts: Vec<i32> = (0..yiq.num_rows())
        .map(|_| filter.lowpass(rng.next_i32().wrapping_rem(amount) as f64) as i32)
        .collect();

    for plane in yiq.planes() {
        for (row, shift) in plane.iter_mut().zip(shifts.iter()) {
            shift_row(row, scratch, *shift, BoundaryHandling::Extend);
        }
    }
}

/// Band-limit the luma the way the tape does, then boost the high end back up a bit.
fn luma_lowpass(
    yiq: &mut FieldView,
    params: &VHSTapeParams,
    samples: &mut [f64],
    highpass: &mut [f64],
) {
    let mut cascade = LowpassCascade::new(NTSC_RATE, params.luma_cut, 16.0);
    let mut pre = LowpassFilter::new(NTSC_RATE, params.luma_cut, 16.0);
    for row in yiq.y.iter_mut() {
        let width = row.len();
        let (samples, highpass) = (&mut samples[..width], &mut highpass[..width]);
        for (s, v) in samples.iter_mut().zip(row.iter()) {
            *s = *v as f64;
        }
        cascade.filter_in_place(samples);
        pre.highpass_into(samples, highpass);
        for ((dst, s), h) in row.iter_mut().zip(samples.iter()).zip(highpass.iter()) {
            *dst = (s + h * 1.6) as i32;
        }
    }
}

fn chroma_lowpass(yiq: &mut FieldView, params: &VHSTapeParams, samples: &mut [f64]) {
    for plane in yiq.chroma_planes() {
        let mut cascade = LowpassCascade::new(NTSC_RATE, params.chroma_cut, 0.0);
        filter_rows(plane, &mut cascade, params.chroma_delay, samples);
    }
}

/// Vertically blend each chroma scanline with the (already blended) one above it.
fn chroma_vert_blend(yiq: &mut FieldView) {
    for plane in yiq.chroma_planes() {
        for k in 1..plane.len() {
            let (above, below) = plane.split_at_mut(k);
            let prev = &above[k - 1];
            for (cur, prev) in below[0].iter_mut().zip(prev.iter()) {
                *cur = (*prev + *cur + 1) >> 1;
            }
        }
    }
}

fn sharpen(yiq: &mut FieldView, params: &VHSTapeParams, amount: f64, samples: &mut [f64]) {
    for row in yiq.y.iter_mut() {
        let mut cascade = LowpassCascade::new(NTSC_RATE, params.luma_cut * 4.0, 0.0);
        let samples = &mut samples[..row.len()];
        for (s, v) in samples.iter_mut().zip(row.iter()) {
            *s = *v as f64;
        }
        cascade.filter_in_place(samples);
        for (dst, lowpassed) in row.iter_mut().zip(samples.iter()) {
            let s = *dst as f64;
            *dst = (s + (s - lowpassed) * amount * 2.0) as i32;
        }
    }
}

/// Run the whole tape-recording emulation for one field.
pub(crate) fn emulate_vhs(ctx: &mut FieldContext) {
    let config = ctx.config;
    let params = config.output_vhs_tape_speed.filter_params();

    if config.vhs_edge_wave != 0 {
        edge_wave(
            &mut ctx.yiq,
            &mut ctx.rng,
            config.vhs_edge_wave,
            &params,
            ctx.scratch.row.get(),
        );
    }

    luma_lowpass(&mut ctx.yiq, &params, ctx.scratch.samples.get(), ctx.scratch.aux.get());
    chroma_lowpass(&mut ctx.yiq, &params, ctx.scratch.samples.get());

    if config.vhs_chroma_vert_blend && config.output_ntsc {
        chroma_vert_blend(&mut ctx.yiq);
    }

    sharpen(&mut ctx.yiq, &params, config.vhs_out_sharpen, ctx.scratch.samples.get());

    if !config.vhs_svideo_out {
        chroma_into_luma(
            &mut ctx.yiq,
            config.video_scanline_phase_shift,
            config.video_scanline_phase_shift_offset,
            config.subcarrier_amplitude,
        );
        chroma_from_luma(
            &mut ctx.yiq,
            config.video_scanline_phase_shift,
            config.video_scanline_phase_shift_offset,
            config.subcarrier_amplitude,
            ctx.scratch.row.get(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{settings::VHSTapeSpeed, yiq_fielding::YiqPlanes};

    fn planes_with(width: usize, height: usize, f: impl Fn(usize, usize) -> [i32; 3]) -> YiqPlanes {
        let mut planes = YiqPlanes::new(width, height);
        let [mut upper, mut lower] = planes.fields_mut();
        for field in [&mut upper, &mut lower] {
            for k in 0..field.num_rows() {
                let y = field.frame_row(k);
                for x in 0..width {
                    let [a, b, c] = f(x, y);
                    field.y[k][x] = a;
                    field.i[k][x] = b;
                    field.q[k][x] = c;
                }
            }
        }
        planes
    }

    #[test]
    fn head_switch_row_wraps_through_blank_tape() {
        let mut row = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let mut tape = [0; 11];
        head_switch_row(&mut row, &mut tape, 3);
        assert_eq!(row, [4, 5, 6, 7, 8, 9, 10, 0, 1, 2]);

        let mut row = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        head_switch_row(&mut row, &mut tape, -2);
        assert_eq!(row, [10, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn head_switch_position_respects_field_parity() {
        let config = NtscConfig::default();
        for field in [0, 1] {
            let mut rng = XorWowRandom::new(99);
            let switch = head_switch_position(&config, &mut rng, 640, field);
            assert_eq!(switch.start_row.rem_euclid(2), field as i64);
            assert!(switch.shift >= 0 && switch.shift < 352);
        }
    }

    #[test]
    fn head_switch_without_noise_draws_nothing() {
        let mut config = NtscConfig::default();
        config.vhs_head_switching_phase_noise = 0.0;
        let mut rng = XorWowRandom::new(5);
        let before = rng.clone();
        let switch = head_switch_position(&config, &mut rng, 100, 0);
        assert_eq!(rng, before);
        // 1 - 4.51/262.5 of a 110 * 262.5 sample frame lands on row 515, forced even, minus the 44-line offset.
        assert_eq!(switch.start_row, 470);
    }

    #[test]
    fn head_switch_shift_follows_phase_sign() {
        let mut config = NtscConfig::default();
        config.vhs_head_switching_phase_noise = 0.0;
        let mut rng = XorWowRandom::new(5);

        // 0.99 / 262.5 of a 110 * 262.5 sample frame is sample 108, past half the tape width of 55.
        let switch = head_switch_position(&config, &mut rng, 100, 0);
        assert_eq!(switch.shift, 53);

        // -0.001 of the frame is sample -28, which stays negative.
        config.vhs_head_switching_phase = -0.001;
        let switch = head_switch_position(&config, &mut rng, 100, 0);
        assert_eq!(switch.shift, -28);
    }

    #[test]
    fn vert_blend_uses_blended_row_above() {
        let mut planes = planes_with(2, 6, |_, y| [0, (y as i32) * 10, 0]);
        let [mut upper, _] = planes.fields_mut();
        chroma_vert_blend(&mut upper);
        // Field rows carry 0, 20, 40; the second becomes (0 + 20 + 1) >> 1 = 10, the third (10 + 40 + 1) >> 1 = 25.
        assert_eq!(upper.i[0], &[0, 0]);
        assert_eq!(upper.i[1], &[10, 10]);
        assert_eq!(upper.i[2], &[25, 25]);
    }

    #[test]
    fn edge_wave_keeps_rows_in_place_for_tiny_amount() {
        let mut planes = planes_with(8, 4, |x, _| [x as i32, 0, 0]);
        let [mut upper, _] = planes.fields_mut();
        let mut rng = XorWowRandom::new(1);
        let mut scratch = [0; 8];
        // Any draw modulo 1 is 0.
        edge_wave(&mut upper, &mut rng, 1, &VHSTapeSpeed::SP.filter_params(), &mut scratch);
        assert_eq!(upper.y[0], &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn sharpen_with_zero_amount_is_identity() {
        let mut planes = planes_with(64, 2, |_, _| [100, 0, 0]);
        let [mut upper, _] = planes.fields_mut();
        let mut samples = [0.0; 64];
        sharpen(&mut upper, &VHSTapeSpeed::SP.filter_params(), 0.0, &mut samples);
        assert!(upper.y[0].iter().all(|v| *v == 100));
    }
}
