#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryHandling {
    /// Repeat the boundary sample over and over.
    Extend,
    /// Leave destination samples with no source untouched.
    Preserve,
}

/// Shift `src` right by `shift` samples (left if negative), writing into `dst`. Both must be the same length.
pub fn shift_row_to(src: &[i32], dst: &mut [i32], shift: i32, boundary_handling: BoundaryHandling) {
    let width = src.len();
    if width == 0 {
        return;
    }

    for (x, out) in dst.iter_mut().enumerate() {
        let src_x = x as i64 - shift as i64;
        if src_x >= 0 && (src_x as usize) < width {
            *out = src[src_x as usize];
            continue;
        }
        match boundary_handling {
            BoundaryHandling::Extend => {
                *out = if src_x < 0 { src[0] } else { src[width - 1] };
            }
            BoundaryHandling::Preserve => {}
        }
    }
}

/// Shift a row in place, using `scratch` (at least as long as the row) to hold the original samples.
pub fn shift_row(
    row: &mut [i32],
    scratch: &mut [i32],
    shift: i32,
    boundary_handling: BoundaryHandling,
) {
    if shift == 0 {
        return;
    }
    let scratch = &mut scratch[..row.len()];
    scratch.copy_from_slice(row);
    shift_row_to(scratch, row, shift, boundary_handling);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_repeats_edges() {
        let src = [1, 2, 3, 4, 5];
        let mut dst = [0; 5];
        shift_row_to(&src, &mut dst, 2, BoundaryHandling::Extend);
        assert_eq!(dst, [1, 1, 1, 2, 3]);
        shift_row_to(&src, &mut dst, -2, BoundaryHandling::Extend);
        assert_eq!(dst, [3, 4, 5, 5, 5]);
    }

    #[test]
    fn preserve_leaves_destination() {
        let src = [1, 2, 3, 4];
        let mut dst = [9; 4];
        shift_row_to(&src, &mut dst, -3, BoundaryHandling::Preserve);
        assert_eq!(dst, [4, 9, 9, 9]);
    }

    #[test]
    fn shift_past_width() {
        let mut row = [1, 2, 3];
        let mut scratch = [0; 8];
        shift_row(&mut row, &mut scratch, 10, BoundaryHandling::Extend);
        assert_eq!(row, [1, 1, 1]);
    }
}
