use image::RgbImage;

/// Convert one RGB pixel to fixed-point YIQ. Shifts are arithmetic, so negative chroma rounds towards negative
/// infinity.
#[inline(always)]
pub fn rgb_to_yiq_pixel(rgb: [u8; 3]) -> [i32; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let y = (77 * r + 151 * g + 28 * b) >> 8;
    let i = (189 * (r - y) - 69 * (b - y)) >> 8;
    let q = (123 * (r - y) + 105 * (b - y)) >> 8;
    [y, i, q]
}

/// Convert one fixed-point YIQ sample back to RGB, clamping each channel to [0, 255].
#[inline(always)]
pub fn yiq_to_rgb_pixel(yiq: [i32; 3]) -> [u8; 3] {
    let [y, i, q] = yiq;
    let r = y + ((245 * i + 159 * q) >> 8);
    let g = y - ((70 * i + 166 * q) >> 8);
    let b = y + ((-283 * i + 436 * q) >> 8);
    [r, g, b].map(|c| c.clamp(0, 255) as u8)
}

/// Owned planar YIQ data for a full frame. The Y plane comes first in memory, then I, then Q.
#[derive(Debug, Clone)]
pub struct YiqPlanes {
    data: Box<[i32]>,
    width: usize,
    height: usize,
}

impl YiqPlanes {
    pub fn new(width: usize, height: usize) -> Self {
        YiqPlanes {
            data: vec![0i32; width * height * 3].into_boxed_slice(),
            width,
            height,
        }
    }

    pub fn from_rgb(image: &RgbImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let mut planes = Self::new(width, height);
        let num_pixels = width * height;

        let (y, iq) = planes.data.split_at_mut(num_pixels);
        let (i, q) = iq.split_at_mut(num_pixels);
        for (((pixel, y), i), q) in image
            .as_raw()
            .chunks_exact(3)
            .zip(y.iter_mut())
            .zip(i.iter_mut())
            .zip(q.iter_mut())
        {
            [*y, *i, *q] = rgb_to_yiq_pixel([pixel[0], pixel[1], pixel[2]]);
        }

        planes
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn plane(&self, index: usize) -> &[i32] {
        let num_pixels = self.width * self.height;
        &self.data[index * num_pixels..(index + 1) * num_pixels]
    }

    pub fn y(&self) -> &[i32] {
        self.plane(0)
    }

    pub fn i(&self) -> &[i32] {
        self.plane(1)
    }

    pub fn q(&self) -> &[i32] {
        self.plane(2)
    }

    /// Split the frame into its two fields. Field 0 holds the even-numbered rows and field 1 the odd-numbered ones;
    /// each view has exclusive access to its own rows of all three planes.
    pub fn fields_mut(&mut self) -> [FieldView<'_>; 2] {
        let (width, height) = (self.width, self.height);
        let mut fields = [0, 1].map(|field| FieldView {
            y: Vec::with_capacity(height.div_ceil(2)),
            i: Vec::with_capacity(height.div_ceil(2)),
            q: Vec::with_capacity(height.div_ceil(2)),
            field,
            width,
            frame_height: height,
        });
        if width == 0 || height == 0 {
            return fields;
        }

        let num_pixels = width * height;
        let (y, iq) = self.data.split_at_mut(num_pixels);
        let (i, q) = iq.split_at_mut(num_pixels);

        for (row_idx, ((y, i), q)) in y
            .chunks_exact_mut(width)
            .zip(i.chunks_exact_mut(width))
            .zip(q.chunks_exact_mut(width))
            .enumerate()
        {
            let field = &mut fields[row_idx & 1];
            field.y.push(y);
            field.i.push(i);
            field.q.push(q);
        }

        fields
    }
}

/// Mutable view of one field's rows. Row `k` of the view is row `field + 2k` of the frame.
pub struct FieldView<'a> {
    pub y: Vec<&'a mut [i32]>,
    pub i: Vec<&'a mut [i32]>,
    pub q: Vec<&'a mut [i32]>,
    /// 0 for the even rows, 1 for the odd ones.
    pub field: usize,
    pub width: usize,
    /// Height of the whole frame, not just this field.
    pub frame_height: usize,
}

impl<'a> FieldView<'a> {
    /// Number of rows belonging to this field.
    pub fn num_rows(&self) -> usize {
        self.y.len()
    }

    /// The frame row index of this field's `k`th row.
    #[inline(always)]
    pub fn frame_row(&self, k: usize) -> usize {
        self.field + 2 * k
    }

    /// Both chroma planes, for stages that treat I and Q identically.
    pub fn chroma_planes(&mut self) -> [&mut Vec<&'a mut [i32]>; 2] {
        [&mut self.i, &mut self.q]
    }

    /// All three planes.
    pub fn planes(&mut self) -> [&mut Vec<&'a mut [i32]>; 3] {
        [&mut self.y, &mut self.i, &mut self.q]
    }

    /// Convert this field's rows back to RGB. `dst_rows` holds this field's rows of the output image, in order.
    pub fn write_rgb(&self, dst_rows: &mut [&mut [u8]]) {
        for (k, dst) in dst_rows.iter_mut().enumerate() {
            let (y, i, q) = (&self.y[k], &self.i[k], &self.q[k]);
            for (x, pixel) in dst.chunks_exact_mut(3).enumerate() {
                pixel.copy_from_slice(&yiq_to_rgb_pixel([y[x], i[x], q[x]]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_has_no_chroma() {
        assert_eq!(rgb_to_yiq_pixel([128, 128, 128]), [128, 0, 0]);
        assert_eq!(yiq_to_rgb_pixel([128, 0, 0]), [128, 128, 128]);
    }

    #[test]
    fn fixed_point_coefficients() {
        // Y = (77*255) >> 8 = 76; I = (189*179 - 69*-76) >> 8 = 152; Q = (123*179 + 105*-76) >> 8 = 54
        assert_eq!(rgb_to_yiq_pixel([255, 0, 0]), [76, 152, 54]);
    }

    #[test]
    fn negative_chroma_shifts_arithmetically() {
        let [_, i, q] = rgb_to_yiq_pixel([0, 0, 255]);
        // (189 * -27 - 69 * 228) >> 8 = -20835 >> 8 = -82
        assert_eq!(i, -82);
        // (123 * -27 + 105 * 228) >> 8 = 20619 >> 8 = 80
        assert_eq!(q, 80);
    }

    #[test]
    fn out_of_range_yiq_clamps() {
        assert_eq!(yiq_to_rgb_pixel([1000, 0, 0]), [255, 255, 255]);
        assert_eq!(yiq_to_rgb_pixel([-1000, 0, 0]), [0, 0, 0]);
        assert_eq!(yiq_to_rgb_pixel([128, 1000, 0]), [255, 0, 0]);
    }

    #[test]
    fn fields_partition_rows() {
        let mut img = RgbImage::new(4, 5);
        for (_, y, pixel) in img.enumerate_pixels_mut() {
            let v = (y * 40) as u8;
            pixel.0 = [v, v, v];
        }
        let mut planes = YiqPlanes::from_rgb(&img);
        let [upper, lower] = planes.fields_mut();
        assert_eq!(upper.num_rows(), 3);
        assert_eq!(lower.num_rows(), 2);
        assert_eq!(lower.frame_row(1), 3);
        assert_eq!(upper.y[2][0], 160);
        assert_eq!(lower.y[0][0], 40);
    }

    #[test]
    fn empty_frame_has_empty_fields() {
        let mut planes = YiqPlanes::new(0, 3);
        let [upper, lower] = planes.fields_mut();
        assert_eq!(upper.num_rows(), 0);
        assert_eq!(lower.num_rows(), 0);
    }
}
