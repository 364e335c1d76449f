//! Dense row-major intensity matrix and the pure transforms over it.
//!
//! Intensities are signed so intermediate results (differences, sums) can
//! leave the 0..=255 range; the codec clamps when encoding.

use rand::Rng;

use crate::{
    error::{Error, Result},
    params::{ConcatLayout, RotationAngle, RotationDirection},
};

pub type Pixel = i32;

/// Segment threshold: strictly brighter pixels become white.
pub const SEGMENT_THRESHOLD: Pixel = 100;

pub const WHITE: Pixel = 255;
pub const BLACK: Pixel = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    height: usize,
    width: usize,
    data: Vec<Pixel>,
}

impl Matrix {
    pub fn new(height: usize, width: usize, data: Vec<Pixel>) -> Result<Self> {
        if height.checked_mul(width) != Some(data.len()) {
            return Err(Error::invalid_input(format!(
                "{} pixels do not fill a {height}x{width} matrix",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn filled(height: usize, width: usize, value: Pixel) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows<R: AsRef<[Pixel]>>(rows: &[R]) -> Result<Self> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Error::invalid_input(format!(
                    "row {i} has {} pixels, expected {width}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            height: rows.len(),
            width,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Pixel> {
        (row < self.height && col < self.width).then(|| self.data[row * self.width + col])
    }

    pub fn row(&self, row: usize) -> Option<&[Pixel]> {
        (row < self.height).then(|| &self.data[row * self.width..(row + 1) * self.width])
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[Pixel]> + '_ {
        (0..self.height).map(move |r| &self.data[r * self.width..(r + 1) * self.width])
    }

    pub fn to_rows(&self) -> Vec<Vec<Pixel>> {
        self.rows().map(<[Pixel]>::to_vec).collect()
    }

    pub fn map(&self, f: impl Fn(Pixel) -> Pixel) -> Self {
        Self {
            height: self.height,
            width: self.width,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.width {
            data.extend((0..self.height).map(|r| self.data[r * self.width + c]));
        }
        Self {
            height: self.width,
            width: self.height,
            data,
        }
    }

    fn reverse_each_row(mut self) -> Self {
        if self.width > 0 {
            for row in self.data.chunks_exact_mut(self.width) {
                row.reverse();
            }
        }
        self
    }

    fn reverse_row_order(self) -> Self {
        let data = self.rows().rev().flatten().copied().collect();
        Self { data, ..self }
    }

    /// One clockwise quarter turn: transpose, then reverse each row.
    pub fn rotate_clockwise(&self) -> Self {
        self.transpose().reverse_each_row()
    }

    /// One anti-clockwise quarter turn: transpose, then reverse the row order.
    pub fn rotate_anti_clockwise(&self) -> Self {
        self.transpose().reverse_row_order()
    }

    /// Join two matrices side by side, `self` on the left.
    pub fn hconcat(&self, other: &Matrix) -> Result<Self> {
        if self.height != other.height {
            return Err(Error::DimensionMismatch {
                left: self.height,
                right: other.height,
            });
        }
        let width = self.width + other.width;
        let mut data = Vec::with_capacity(self.height * width);
        for (left, right) in self.rows().zip(other.rows()) {
            data.extend_from_slice(left);
            data.extend_from_slice(right);
        }
        Ok(Self {
            height: self.height,
            width,
            data,
        })
    }

    // ── Transforms ──────────────────────────────────────────────────────────

    /// Box filter over a `level x level` window, stride 1, no padding.
    ///
    /// The output is `(H - level + 1) x (W - level + 1)`, or empty when the
    /// window does not fit. Window sums come from a summed-area table and are
    /// floor-divided by `level²`.
    pub fn box_blur(&self, level: usize) -> Self {
        if level == 0 || level > self.height || level > self.width {
            return Self::empty();
        }
        let stride = self.width + 1;
        let mut integral = vec![0i64; (self.height + 1) * stride];
        for r in 0..self.height {
            let mut row_sum = 0i64;
            for c in 0..self.width {
                row_sum += i64::from(self.data[r * self.width + c]);
                integral[(r + 1) * stride + c + 1] = integral[r * stride + c + 1] + row_sum;
            }
        }

        let out_h = self.height - level + 1;
        let out_w = self.width - level + 1;
        let area = (level * level) as i64;
        let mut data = Vec::with_capacity(out_h * out_w);
        for r in 0..out_h {
            for c in 0..out_w {
                let (r2, c2) = (r + level, c + level);
                let sum = integral[r2 * stride + c2] - integral[r * stride + c2]
                    - integral[r2 * stride + c]
                    + integral[r * stride + c];
                data.push(sum.div_euclid(area) as Pixel);
            }
        }
        Self {
            height: out_h,
            width: out_w,
            data,
        }
    }

    /// Absolute difference of horizontal neighbours, row by row. Each row
    /// loses one element.
    pub fn contour(&self) -> Self {
        let width = self.width.saturating_sub(1);
        let data = self
            .rows()
            .flat_map(|row| row.windows(2).map(|w| (w[1] - w[0]).abs()))
            .collect();
        Self {
            height: self.height,
            width,
            data,
        }
    }

    pub fn rotate(&self, direction: RotationDirection, angle: RotationAngle) -> Self {
        let mut out = self.clone();
        for _ in 0..angle.quarter_turns() {
            out = match direction {
                RotationDirection::Clockwise => out.rotate_clockwise(),
                RotationDirection::AntiClockwise => out.rotate_anti_clockwise(),
            };
        }
        out
    }

    /// Perform `floor(len * noise_level)` independent writes of white or
    /// black at uniformly random positions (with replacement). Returns the
    /// number of writes.
    pub fn sprinkle_salt_and_pepper<R: Rng + ?Sized>(
        &mut self,
        noise_level: f64,
        rng: &mut R,
    ) -> usize {
        if self.is_empty() {
            return 0;
        }
        let writes = (self.data.len() as f64 * noise_level).floor() as usize;
        for _ in 0..writes {
            let row = rng.random_range(0..self.height);
            let col = rng.random_range(0..self.width);
            self.data[row * self.width + col] = if rng.random::<f64>() < 0.5 {
                WHITE
            } else {
                BLACK
            };
        }
        writes
    }

    /// Concatenate according to an already validated layout.
    ///
    /// Vertical joins rotate both operands clockwise, join rows, then rotate
    /// the result back anti-clockwise.
    pub fn concat(&self, other: &Matrix, layout: ConcatLayout) -> Result<Self> {
        let join = |a: &Matrix, b: &Matrix| {
            if layout.self_first() {
                a.hconcat(b)
            } else {
                b.hconcat(a).map_err(|e| match e {
                    Error::DimensionMismatch { left, right } => Error::DimensionMismatch {
                        left: right,
                        right: left,
                    },
                    other => other,
                })
            }
        };
        if layout.is_vertical() {
            let joined = join(&self.rotate_clockwise(), &other.rotate_clockwise())?;
            Ok(joined.rotate_anti_clockwise())
        } else {
            join(self, other)
        }
    }

    pub fn segment(&self) -> Self {
        self.map(|p| if p > SEGMENT_THRESHOLD { WHITE } else { BLACK })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::params::{ConcatDirection, ConcatSides},
        rand::{SeedableRng, rngs::StdRng},
        rstest::rstest,
    };

    fn sample() -> Matrix {
        Matrix::from_rows(&[[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]]).unwrap()
    }

    fn gradient(height: usize, width: usize) -> Matrix {
        let data = (0..height * width).map(|i| (i * 7 % 256) as Pixel).collect();
        Matrix::new(height, width, data).unwrap()
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows: Vec<Vec<Pixel>> = vec![vec![1, 2], vec![3]];
        assert!(Matrix::from_rows(&rows).is_err());
        assert!(Matrix::new(2, 2, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn clockwise_quarter_turn() {
        assert_eq!(
            sample().rotate_clockwise().to_rows(),
            vec![vec![10, 7, 4, 1], vec![11, 8, 5, 2], vec![12, 9, 6, 3]]
        );
    }

    #[test]
    fn anti_clockwise_quarter_turn() {
        assert_eq!(
            sample().rotate_anti_clockwise().to_rows(),
            vec![vec![3, 6, 9, 12], vec![2, 5, 8, 11], vec![1, 4, 7, 10]]
        );
    }

    #[rstest]
    #[case(RotationDirection::Clockwise)]
    #[case(RotationDirection::AntiClockwise)]
    fn four_quarter_turns_restore_the_original(#[case] direction: RotationDirection) {
        let original = gradient(5, 3);
        let mut m = original.clone();
        for _ in 0..4 {
            m = m.rotate(direction, RotationAngle::Deg90);
        }
        assert_eq!(m, original);
    }

    #[test]
    fn half_turn_anti_clockwise() {
        let rotated = sample().rotate(RotationDirection::AntiClockwise, RotationAngle::Deg180);
        assert_eq!(
            rotated.to_rows(),
            vec![vec![12, 11, 10], vec![9, 8, 7], vec![6, 5, 4], vec![3, 2, 1]]
        );
    }

    #[test]
    fn three_quarter_clockwise_equals_one_anti_clockwise() {
        let m = gradient(3, 4);
        assert_eq!(
            m.rotate(RotationDirection::Clockwise, RotationAngle::Deg270),
            m.rotate_anti_clockwise()
        );
    }

    #[rstest]
    #[case(6, 8, 1)]
    #[case(6, 8, 3)]
    #[case(6, 8, 6)]
    #[case(16, 20, 16)]
    fn blur_shrinks_by_window(#[case] h: usize, #[case] w: usize, #[case] level: usize) {
        let out = gradient(h, w).box_blur(level);
        assert_eq!(out.height(), h - level + 1);
        assert_eq!(out.width(), w - level + 1);
    }

    #[rstest]
    #[case(4, 9, 5)]
    #[case(9, 4, 5)]
    #[case(3, 3, 16)]
    fn blur_larger_than_image_is_empty(#[case] h: usize, #[case] w: usize, #[case] level: usize) {
        let out = gradient(h, w).box_blur(level);
        assert!(out.is_empty());
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn blur_floor_divides_window_sums() {
        let m = Matrix::from_rows(&[[1, 2, 3], [4, 5, 6]]).unwrap();
        // windows: 1+2+4+5=12 -> 3, 2+3+5+6=16 -> 4
        assert_eq!(m.box_blur(2).to_rows(), vec![vec![3, 4]]);

        let odd = Matrix::from_rows(&[[0, 1], [1, 1]]).unwrap();
        assert_eq!(odd.box_blur(2).to_rows(), vec![vec![0]]);
    }

    #[test]
    fn blur_level_one_is_identity() {
        let m = gradient(4, 4);
        assert_eq!(m.box_blur(1), m);
    }

    #[test]
    fn contour_takes_absolute_neighbour_differences() {
        let m = Matrix::from_rows(&[[10, 4, 4, 9], [0, 255, 0, 1]]).unwrap();
        let out = m.contour();
        assert_eq!(out.to_rows(), vec![vec![6, 0, 5], vec![255, 255, 1]]);
        assert!(out.rows().all(|row| row.len() == m.width() - 1));
    }

    #[test]
    fn contour_of_single_column_keeps_rows_empty() {
        let m = Matrix::from_rows(&[[3], [4]]).unwrap();
        let out = m.contour();
        assert_eq!(out.height(), 2);
        assert_eq!(out.width(), 0);
    }

    #[test]
    fn segment_thresholds_strictly_above_100() {
        let m = Matrix::from_rows(&[[0, 100, 101], [255, 99, -4]]).unwrap();
        let out = m.segment();
        assert_eq!(out.to_rows(), vec![vec![0, 0, 255], vec![255, 0, 0]]);
        assert!(out.pixels().iter().all(|&p| p == WHITE || p == BLACK));
    }

    #[test]
    fn zero_noise_leaves_matrix_untouched() {
        let original = gradient(6, 6);
        let mut m = original.clone();
        let writes = m.sprinkle_salt_and_pepper(0.0, &mut StdRng::seed_from_u64(7));
        assert_eq!(writes, 0);
        assert_eq!(m, original);
    }

    #[test]
    fn full_noise_performs_one_write_per_pixel() {
        let mut m = Matrix::filled(5, 4, 128);
        let writes = m.sprinkle_salt_and_pepper(1.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(writes, 20);
        let changed = m.pixels().iter().filter(|&&p| p != 128).count();
        assert!(changed <= 20);
        assert!(changed > 0);
        assert!(
            m.pixels()
                .iter()
                .all(|&p| p == 128 || p == WHITE || p == BLACK)
        );
    }

    #[test]
    fn noise_above_one_writes_with_replacement() {
        let mut m = Matrix::filled(3, 4, 128);
        let writes = m.sprinkle_salt_and_pepper(2.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(writes, 24);
        assert!(m.pixels().iter().all(|&p| p == 128 || p == WHITE || p == BLACK));
    }

    #[test]
    fn rows_iterate_from_both_ends() {
        let m = Matrix::from_rows(&[[1, 2], [3, 4], [5, 6]]).unwrap();
        let last_first: Vec<&[Pixel]> = m.rows().rev().collect();
        assert_eq!(last_first, vec![&[5, 6][..], &[3, 4][..], &[1, 2][..]]);
    }

    #[test]
    fn noise_write_count_is_floored() {
        let mut m = Matrix::filled(3, 3, 50);
        let writes = m.sprinkle_salt_and_pepper(0.25, &mut StdRng::seed_from_u64(1));
        assert_eq!(writes, 2);
    }

    fn layout(direction: ConcatDirection, sides: ConcatSides) -> ConcatLayout {
        ConcatLayout::resolve(direction, sides).unwrap()
    }

    #[test]
    fn horizontal_right_to_left_puts_self_on_the_left() {
        let a = Matrix::from_rows(&[[1, 2], [3, 4]]).unwrap();
        let b = Matrix::from_rows(&[[9], [8]]).unwrap();
        let out = a
            .concat(
                &b,
                layout(ConcatDirection::Horizontal, ConcatSides::RightToLeft),
            )
            .unwrap();
        assert_eq!(out.to_rows(), vec![vec![1, 2, 9], vec![3, 4, 8]]);

        let out = a
            .concat(
                &b,
                layout(ConcatDirection::Horizontal, ConcatSides::LeftToRight),
            )
            .unwrap();
        assert_eq!(out.to_rows(), vec![vec![9, 1, 2], vec![8, 3, 4]]);
    }

    #[test]
    fn vertical_concat_goes_through_rotation() {
        let a = Matrix::from_rows(&[[1, 2], [3, 4]]).unwrap();
        let b = Matrix::from_rows(&[[5, 6]]).unwrap();

        let top_to_bottom = a
            .concat(
                &b,
                layout(ConcatDirection::Vertical, ConcatSides::TopToBottom),
            )
            .unwrap();
        assert_eq!(
            top_to_bottom.to_rows(),
            vec![vec![5, 6], vec![1, 2], vec![3, 4]]
        );

        let bottom_to_top = a
            .concat(
                &b,
                layout(ConcatDirection::Vertical, ConcatSides::BottomToTop),
            )
            .unwrap();
        assert_eq!(
            bottom_to_top.to_rows(),
            vec![vec![1, 2], vec![3, 4], vec![5, 6]]
        );
    }

    #[test]
    fn horizontal_height_mismatch_is_reported() {
        let a = Matrix::filled(2, 2, 0);
        let b = Matrix::filled(3, 2, 0);
        let err = a
            .concat(
                &b,
                layout(ConcatDirection::Horizontal, ConcatSides::RightToLeft),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { left: 2, right: 3 }));
    }

    #[test]
    fn vertical_width_mismatch_is_reported() {
        let a = Matrix::filled(2, 2, 0);
        let b = Matrix::filled(2, 5, 0);
        let err = a
            .concat(
                &b,
                layout(ConcatDirection::Vertical, ConcatSides::BottomToTop),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { left: 2, right: 5 }));
    }
}
