use rand::Rng;

use crate::{
    codec,
    error::Result,
    matrix::Matrix,
    params::{BlurLevel, ConcatLayout, NoiseLevel, RotationAngle, RotationDirection},
};

/// A grayscale image being transformed.
///
/// Transforms replace the matrix in place; the pre-transform pixels are not
/// retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Opaque locator of the backing bytes (a local path for downloaded photos).
    id: String,
    matrix: Matrix,
}

impl Image {
    pub fn new(id: impl Into<String>, matrix: Matrix) -> Self {
        Self {
            id: id.into(),
            matrix,
        }
    }

    pub fn decode(id: impl Into<String>, data: &[u8]) -> Result<Self> {
        Ok(Self::new(id, codec::decode_grayscale(data)?))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        codec::encode_png(&self.matrix)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> Matrix {
        self.matrix
    }

    pub fn blur(&mut self, level: BlurLevel) {
        self.matrix = self.matrix.box_blur(level.get() as usize);
    }

    pub fn contour(&mut self) {
        self.matrix = self.matrix.contour();
    }

    pub fn rotate(&mut self, direction: RotationDirection, angle: RotationAngle) {
        self.matrix = self.matrix.rotate(direction, angle);
    }

    /// Returns the number of pixel writes performed.
    pub fn salt_and_pepper(&mut self, level: NoiseLevel) -> usize {
        self.salt_and_pepper_with(level, &mut rand::rng())
    }

    pub fn salt_and_pepper_with<R: Rng + ?Sized>(&mut self, level: NoiseLevel, rng: &mut R) -> usize {
        self.matrix.sprinkle_salt_and_pepper(level.get(), rng)
    }

    /// Join `other` onto this image. On error the image is left unchanged.
    pub fn concat(&mut self, other: &Image, layout: ConcatLayout) -> Result<()> {
        self.matrix = self.matrix.concat(&other.matrix, layout)?;
        Ok(())
    }

    pub fn segment(&mut self) {
        self.matrix = self.matrix.segment();
    }
}
