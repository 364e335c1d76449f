//! Grayscale codec: raster bytes in, intensity matrix out, and back to PNG.
//!
//! Colour is collapsed with the ITU-R 601 luma weights. Encoding clamps each
//! intensity into `0..=255` and always produces an 8-bit grayscale PNG.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use {
    image::{GrayImage, ImageFormat, ImageReader},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    matrix::{Matrix, Pixel},
};

/// Weights applied to R, G and B.
pub const LUMA_WEIGHTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// Suffix appended to the file stem of a transformed image.
pub const FILTERED_SUFFIX: &str = "_filtered";

/// Decode PNG/JPEG/WebP bytes into a grayscale intensity matrix.
pub fn decode_grayscale(data: &[u8]) -> Result<Matrix> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::external("failed to guess image format", e))?
        .decode()
        .map_err(|e| Error::external("failed to decode image", e))?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!(width, height, "decoded image to grayscale");
    let pixels = rgb.pixels().map(|p| luma(p.0)).collect();
    Matrix::new(height as usize, width as usize, pixels)
}

fn luma([r, g, b]: [u8; 3]) -> Pixel {
    let [wr, wg, wb] = LUMA_WEIGHTS;
    (wr * f64::from(r) + wg * f64::from(g) + wb * f64::from(b)).round() as Pixel
}

/// Encode a matrix as an 8-bit grayscale PNG.
pub fn encode_png(matrix: &Matrix) -> Result<Vec<u8>> {
    if matrix.is_empty() {
        return Err(Error::EmptyImage);
    }
    let width = u32::try_from(matrix.width())
        .map_err(|_| Error::invalid_input("image is too wide to encode"))?;
    let height = u32::try_from(matrix.height())
        .map_err(|_| Error::invalid_input("image is too tall to encode"))?;
    let buf = matrix
        .pixels()
        .iter()
        .map(|&p| p.clamp(0, 255) as u8)
        .collect();
    let img = GrayImage::from_raw(width, height, buf)
        .ok_or_else(|| Error::invalid_input("pixel buffer does not match image dimensions"))?;

    let mut output = Cursor::new(Vec::new());
    img.write_to(&mut output, ImageFormat::Png)
        .map_err(|e| Error::external("failed to encode PNG", e))?;
    Ok(output.into_inner())
}

/// `photos/file_3.jpg` -> `photos/file_3_filtered.png`.
pub fn filtered_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    path.with_file_name(format!("{stem}{FILTERED_SUFFIX}.png"))
}
