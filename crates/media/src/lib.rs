//! Grayscale image model and the matrix transforms applied by chat commands:
//! blur, contour, rotate, salt-and-pepper, concat, segment.

pub mod codec;
pub mod error;
pub mod matrix;
pub mod params;
pub mod picture;

pub use {
    error::{Error, Result},
    matrix::{Matrix, Pixel},
    params::{
        BlurLevel, ConcatDirection, ConcatLayout, ConcatSides, NoiseLevel, RotationAngle,
        RotationDirection,
    },
    picture::Image,
};
