/* Copyright 2020 @TwoCookingMice */

use std::path::Path;

use exr::prelude::write_rgb_file;

use crate::core::sample_buffer::SampleBuffer;

/// Writes row-major RGB pixels as a float OpenEXR image.
pub fn write_exr_to_file<P: AsRef<Path>>(image: &[(f32, f32, f32)],
                                         width: usize,
                                         height: usize,
                                         file_path: P) -> Result<(), exr::error::Error> {
    log::info!("Starting writing openexr images: {}.", file_path.as_ref().display());

    if image.len() != width * height {
        return Err(exr::error::Error::Invalid("pixel count does not match image size".into()));
    }
    write_rgb_file(file_path, width, height, |x, y| image[y * width + x])
}

pub fn write_sample_buffer<P: AsRef<Path>>(samples: &SampleBuffer,
                                           file_path: P) -> Result<(), exr::error::Error> {
    write_exr_to_file(&samples.raw_copy(), samples.width(), samples.height(), file_path)
}
