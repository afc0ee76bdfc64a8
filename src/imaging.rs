// Image preprocessing: decode an uploaded image, scale it down to the
// analysis width and stage the result as a short-lived PNG for the
// analysis client.

use crate::error::AnalysisError;
use image::imageops::FilterType;
use std::path::Path;
use tempfile::NamedTempFile;

/// Width every image is scaled to before analysis.
pub const TARGET_WIDTH: u32 = 500;

/// File extensions the upload control accepts.
pub const SUPPORTED_FORMATS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// A resized image staged on disk for one analysis call.
///
/// The PNG lives in a uniquely named temporary file that is deleted when
/// this value is dropped, so the artifact cannot outlive its request even
/// when the remote call fails. Unique names also mean two in-flight
/// requests would not collide on a shared path.
#[derive(Debug)]
pub struct PreparedImage {
    file: NamedTempFile,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Output dimensions for an image of `width` x `height`: the width is
/// fixed to [`TARGET_WIDTH`], the height keeps the aspect ratio, rounded
/// down to a whole pixel.
pub fn resize_dimensions(width: u32, height: u32) -> (u32, u32) {
    let aspect = width as f64 / height as f64;
    let new_height = (TARGET_WIDTH as f64 / aspect) as u32;
    (TARGET_WIDTH, new_height)
}

/// Decode the image at `path`, resize it and write the result to a
/// temporary PNG. Decode failures propagate; no artifact is left behind
/// on any failure path.
pub fn prepare_for_analysis(path: &Path) -> Result<PreparedImage, AnalysisError> {
    // Guess the format from the file contents rather than trusting the
    // extension of the staged copy.
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;

    let (width, height) = resize_dimensions(img.width(), img.height());
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);

    let file = tempfile::Builder::new()
        .prefix("medscan-resized-")
        .suffix(".png")
        .tempfile()?;
    resized.save(file.path())?;

    Ok(PreparedImage { file, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Write;

    fn sample_image(width: u32, height: u32) -> NamedTempFile {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        RgbImage::new(width, height).save(file.path()).unwrap();
        file
    }

    #[test]
    fn resize_fixes_width_and_floors_height() {
        assert_eq!(resize_dimensions(1000, 500), (500, 250));
        assert_eq!(resize_dimensions(500, 500), (500, 500));
        // 500 / (300/400) = 666.66.. -> 666
        assert_eq!(resize_dimensions(300, 400), (500, 666));
    }

    #[test]
    fn prepares_a_resized_png() {
        let input = sample_image(1000, 500);
        let prepared = prepare_for_analysis(input.path()).unwrap();
        assert_eq!((prepared.width, prepared.height), (500, 250));

        let written = image::open(prepared.path()).unwrap();
        assert_eq!(written.width(), 500);
        assert_eq!(written.height(), 250);
    }

    #[test]
    fn decode_failure_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"this is not an image").unwrap();
        file.flush().unwrap();

        let err = prepare_for_analysis(file.path()).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn artifact_is_removed_on_drop() {
        let input = sample_image(640, 480);
        let prepared = prepare_for_analysis(input.path()).unwrap();
        let artifact = prepared.path().to_path_buf();
        assert!(artifact.exists());

        drop(prepared);
        assert!(!artifact.exists());
    }
}
