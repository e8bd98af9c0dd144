use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use image::{
    DynamicImage, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder, imageops::FilterType,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSettings {
    pub jpeg_quality: u8,
    /// Neither side of a resized image drops below this, unless the original already did.
    pub min_dimension: u32,
    pub scale_step: f64,
    pub max_attempts: u32,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: 85,
            min_dimension: 800,
            scale_step: 0.9,
            max_attempts: 10,
        }
    }
}

/// Result of one resize call.
///
/// `path` is the file to use next: the input itself when nothing was (or could be) done.
/// `intermediates` lists every other file written along the way; the caller removes them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeOutcome {
    pub path: PathBuf,
    pub intermediates: Vec<PathBuf>,
    pub attempts: u32,
}

impl ResizeOutcome {
    fn unchanged(input: &Path, intermediates: Vec<PathBuf>, attempts: u32) -> Self {
        Self {
            path: input.to_path_buf(),
            intermediates,
            attempts,
        }
    }

    pub fn is_resized(&self, input: &Path) -> bool {
        self.path != input
    }
}

/// Best-effort shrinking of JPEG/PNG photos to fit a byte ceiling.
#[derive(Debug, Clone)]
pub struct SizeConstrainedResizer {
    settings: ResizeSettings,
    work_dir: PathBuf,
}

impl SizeConstrainedResizer {
    pub fn new(settings: ResizeSettings, work_dir: PathBuf) -> Self {
        Self { settings, work_dir }
    }

    /// Never fails. Any I/O or codec problem falls back to the input path.
    pub fn resize(&self, input: &Path, ceiling_bytes: u64) -> ResizeOutcome {
        let original_size = match fs::metadata(input) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!(path = %input.display(), error = ?err, "image_resizer: cannot stat input");
                return ResizeOutcome::unchanged(input, Vec::new(), 0);
            }
        };

        if original_size <= ceiling_bytes {
            return ResizeOutcome::unchanged(input, Vec::new(), 0);
        }

        let mut written = Vec::new();
        let mut attempts = 0;
        match self.shrink(input, original_size, ceiling_bytes, &mut written, &mut attempts) {
            Ok(Some(path)) => {
                written.retain(|candidate| candidate != &path);
                ResizeOutcome {
                    path,
                    intermediates: written,
                    attempts,
                }
            }
            Ok(None) => ResizeOutcome::unchanged(input, written, attempts),
            Err(err) => {
                warn!(
                    path = %input.display(),
                    attempts,
                    error = ?err,
                    "image_resizer: falling back to original file"
                );
                ResizeOutcome::unchanged(input, written, attempts)
            }
        }
    }

    /// `resize` on the blocking pool; decoding and encoding are CPU bound.
    pub async fn resize_blocking(&self, input: PathBuf, ceiling_bytes: u64) -> ResizeOutcome {
        let resizer = self.clone();
        let fallback = input.clone();

        match tokio::task::spawn_blocking(move || resizer.resize(&input, ceiling_bytes)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = ?err, "image_resizer: resize task failed");
                ResizeOutcome::unchanged(&fallback, Vec::new(), 0)
            }
        }
    }

    /// `Ok(None)` means the input is not something we resize, or no attempt came out
    /// smaller than it.
    fn shrink(
        &self,
        input: &Path,
        original_size: u64,
        ceiling_bytes: u64,
        written: &mut Vec<PathBuf>,
        attempts: &mut u32,
    ) -> Result<Option<PathBuf>> {
        let reader = ImageReader::open(input)
            .with_context(|| format!("failed to open {}", input.display()))?
            .with_guessed_format()?;

        match reader.format() {
            Some(ImageFormat::Jpeg | ImageFormat::Png) => {}
            other => {
                debug!(path = %input.display(), format = ?other, "image_resizer: unsupported format");
                return Ok(None);
            }
        }

        let image = reader.decode().context("failed to decode image")?;
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Ok(None);
        }

        fs::create_dir_all(&self.work_dir).with_context(|| {
            format!("failed to create work dir {}", self.work_dir.display())
        })?;

        let mut scale = self.settings.scale_step;
        let mut smallest: Option<(PathBuf, u64)> = None;

        for _ in 0..self.settings.max_attempts {
            let (target_width, target_height) = self.target_dimensions(width, height, scale);
            let output = self.work_dir.join(format!("{}.jpg", Uuid::new_v4()));

            *attempts += 1;
            self.encode(&image, target_width, target_height, &output)?;
            written.push(output.clone());

            let size = fs::metadata(&output)?.len();
            debug!(
                attempt = *attempts,
                target_width,
                target_height,
                size,
                ceiling_bytes,
                "image_resizer: attempt encoded"
            );

            if smallest.as_ref().is_none_or(|(_, best)| size < *best) {
                smallest = Some((output, size));
            }
            if size <= ceiling_bytes {
                break;
            }
            scale *= self.settings.scale_step;
        }

        let Some((result, size)) = smallest else {
            bail!("no resize attempt was made");
        };

        if size >= original_size {
            info!(
                path = %input.display(),
                original_size,
                smallest = size,
                attempts = *attempts,
                "image_resizer: no attempt beat the original, keeping it"
            );
            return Ok(None);
        }

        info!(
            path = %input.display(),
            width,
            height,
            original_size,
            size,
            attempts = *attempts,
            "image_resizer: resize finished"
        );

        Ok(Some(result))
    }

    /// Scale both sides by `scale`, but keep the shorter side at `min_dimension` or above
    /// without ever enlarging the original.
    pub fn target_dimensions(&self, width: u32, height: u32, scale: f64) -> (u32, u32) {
        let shorter = width.min(height) as f64;
        let floor_scale = self.settings.min_dimension as f64 / shorter;
        let factor = scale.max(floor_scale).min(1.0);

        let scaled = |side: u32| ((side as f64 * factor).round() as u32).max(1);
        (scaled(width), scaled(height))
    }

    fn encode(&self, image: &DynamicImage, width: u32, height: u32, output: &Path) -> Result<()> {
        let resized = if (width, height) == (image.width(), image.height()) {
            image.to_rgb8()
        } else {
            image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
        };

        let file = File::create(output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), self.settings.jpeg_quality);
        resized
            .write_with_encoder(encoder)
            .with_context(|| format!("failed to encode {}", output.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use tempfile::TempDir;

    /// Random pixels so the encoder cannot compress the file away.
    fn noisy_image(width: u32, height: u32) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(7);
        RgbImage::from_fn(width, height, |_, _| Rgb([rng.r#gen(), rng.r#gen(), rng.r#gen()]))
    }

    fn write_jpeg(dir: &Path, name: &str, image: &RgbImage, quality: u8) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
        image.write_with_encoder(encoder).unwrap();
        path
    }

    fn size_of(path: &Path) -> u64 {
        fs::metadata(path).unwrap().len()
    }

    #[test]
    fn small_enough_input_is_returned_untouched() {
        let dir = TempDir::new().unwrap();
        let input = write_jpeg(dir.path(), "small.jpg", &noisy_image(64, 48), 90);
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), dir.path().join("work"));

        let outcome = resizer.resize(&input, size_of(&input));

        assert_eq!(outcome.path, input);
        assert!(outcome.intermediates.is_empty());
        assert_eq!(outcome.attempts, 0);
        assert!(!dir.path().join("work").exists());
    }

    /// A 6000x4000 camera photo against a 4 MB ceiling, scaled down to 1800x1200 with the
    /// same aspect ratio and ceiling ratio. Full-size noise takes minutes in a debug build.
    #[test]
    fn oversized_jpeg_is_brought_under_the_ceiling() {
        let dir = TempDir::new().unwrap();
        let input = write_jpeg(dir.path(), "photo.jpg", &noisy_image(1800, 1200), 95);
        let ceiling = size_of(&input) * 2 / 3;
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), dir.path().join("work"));

        let outcome = resizer.resize(&input, ceiling);

        assert!(outcome.is_resized(&input));
        assert!(size_of(&outcome.path) <= ceiling);
        assert!(outcome.attempts >= 1 && outcome.attempts <= 10);
        assert_eq!(outcome.intermediates.len() as u32, outcome.attempts - 1);

        let resized = image::open(&outcome.path).unwrap();
        assert!(resized.width().min(resized.height()) >= 800);
        let ratio = resized.width() as f64 / resized.height() as f64;
        assert!((ratio - 1.5).abs() < 0.01);
    }

    #[test]
    fn png_input_is_re_encoded_as_jpeg() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("scan.png");
        noisy_image(1000, 900).save(&input).unwrap();
        let ceiling = size_of(&input) / 2;
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), dir.path().to_path_buf());

        let outcome = resizer.resize(&input, ceiling);

        assert!(outcome.is_resized(&input));
        assert_eq!(outcome.path.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(size_of(&outcome.path) <= ceiling);
    }

    #[test]
    fn impossible_ceiling_exhausts_the_attempt_budget() {
        let dir = TempDir::new().unwrap();
        let input = write_jpeg(dir.path(), "tiny.jpg", &noisy_image(400, 300), 95);
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), dir.path().join("work"));

        let outcome = resizer.resize(&input, 1);

        assert_eq!(outcome.attempts, 10);
        assert_eq!(outcome.intermediates.len(), 9);
        assert!(outcome.is_resized(&input));
        // Already under the floor, so the image is re-encoded but never enlarged.
        let resized = image::open(&outcome.path).unwrap();
        assert_eq!((resized.width(), resized.height()), (400, 300));
    }

    #[test]
    fn re_encodes_larger_than_the_original_fall_back_to_it() {
        let dir = TempDir::new().unwrap();
        // Low-quality source below the dimension floor: every quality-85 attempt is bigger.
        let input = write_jpeg(dir.path(), "grainy.jpg", &noisy_image(600, 500), 30);
        let original = size_of(&input);
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), dir.path().join("work"));

        let outcome = resizer.resize(&input, original / 2);

        assert_eq!(outcome.path, input);
        assert!(!outcome.is_resized(&input));
        assert_eq!(outcome.attempts, 10);
        assert_eq!(outcome.intermediates.len(), 10);
        assert_eq!(size_of(&outcome.path), original);
    }

    #[test]
    fn unreadable_or_unsupported_input_falls_back_to_the_original() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("notes.gif");
        fs::write(&input, vec![b'x'; 4096]).unwrap();
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), dir.path().join("work"));

        let outcome = resizer.resize(&input, 10);
        assert_eq!(outcome.path, input);
        assert!(outcome.intermediates.is_empty());

        let missing = dir.path().join("missing.jpg");
        assert_eq!(resizer.resize(&missing, 10).path, missing);
    }

    #[test]
    fn target_dimensions_respect_the_floor_and_aspect_ratio() {
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), PathBuf::from("."));

        assert_eq!(resizer.target_dimensions(6000, 4000, 0.9), (5400, 3600));
        assert_eq!(resizer.target_dimensions(6000, 4000, 0.01), (1200, 800));
        assert_eq!(resizer.target_dimensions(4000, 6000, 0.01), (800, 1200));
        assert_eq!(resizer.target_dimensions(640, 480, 0.5), (640, 480));
    }

    #[tokio::test]
    async fn blocking_variant_matches_the_sync_result() {
        let dir = TempDir::new().unwrap();
        let input = write_jpeg(dir.path(), "small.jpg", &noisy_image(32, 32), 90);
        let resizer = SizeConstrainedResizer::new(ResizeSettings::default(), dir.path().join("work"));

        let outcome = resizer.resize_blocking(input.clone(), u64::MAX).await;
        assert_eq!(outcome.path, input);
    }
}
