//! Decoded source images, loaded once at startup.
//!
//! The store probes a fixed naming sequence (`image0.png`, `image1.png`, …)
//! in a directory. Missing candidates are skipped silently, files that fail
//! to decode are logged and skipped. Whatever decoded successfully is kept
//! in discovery order and never mutated afterwards.

use std::{
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::options::ImageOptions;

/// Bytes per pixel of every [`DecodedImage`] (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors produced while decoding one candidate image.
#[derive(Debug)]
pub enum DecodeError {
    /// The file could not be opened or read.
    Io(std::io::Error),
    /// The PNG stream is malformed.
    Png(png::DecodingError),
    /// The decoded colour layout cannot be normalized to RGBA8.
    Unsupported(png::ColorType),
    /// The image has a zero width or height.
    ZeroSized,
    /// The image exceeds the largest texture the uploader can hold.
    Oversized {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Largest accepted edge length.
        max: u32,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Png(e) => write!(f, "PNG decode error: {e}"),
            Self::Unsupported(color) => {
                write!(f, "unsupported colour type {color:?}")
            }
            Self::ZeroSized => write!(f, "image has no pixels"),
            Self::Oversized { width, height, max } => {
                write!(f, "image is {width}x{height}, larger than {max}x{max}")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Png(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<png::DecodingError> for DecodeError {
    fn from(e: png::DecodingError) -> Self {
        Self::Png(e)
    }
}

/// A raster image held in host memory as tightly packed RGBA8 rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap already-decoded RGBA8 pixels.
    ///
    /// Returns `None` if `pixels` does not hold exactly
    /// `width * height * 4` bytes or either dimension is zero.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        (width > 0 && height > 0 && pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// An image filled with a single RGBA colour.
    ///
    /// Returns `None` if either dimension is zero.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Option<Self> {
        let count = width as usize * height as usize;
        Self::from_rgba(width, height, rgba.repeat(count))
    }

    /// Decode a PNG file, normalizing every colour type and bit depth to
    /// RGBA8.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the file cannot be read, is not a valid
    /// PNG, or has a layout that cannot be expressed as RGBA8.
    pub fn load(path: &Path) -> Result<Self, DecodeError> {
        let file = File::open(path)?;
        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info()?;

        let (width, height) = {
            let info = reader.info();
            (info.width, info.height)
        };
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroSized);
        }

        let (color_type, _) = reader.output_color_type();
        let samples = color_type.samples();
        let mut raw = vec![0u8; width as usize * height as usize * samples];
        let frame = reader.next_frame(&mut raw)?;
        raw.truncate(frame.buffer_size());

        let pixels = expand_to_rgba(&raw, color_type)?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed RGBA8 rows.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bytes in one unpadded row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Total byte footprint of the pixel data.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Convert 8-bit PNG output samples to RGBA8.
fn expand_to_rgba(
    raw: &[u8],
    color_type: png::ColorType,
) -> Result<Vec<u8>, DecodeError> {
    let rgba = match color_type {
        png::ColorType::Rgba => raw.to_vec(),
        png::ColorType::Rgb => raw
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
            .collect(),
        png::ColorType::GrayscaleAlpha => raw
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => {
            raw.iter().flat_map(|&g| [g, g, g, u8::MAX]).collect()
        }
        png::ColorType::Indexed => {
            return Err(DecodeError::Unsupported(color_type))
        }
    };
    Ok(rgba)
}

/// The read-only set of images a run cycles through.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: Vec<DecodedImage>,
    sources: Vec<PathBuf>,
}

impl ImageStore {
    /// Build a store from images that are already in memory.
    #[must_use]
    pub fn from_images(images: Vec<DecodedImage>) -> Self {
        Self {
            images,
            sources: Vec::new(),
        }
    }

    /// Probe `dir` for the candidate names described by `options` and decode
    /// every one that exists.
    ///
    /// Images wider or taller than `max_dim` are rejected. An empty result is
    /// a valid store; the caller simply has nothing to display.
    #[must_use]
    pub fn discover(dir: &Path, options: &ImageOptions, max_dim: u32) -> Self {
        let mut store = Self::default();

        for index in 0..options.candidate_count {
            let path = dir.join(options.file_name(index));
            if !path.is_file() {
                log::debug!("no image at {}", path.display());
                continue;
            }

            match DecodedImage::load(&path).and_then(|image| {
                check_size(&image, max_dim)?;
                Ok(image)
            }) {
                Ok(image) => {
                    log::info!(
                        "loaded {} ({}x{}, {} KiB)",
                        path.display(),
                        image.width(),
                        image.height(),
                        image.byte_len() / 1024
                    );
                    store.images.push(image);
                    store.sources.push(path);
                }
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                }
            }
        }

        if store.is_empty() {
            log::warn!(
                "no images found in {} (expected {}0.{} …)",
                dir.display(),
                options.prefix,
                options.extension
            );
        }
        store
    }

    /// Number of decoded images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether nothing was decoded.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image at `index` in discovery order.
    pub fn get(&self, index: usize) -> Option<&DecodedImage> {
        self.images.get(index)
    }

    /// All images in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &DecodedImage> {
        self.images.iter()
    }

    /// Files the images were decoded from (empty for in-memory stores).
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Largest pixel footprint in the store, in bytes.
    pub fn max_byte_len(&self) -> usize {
        self.images
            .iter()
            .map(DecodedImage::byte_len)
            .max()
            .unwrap_or(0)
    }
}

fn check_size(image: &DecodedImage, max_dim: u32) -> Result<(), DecodeError> {
    if image.width() > max_dim || image.height() > max_dim {
        return Err(DecodeError::Oversized {
            width: image.width(),
            height: image.height(),
            max: max_dim,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::BufWriter;

    use super::*;

    fn write_png(
        path: &Path,
        width: u32,
        height: u32,
        color: png::ColorType,
        data: &[u8],
    ) {
        let file = File::create(path).unwrap();
        let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }

    fn options() -> ImageOptions {
        ImageOptions::default()
    }

    #[test]
    fn solid_fills_every_pixel() {
        let image = DecodedImage::solid(3, 2, [1, 2, 3, 4]).unwrap();
        assert_eq!(image.byte_len(), 3 * 2 * 4);
        assert_eq!(image.row_bytes(), 12);
        assert!(image.pixels().chunks_exact(4).all(|p| p == [1, 2, 3, 4]));
    }

    #[test]
    fn solid_rejects_zero_sized() {
        assert_eq!(DecodedImage::solid(0, 2, [1, 2, 3, 4]), None);
        assert_eq!(DecodedImage::solid(2, 0, [1, 2, 3, 4]), None);
    }

    #[test]
    fn from_rgba_rejects_wrong_length() {
        assert!(DecodedImage::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(DecodedImage::from_rgba(0, 2, Vec::new()).is_none());
        assert!(DecodedImage::from_rgba(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn rgb_png_gets_opaque_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        write_png(&path, 2, 1, png::ColorType::Rgb, &[10, 20, 30, 40, 50, 60]);

        let image = DecodedImage::load(&path).unwrap();
        assert_eq!((image.width(), image.height()), (2, 1));
        assert_eq!(image.pixels(), &[10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn grayscale_alpha_png_is_replicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ga.png");
        write_png(&path, 1, 1, png::ColorType::GrayscaleAlpha, &[77, 128]);

        let image = DecodedImage::load(&path).unwrap();
        assert_eq!(image.pixels(), &[77, 77, 77, 128]);
    }

    #[test]
    fn discover_skips_missing_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let red = [255, 0, 0, 255].repeat(4);
        let blue = [0, 0, 255, 255].repeat(4);
        write_png(&dir.path().join("image3.png"), 2, 2, png::ColorType::Rgba, &blue);
        write_png(&dir.path().join("image1.png"), 2, 2, png::ColorType::Rgba, &red);

        let store = ImageStore::discover(dir.path(), &options(), 2048);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().pixels(), red.as_slice());
        assert_eq!(store.get(1).unwrap().pixels(), blue.as_slice());
        assert!(store.sources()[0].ends_with("image1.png"));
    }

    #[test]
    fn discover_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("image0.png"), b"not a png").unwrap();
        write_png(
            &dir.path().join("image2.png"),
            1,
            1,
            png::ColorType::Rgba,
            &[1, 2, 3, 4],
        );

        let store = ImageStore::discover(dir.path(), &options(), 2048);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().pixels(), &[1, 2, 3, 4]);
    }

    #[test]
    fn discover_rejects_oversized_images() {
        let dir = tempfile::tempdir().unwrap();
        write_png(
            &dir.path().join("image0.png"),
            4,
            1,
            png::ColorType::Rgba,
            &[0; 16],
        );

        let store = ImageStore::discover(dir.path(), &options(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_directory_is_a_valid_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::discover(dir.path(), &options(), 2048);
        assert!(store.is_empty());
        assert!(store.get(0).is_none());
        assert_eq!(store.max_byte_len(), 0);
    }
}
