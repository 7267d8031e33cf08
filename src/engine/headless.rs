//! Windowless benchmark loop over the software backend.

use crate::image_store::{ImageStore, BYTES_PER_PIXEL};
use crate::options::Options;
use crate::upload::software::SoftwareBackend;
use crate::upload::{TransferBackend, Uploader};
use crate::util::upload_stats::UploadStats;

use super::schedule::Playlist;

/// Fence polls a headless transfer stays in flight.
pub const HEADLESS_LATENCY: u32 = 1;

/// Outcome of [`run_headless`].
pub struct HeadlessReport {
    /// Per-path timings.
    pub stats: UploadStats,
    /// Switches performed.
    pub switches: u64,
    /// Uploads whose readback differed from the source image. Only counted
    /// with `debug.verify_uploads`.
    pub mismatches: u64,
}

/// Perform `switches` image switches back to back on a
/// [`SoftwareBackend`] configured from `options`.
///
/// An empty store performs no switches.
pub fn run_headless(images: &ImageStore, options: &Options, switches: u64) -> HeadlessReport {
    let dim = options.stream.max_texture_dim as usize;
    let backend = SoftwareBackend::new(options.stream.slots(), dim * dim * BYTES_PER_PIXEL)
        .with_latency(HEADLESS_LATENCY);
    let mut uploader = Uploader::new(backend).with_mode(options.stream.mode);
    let mut stats = UploadStats::new(0.0);
    let mut playlist = Playlist::default();
    let mut report_switches = 0;
    let mut mismatches = 0;

    log::info!(
        "headless run: {switches} switch(es), {} slot(s), {:?} mode",
        uploader.slot_count(),
        uploader.mode()
    );

    for _ in 0..switches {
        let Some(image) = playlist.advance(images.len()).and_then(|i| images.get(i)) else {
            log::warn!("no images to upload");
            break;
        };
        let handle = uploader.begin_upload(image);
        stats.record(&handle);
        report_switches += 1;

        if options.debug.verify_uploads {
            let readback = uploader.backend_mut().read_texture(handle.texture.index());
            if readback.as_deref() != Some(image.pixels()) {
                log::warn!("slot {} does not hold the uploaded image", handle.texture.index());
                mismatches += 1;
            }
        }
    }

    HeadlessReport {
        stats,
        switches: report_switches,
        mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_store::DecodedImage;
    use crate::upload::UploadMode;
    use crate::util::upload_stats::PathKind;

    fn store() -> ImageStore {
        ImageStore::from_images(vec![
            DecodedImage::solid(4, 4, [255, 0, 0, 255]).unwrap(),
            DecodedImage::solid(8, 2, [0, 255, 0, 255]).unwrap(),
            DecodedImage::solid(3, 5, [0, 0, 255, 255]).unwrap(),
        ])
    }

    fn options() -> Options {
        let mut options = Options::default();
        options.stream.max_texture_dim = 16;
        options.debug.verify_uploads = true;
        options
    }

    #[test]
    fn staged_run_counts_every_switch() {
        let report = run_headless(&store(), &options(), 12);
        assert_eq!(report.switches, 12);
        assert_eq!(report.stats.total_uploads(), 12);
        assert_eq!(report.mismatches, 0);
        assert_eq!(report.stats.path(PathKind::Staged).count, 12);
    }

    #[test]
    fn direct_mode_never_stages() {
        let mut options = options();
        options.stream.mode = UploadMode::Direct;
        let report = run_headless(&store(), &options, 6);
        assert_eq!(report.stats.path(PathKind::Direct).count, 6);
        assert_eq!(report.stats.path(PathKind::Staged).count, 0);
    }

    #[test]
    fn single_slot_run_stays_staged() {
        let mut options = options();
        options.stream.slot_count = 1;
        let report = run_headless(&store(), &options, 6);
        assert_eq!(report.stats.path(PathKind::Staged).count, 6);
        assert_eq!(report.mismatches, 0);
    }

    #[test]
    fn empty_store_does_nothing() {
        let report = run_headless(&ImageStore::default(), &options(), 5);
        assert_eq!(report.switches, 0);
        assert_eq!(report.stats.total_uploads(), 0);
    }
}
