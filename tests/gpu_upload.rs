#![cfg(feature = "gpu-tests")]
//! Staged uploads through a real device, read back to host memory.
//!
//! Feature-gated so CI runs without a GPU still pass; skipped when no
//! adapter is available.

use texstream::gpu::render_context::RenderContext;
use texstream::image_store::DecodedImage;
use texstream::upload::wgpu_backend::WgpuBackend;
use texstream::upload::{TransferBackend, UploadMode, UploadPath, Uploader};

fn context() -> Option<RenderContext> {
    match pollster::block_on(RenderContext::headless()) {
        Ok(context) => Some(context),
        Err(e) => {
            eprintln!("no GPU available ({e}); skipping gpu test");
            None
        }
    }
}

fn uploader(context: &RenderContext, slots: usize) -> Uploader<WgpuBackend> {
    Uploader::new(WgpuBackend::new(&context.device, &context.queue, slots, 256))
}

/// Bytes vary per row and column so a wrong row pitch shows up.
fn gradient(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[
                (y as u8).wrapping_mul(19).wrapping_add(x as u8),
                x as u8,
                y as u8,
                255,
            ]);
        }
    }
    DecodedImage::from_rgba(width, height, pixels).unwrap()
}

fn read_current(uploader: &mut Uploader<WgpuBackend>) -> Vec<u8> {
    let slot = uploader.current_texture().unwrap().index();
    uploader.backend_mut().read_texture(slot).unwrap()
}

#[test]
fn staged_upload_with_padded_rows_reads_back() {
    let Some(context) = context() else {
        return;
    };
    let mut uploader = uploader(&context, 2);

    // 65 * 4 = 260 bytes per row, padded to 512 in the transfer slot.
    let image = gradient(65, 3);
    let handle = uploader.begin_upload(&image);
    assert_eq!(handle.path, UploadPath::Staged);
    assert_eq!(read_current(&mut uploader), image.pixels());
}

#[test]
fn second_upload_replaces_the_first() {
    let Some(context) = context() else {
        return;
    };
    let mut uploader = uploader(&context, 2);
    let red = DecodedImage::solid(2, 2, [255, 0, 0, 255]).unwrap();
    let blue = DecodedImage::solid(2, 2, [0, 0, 255, 255]).unwrap();

    let _ = uploader.begin_upload(&red);
    let _ = uploader.begin_upload(&blue);

    let texels = read_current(&mut uploader);
    assert_eq!(texels.len(), 16);
    assert!(texels.chunks_exact(4).all(|t| t == [0, 0, 255, 255]));
}

#[test]
fn slots_rotate_and_are_reused() {
    let Some(context) = context() else {
        return;
    };
    let mut uploader = uploader(&context, 2);
    let images = [gradient(17, 9), gradient(64, 4), gradient(3, 40)];

    for round in 0..3 {
        for (i, image) in images.iter().enumerate() {
            let handle = uploader.begin_upload(image);
            assert_eq!(handle.transfer_slot, (round * images.len() + i) % 2);
            assert_eq!(read_current(&mut uploader), image.pixels());
        }
    }
}

#[test]
fn single_slot_waits_for_its_fence() {
    let Some(context) = context() else {
        return;
    };
    let mut uploader = uploader(&context, 1);
    let image = gradient(33, 7);

    for _ in 0..4 {
        let handle = uploader.begin_upload(&image);
        assert_eq!(handle.path, UploadPath::Staged);
    }
    assert_eq!(read_current(&mut uploader), image.pixels());
}

#[test]
fn direct_mode_and_oversized_images_read_back() {
    let Some(context) = context() else {
        return;
    };
    let mut uploader = uploader(&context, 2).with_mode(UploadMode::Direct);
    let image = gradient(40, 40);
    assert_eq!(uploader.begin_upload(&image).path, UploadPath::Direct);
    assert_eq!(read_current(&mut uploader), image.pixels());

    uploader.set_mode(UploadMode::Staged);
    // Larger than the 256x256 transfer slots.
    let wide = gradient(300, 300);
    let handle = uploader.begin_upload(&wide);
    assert!(matches!(handle.path, UploadPath::Fallback(_)));
    assert_eq!(read_current(&mut uploader), wide.pixels());
}
