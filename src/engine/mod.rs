//! The per-frame loop: image switching, upload timing and drawing.

pub mod headless;
pub mod schedule;

use std::path::Path;

use glam::Vec2;

use self::schedule::{Playlist, SwitchSchedule};
use crate::error::StreamError;
use crate::gpu::render_context::RenderContext;
use crate::image_store::ImageStore;
use crate::input::KeyAction;
use crate::options::Options;
use crate::renderer::motion::quad_size;
use crate::renderer::{wave_color, Bounce, QuadMotion, QuadRect, QuadRenderer};
use crate::upload::wgpu_backend::WgpuBackend;
use crate::upload::{TransferBackend, Uploader};
use crate::util::frame_timing::FrameTiming;
use crate::util::upload_stats::UploadStats;

/// Owns everything a streaming run needs: device, uploader, quad pass and
/// the decoded images.
pub struct StreamEngine {
    context: RenderContext,
    uploader: Uploader<WgpuBackend>,
    quad: QuadRenderer,
    images: ImageStore,
    options: Options,
    schedule: SwitchSchedule,
    playlist: Playlist,
    motion: QuadMotion,
    bounce: Bounce,
    rect: QuadRect,
    stats: UploadStats,
    frame_timing: FrameTiming,
    last_dt: f32,
    switch_requested: bool,
    verify_failures: u64,
}

impl StreamEngine {
    /// Create an engine presenting to `window`, loading images from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Setup`] if no surface, adapter or device can
    /// be acquired.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
        dir: &Path,
    ) -> Result<Self, StreamError> {
        let context = RenderContext::new(window, size, options.display.vsync).await?;
        Ok(Self::new_from_context(context, options, dir))
    }

    /// Create an engine on an existing context, loading images from `dir`.
    pub fn new_from_context(context: RenderContext, options: Options, dir: &Path) -> Self {
        let max_dim = max_dim(&context, &options);
        let images = ImageStore::discover(dir, &options.images, max_dim);
        Self::with_images(context, options, images)
    }

    /// Create an engine on an existing context with images already in
    /// memory.
    pub fn with_images(context: RenderContext, options: Options, images: ImageStore) -> Self {
        let max_dim = max_dim(&context, &options);
        let backend = WgpuBackend::new(
            &context.device,
            &context.queue,
            options.stream.slots(),
            max_dim,
        );
        let uploader = Uploader::new(backend).with_mode(options.stream.mode);
        let quad = QuadRenderer::new(&context.device, context.format(), uploader.slot_count());

        let viewport = viewport(&context);
        let rect = QuadRect::centered(viewport, quad_size(viewport, options.display.quad_scale));
        let bounce = Bounce::launch(rect.origin, options.display.bounce_speed, &mut rand::rng());

        log::info!(
            "{} image(s), {} slot(s), {:?} uploads, switch every {} frame(s) from frame {}",
            images.len(),
            uploader.slot_count(),
            uploader.mode(),
            options.stream.interval(),
            options.stream.first_texture_frame
        );

        Self {
            schedule: SwitchSchedule::new(
                options.stream.first_texture_frame,
                options.stream.interval(),
            ),
            playlist: Playlist::default(),
            motion: options.display.motion,
            bounce,
            rect,
            stats: UploadStats::new(options.stream.stats_interval_secs),
            frame_timing: FrameTiming::new(options.display.target_fps),
            last_dt: 0.0,
            switch_requested: false,
            verify_failures: 0,
            context,
            uploader,
            quad,
            images,
            options,
        }
    }

    /// Advance by `dt` seconds: switch images when due and move the quad.
    pub fn update(&mut self, dt: f32) {
        let frame = self.frame_timing.frames();
        let requested = std::mem::take(&mut self.switch_requested);
        let due = self.schedule.take_switch(frame);
        if requested || due {
            self.switch_image();
        }
        let _ = self.stats.maybe_log();

        let viewport = viewport(&self.context);
        let size = quad_size(viewport, self.options.display.quad_scale);
        self.rect = match self.motion {
            QuadMotion::Centered => QuadRect::centered(viewport, size),
            QuadMotion::Bounce => self.bounce.step(dt, viewport, size),
        };
    }

    /// Upload the next image of the playlist.
    fn switch_image(&mut self) {
        let Some(index) = self.playlist.advance(self.images.len()) else {
            return;
        };
        let Some(image) = self.images.get(index) else {
            return;
        };
        let handle = self.uploader.begin_upload(image);
        self.stats.record(&handle);

        if self.options.debug.verify_uploads {
            let slot = handle.texture.index();
            let readback = self.uploader.backend_mut().read_texture(slot);
            if readback.as_deref() == Some(image.pixels()) {
                log::debug!("slot {slot} verified");
            } else {
                self.verify_failures += 1;
                log::warn!("slot {slot} does not hold image {index}");
            }
        }
    }

    /// Render and present one frame.
    ///
    /// # Errors
    ///
    /// Returns [`wgpu::SurfaceError`] if the swapchain frame cannot be
    /// acquired.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.frame_timing.should_render() {
            return Ok(());
        }

        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.render_to_view(&view);
        self.context.submit(encoder);
        frame.present();

        self.last_dt = self.frame_timing.end_frame();
        Ok(())
    }

    /// Render one frame into `view` instead of the swapchain.
    pub fn render_to_texture(&mut self, view: &wgpu::TextureView) {
        let encoder = self.render_to_view(view);
        self.context.submit(encoder);
        self.last_dt = self.frame_timing.end_frame();
    }

    fn render_to_view(&mut self, view: &wgpu::TextureView) -> wgpu::CommandEncoder {
        let drawn = self.drawn_slot();
        if let Some(slot) = drawn {
            if let Some(texture) = self.uploader.backend().texture(slot) {
                let rect = self.rect.to_ndc(viewport(&self.context));
                self.quad.prepare(
                    &self.context.device,
                    &self.context.queue,
                    slot,
                    texture,
                    rect,
                );
            }
        }

        let mut encoder = self.context.create_encoder();
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stream Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wave_color(self.frame_timing.seconds())),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(slot) = drawn {
                self.quad.draw(&mut pass, slot);
            }
        }
        encoder
    }

    /// Texture slot the quad shows this frame, if any.
    fn drawn_slot(&self) -> Option<usize> {
        self.schedule.quad_slot(
            self.frame_timing.frames(),
            self.images.len(),
            self.uploader.current_texture().map(|slot| slot.index()),
        )
    }

    /// Resize the surface. The quad follows on the next update.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    /// Apply a key-bound action. [`KeyAction::Quit`] is the caller's job.
    pub fn handle_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Quit => {}
            KeyAction::NextImage => self.switch_requested = true,
            KeyAction::ToggleUploadMode => {
                let mode = self.uploader.mode().toggled();
                self.uploader.set_mode(mode);
            }
            KeyAction::ToggleMotion => {
                self.motion = self.motion.toggled();
                if self.motion == QuadMotion::Bounce {
                    self.bounce = Bounce::launch(
                        self.rect.origin,
                        self.options.display.bounce_speed,
                        &mut rand::rng(),
                    );
                }
                log::info!("quad motion: {:?}", self.motion);
            }
            KeyAction::LogStats => log::info!("upload statistics\n{}", self.stats),
        }
    }

    /// Seconds the previous frame took.
    pub fn frame_seconds(&self) -> f32 {
        self.last_dt
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frame_timing.frames()
    }

    /// Options the engine was built with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The decoded images.
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// The uploader, for inspecting slot state and textures.
    pub fn uploader(&self) -> &Uploader<WgpuBackend> {
        &self.uploader
    }

    /// Upload statistics so far.
    pub fn stats(&self) -> &UploadStats {
        &self.stats
    }

    /// Uploads whose readback differed from the source image.
    pub fn verify_failures(&self) -> u64 {
        self.verify_failures
    }

    /// Log the end-of-run summary.
    pub fn log_summary(&self) {
        log::info!(
            "{} frame(s), {:.1} fps, {} upload(s)\n{}",
            self.frame_timing.frames(),
            self.frame_timing.fps(),
            self.stats.total_uploads(),
            self.stats
        );
        if self.verify_failures > 0 {
            log::warn!("{} upload(s) failed verification", self.verify_failures);
        }
    }
}

/// Largest image edge: the configured limit, capped by the device.
fn max_dim(context: &RenderContext, options: &Options) -> u32 {
    options.stream.max_texture_dim.min(context.max_texture_dim()).max(1)
}

fn viewport(context: &RenderContext) -> Vec2 {
    let (width, height) = context.size();
    Vec2::new(width as f32, height as f32)
}
