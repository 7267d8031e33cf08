//! Textured quad pass.
//!
//! One pipeline, one uniform holding the quad rectangle, and one bind group
//! per texture slot. A slot's bind group is rebuilt whenever the backend
//! reallocates that slot's texture, which it signals through
//! [`SlotTexture::generation`].

use wgpu::util::DeviceExt;

use crate::gpu::pipeline_helpers::{
    create_vertexless_pipeline, filtering_sampler, linear_sampler, texture_2d,
    vertex_uniform,
};
use crate::upload::wgpu_backend::SlotTexture;

/// GPU layout of the quad rectangle: `[left, top, right, bottom]` in NDC.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadUniform {
    /// Rectangle corners in normalized device coordinates.
    pub rect: [f32; 4],
}

struct CachedBindGroup {
    generation: u64,
    bind_group: wgpu::BindGroup,
}

/// Draws the current texture slot as a rectangle.
pub struct QuadRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    bind_groups: Vec<Option<CachedBindGroup>>,
}

impl QuadRenderer {
    /// Build the pipeline for `format` with room for `slot_count` bind
    /// groups.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        slot_count: usize,
    ) -> Self {
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Quad Bind Group Layout"),
                entries: &[texture_2d(0), filtering_sampler(1), vertex_uniform(2)],
            });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../assets/shaders/quad.wgsl").into(),
            ),
        });

        let pipeline = create_vertexless_pipeline(
            device,
            "Quad",
            &shader,
            format,
            &[&bind_group_layout],
        );

        let uniform_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Quad Uniform Buffer"),
                contents: bytemuck::bytes_of(&QuadUniform { rect: [0.0; 4] }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        Self {
            pipeline,
            bind_group_layout,
            sampler: linear_sampler(device, "Quad Sampler"),
            uniform_buffer,
            bind_groups: (0..slot_count).map(|_| None).collect(),
        }
    }

    /// Upload the rectangle and make sure `slot` has a bind group for its
    /// current texture.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: usize,
        texture: &SlotTexture,
        rect: [f32; 4],
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&QuadUniform { rect }),
        );

        if slot >= self.bind_groups.len() {
            self.bind_groups.resize_with(slot + 1, || None);
        }
        let stale = self.bind_groups[slot]
            .as_ref()
            .is_none_or(|cached| cached.generation != texture.generation);
        if stale {
            log::debug!(
                "quad bind group for slot {slot} (generation {})",
                texture.generation
            );
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Quad Bind Group {slot}")),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                ],
            });
            self.bind_groups[slot] = Some(CachedBindGroup {
                generation: texture.generation,
                bind_group,
            });
        }
    }

    /// Record the quad draw for `slot`. Does nothing if
    /// [`prepare`](Self::prepare) was never called for it.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, slot: usize) {
        let Some(Some(cached)) = self.bind_groups.get(slot) else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &cached.bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}
