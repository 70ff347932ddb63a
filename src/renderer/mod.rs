pub mod atlas;
pub mod backend;
pub mod batch;
pub mod cull;
pub mod glyphs;
pub mod pipeline;
pub mod software;
pub mod utils;

use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use backend::DrawBackend;
use batch::TileBatch;
use pipeline::{ProjectionUniform, TilePipeline, create_tile_pipeline};
use utils::{Viewport, orthographic_projection};

use crate::error::{Error, Result};

// ── GpuAtlas ──────────────────────────────────────────────────────────────────

/// Atlas bitmap uploaded to the GPU, ready to bind.
pub struct GpuAtlas {
    pub texture_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

// ── GrowableBuffer ────────────────────────────────────────────────────────────

/// Persistent GPU buffer that is only reallocated when a frame needs more
/// room than it has (next power of two, min 256 elements).
struct GrowableBuffer {
    buffer: Option<wgpu::Buffer>,
    capacity_bytes: u64,
    label: &'static str,
    usage: wgpu::BufferUsages,
}

impl GrowableBuffer {
    fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self { buffer: None, capacity_bytes: 0, label, usage: usage | wgpu::BufferUsages::COPY_DST }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8], elem_size: u64) {
        let needed = bytes.len() as u64;
        if self.buffer.is_none() || needed > self.capacity_bytes {
            let elems = (needed / elem_size.max(1)).max(256).next_power_of_two();
            let size = elems * elem_size;
            log::debug!("{}: growing to {} bytes", self.label, size);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size,
                usage: self.usage,
                mapped_at_creation: false,
            }));
            self.capacity_bytes = size;
        }
        if let Some(buf) = &self.buffer {
            queue.write_buffer(buf, 0, bytes);
        }
    }

    fn slice(&self, len: u64) -> Option<wgpu::BufferSlice<'_>> {
        self.buffer.as_ref().map(|b| b.slice(..len))
    }
}

// ── Renderer ──────────────────────────────────────────────────────────────────

/// wgpu draw backend: one render pass, one indexed draw per frame.
pub struct Renderer {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    tile_pipeline: TilePipeline,
    projection_buffer: wgpu::Buffer,
    projection_bind_group: wgpu::BindGroup,
    position_buffer: GrowableBuffer,
    uv_buffer: GrowableBuffer,
    index_buffer: GrowableBuffer,
}

impl Renderer {
    /// Acquire a surface, adapter and device for `window`.
    ///
    /// Any failure here is fatal: without a drawable surface no frame can
    /// ever be rendered.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| Error::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::Adapter(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("gpu: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .map_err(|e| Error::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| Error::Surface("surface reports no supported formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("surface: {}x{} {:?}", config.width, config.height, format);

        let tile_pipeline = create_tile_pipeline(&device, format);

        let proj = ProjectionUniform {
            matrix: orthographic_projection(config.width as f32, config.height as f32),
        };
        let projection_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("projection_buffer"),
            contents: bytemuck::cast_slice(&[proj]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let projection_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projection_bg"),
            layout: &tile_pipeline.projection_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            tile_pipeline,
            projection_buffer,
            projection_bind_group,
            position_buffer: GrowableBuffer::new("position_buffer", wgpu::BufferUsages::VERTEX),
            uv_buffer: GrowableBuffer::new("uv_buffer", wgpu::BufferUsages::VERTEX),
            index_buffer: GrowableBuffer::new("index_buffer", wgpu::BufferUsages::INDEX),
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("surface resized to {}x{}", new_size.width, new_size.height);

        // Keep the pixel projection in step with the surface.
        let proj = ProjectionUniform {
            matrix: orthographic_projection(new_size.width as f32, new_size.height as f32),
        };
        self.queue
            .write_buffer(&self.projection_buffer, 0, bytemuck::cast_slice(&[proj]));
    }
}

impl DrawBackend for Renderer {
    type Texture = GpuAtlas;
    type Error = Error;

    fn create_atlas_texture(&mut self, img: &RgbaImage) -> Result<GpuAtlas> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Config("atlas image is empty".into()));
        }

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("atlas"),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            img.as_raw(),
        );

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atlas_bg"),
            layout: &self.tile_pipeline.atlas_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        log::info!("atlas uploaded: {width}x{height}");
        Ok(GpuAtlas { texture_view, sampler, bind_group, width, height })
    }

    /// Render one frame: clear, then draw every quad in `batch` with a single
    /// indexed draw call.
    ///
    /// A lost or outdated surface is reconfigured and the frame is skipped.
    fn submit_batch(&mut self, batch: &TileBatch, atlas: &GpuAtlas) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout; skipping frame");
                return Ok(());
            }
            Err(e) => return Err(Error::Surface(e.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let index_count = batch.indices.len() as u32;
        if index_count > 0 {
            self.position_buffer.upload(
                &self.device,
                &self.queue,
                bytemuck::cast_slice(&batch.positions),
                std::mem::size_of::<[f32; 2]>() as u64,
            );
            self.uv_buffer.upload(
                &self.device,
                &self.queue,
                bytemuck::cast_slice(&batch.uvs),
                std::mem::size_of::<[f32; 2]>() as u64,
            );
            self.index_buffer.upload(
                &self.device,
                &self.queue,
                bytemuck::cast_slice(&batch.indices),
                std::mem::size_of::<u32>() as u64,
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame") });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tiles"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let vertex_bytes = (batch.positions.len() * std::mem::size_of::<[f32; 2]>()) as u64;
            let index_bytes = (batch.indices.len() * std::mem::size_of::<u32>()) as u64;
            if let (true, Some(pos), Some(uv), Some(idx)) = (
                index_count > 0,
                self.position_buffer.slice(vertex_bytes),
                self.uv_buffer.slice(vertex_bytes),
                self.index_buffer.slice(index_bytes),
            ) {
                pass.set_pipeline(&self.tile_pipeline.render_pipeline);
                pass.set_bind_group(0, &self.projection_bind_group, &[]);
                pass.set_bind_group(1, &atlas.bind_group, &[]);
                pass.set_vertex_buffer(0, pos);
                pass.set_vertex_buffer(1, uv);
                pass.set_index_buffer(idx, wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
            .with_scale_factor(self.window.scale_factor() as f32)
    }
}
