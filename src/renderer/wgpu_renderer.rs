mod shader;

pub use shader::{
    DEFAULT_SHADER, PROJECTION_UNIFORM, TEXT_COLOR_UNIFORM, TextShader, pixel_projection,
};

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::{
    error::RenderError,
    glyph::{GlyphRasterizer, RasterizedGlyph},
    glyph_cache::{GlyphCacheConfig, GlyphTextureAllocator, GlyphTextureCache},
    renderer::{QuadTarget, TextRenderer, TextRendererConfig},
    text::{PenState, QUAD_BUFFER_SIZE, QUAD_VERTEX_COUNT, Quad},
};

#[derive(Clone, Debug, PartialEq)]
pub struct WgpuTextRendererConfig {
    pub cache: GlyphCacheConfig,
    pub text: TextRendererConfig,
    /// Initial viewport size in pixels, used for the projection.
    pub viewport: [u32; 2],
}

impl Default for WgpuTextRendererConfig {
    fn default() -> Self {
        Self {
            cache: GlyphCacheConfig::default(),
            text: TextRendererConfig::default(),
            viewport: [800, 600],
        }
    }
}

/// One glyph's texture and the bind group that samples it.
#[derive(Clone, Debug)]
pub struct WgpuGlyphTexture {
    pub texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Text rendering session on a wgpu device.
///
/// Owns the shader program, the sampler, the one-quad vertex buffer and the
/// glyph texture cache. All of them are released when the session is dropped.
pub struct WgpuTextRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    shader: TextShader,
    sampler: wgpu::Sampler,
    quad_buffer: wgpu::Buffer,
    cache_config: GlyphCacheConfig,
    cache: GlyphTextureCache<WgpuGlyphTexture>,
    text_renderer: TextRenderer,
    viewport: [u32; 2],
    last_draw_calls: usize,
}

impl WgpuTextRenderer {
    /// Creates a session with the built-in shader and builds the glyph cache
    /// for `font`.
    pub fn new<R>(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        font: &R,
        config: WgpuTextRendererConfig,
    ) -> Result<Self, RenderError>
    where
        R: GlyphRasterizer + ?Sized,
    {
        let shader = TextShader::from_wgsl(&device, DEFAULT_SHADER, format)?;
        Self::with_shader(device, queue, shader, font, config)
    }

    /// Same as [`Self::new`] but with a caller-provided shader.
    pub fn with_shader<R>(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        mut shader: TextShader,
        font: &R,
        config: WgpuTextRendererConfig,
    ) -> Result<Self, RenderError>
    where
        R: GlyphRasterizer + ?Sized,
    {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Glyph Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let quad_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quad Vertex Buffer"),
            size: QUAD_BUFFER_SIZE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let [width, height] = config.viewport;
        shader.set_projection(&pixel_projection(width, height));

        let mut renderer = Self {
            device,
            queue,
            shader,
            sampler,
            quad_buffer,
            cache_config: config.cache,
            cache: GlyphTextureCache::empty(),
            text_renderer: TextRenderer::new(config.text),
            viewport: config.viewport,
            last_draw_calls: 0,
        };
        renderer.load_font(font)?;

        Ok(renderer)
    }

    /// Rebuilds the glyph cache from `font`. The previous textures are
    /// released once the new cache is in place.
    pub fn load_font<R>(&mut self, font: &R) -> Result<(), RenderError>
    where
        R: GlyphRasterizer + ?Sized,
    {
        let mut uploader = GlyphUploader {
            device: &self.device,
            queue: &self.queue,
            layout: self.shader.glyph_bind_group_layout(),
            sampler: &self.sampler,
            max_dimension: self.device.limits().max_texture_dimension_2d,
        };
        self.cache = GlyphTextureCache::build(font, &self.cache_config, &mut uploader)?;

        log::info!(
            "loaded {} glyph textures at {}px",
            self.cache.len(),
            self.cache.pixel_height()
        );
        Ok(())
    }

    /// Drops every glyph texture. Text rendered afterwards draws nothing
    /// until a font is loaded again.
    pub fn unload_font(&mut self) {
        log::info!("unloading {} glyph textures", self.cache.len());
        self.cache = GlyphTextureCache::empty();
    }

    /// Call when the render target changes size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = [width, height];
        self.shader.set_projection(&pixel_projection(width, height));
    }

    pub fn viewport(&self) -> [u32; 2] {
        self.viewport
    }

    pub fn set_wireframe(&mut self, enabled: bool) -> Result<(), RenderError> {
        if self.shader.set_wireframe(enabled) {
            Ok(())
        } else {
            Err(RenderError::WireframeUnsupported)
        }
    }

    pub fn shader_mut(&mut self) -> &mut TextShader {
        &mut self.shader
    }

    pub fn cache(&self) -> &GlyphTextureCache<WgpuGlyphTexture> {
        &self.cache
    }

    pub fn text_renderer(&self) -> &TextRenderer {
        &self.text_renderer
    }

    /// Draw calls recorded by the most recent [`Self::render_text`].
    pub fn last_draw_calls(&self) -> usize {
        self.last_draw_calls
    }

    /// Records the draws for `text` into `encoder`, on top of what `view`
    /// already holds.
    ///
    /// `(x, y)` is the baseline origin in pixels from the bottom-left of the
    /// viewport. Returns the pen after the last glyph.
    pub fn render_text(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: palette::Srgb<f32>,
    ) -> PenState {
        let mut frame = WgpuFrame {
            device: &self.device,
            shader: &mut self.shader,
            quad_buffer: &self.quad_buffer,
            encoder,
            view,
            bound: None,
            draw_calls: 0,
        };

        let pen = self.text_renderer.render_text(
            &self.cache,
            text,
            x,
            y,
            scale,
            [color.red, color.green, color.blue],
            &mut frame,
        );

        self.last_draw_calls = frame.draw_calls;
        pen
    }

    /// Width in pixels `text` would take at `scale`.
    pub fn measure(&self, text: &str, scale: f32) -> f32 {
        self.text_renderer.measure(&self.cache, text, scale)
    }
}

/// Creates an `R8Unorm` texture per glyph and its bind group.
struct GlyphUploader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    layout: &'a wgpu::BindGroupLayout,
    sampler: &'a wgpu::Sampler,
    max_dimension: u32,
}

impl GlyphTextureAllocator for GlyphUploader<'_> {
    type Texture = WgpuGlyphTexture;
    type Error = RenderError;

    fn allocate_glyph_texture(
        &mut self,
        ch: char,
        glyph: &RasterizedGlyph,
    ) -> Result<WgpuGlyphTexture, RenderError> {
        let (width, height) = (glyph.size.width, glyph.size.height);
        if width > self.max_dimension || height > self.max_dimension {
            return Err(RenderError::GlyphTooLarge {
                width,
                height,
                max: self.max_dimension,
            });
        }

        // wgpu rejects empty textures; blank glyphs get one transparent texel
        let (extent, pixels) = if glyph.is_blank() {
            ((1, 1), &[0u8][..])
        } else {
            ((width, height), glyph.bitmap.as_slice())
        };
        let size = wgpu::Extent3d {
            width: extent.0,
            height: extent.1,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("Glyph Texture {:?}", ch)),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(extent.0),
                rows_per_image: Some(extent.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glyph Bind Group"),
            layout: self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(self.sampler),
                },
            ],
        });

        Ok(WgpuGlyphTexture {
            texture,
            bind_group,
        })
    }
}

/// [`QuadTarget`] recording into one command encoder.
///
/// Every upload is a buffer copy and every draw its own render pass, so the
/// copies and draws execute in the order they were issued.
struct WgpuFrame<'a> {
    device: &'a wgpu::Device,
    shader: &'a mut TextShader,
    quad_buffer: &'a wgpu::Buffer,
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
    bound: Option<wgpu::BindGroup>,
    draw_calls: usize,
}

impl QuadTarget for WgpuFrame<'_> {
    type Texture = WgpuGlyphTexture;

    fn set_text_color(&mut self, color: [f32; 3]) {
        self.shader.set_color(color);
        self.shader.flush(self.device, self.encoder);
    }

    fn bind_texture(&mut self, texture: &WgpuGlyphTexture) {
        self.bound = Some(texture.bind_group.clone());
    }

    fn upload_quad(&mut self, quad: &Quad) {
        let staging_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Quad Staging Buffer"),
                contents: quad.as_bytes(),
                usage: wgpu::BufferUsages::COPY_SRC,
            });

        self.encoder.copy_buffer_to_buffer(
            &staging_buffer,
            0,
            self.quad_buffer,
            0,
            QUAD_BUFFER_SIZE,
        );
    }

    fn draw_quad(&mut self) {
        let Some(bind_group) = &self.bound else {
            log::warn!("Draw called without a bound glyph texture.");
            return;
        };

        let mut rpass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Text Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.shader.activate(&mut rpass);
        rpass.set_bind_group(1, bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
        drop(rpass);

        self.draw_calls += 1;
    }
}
