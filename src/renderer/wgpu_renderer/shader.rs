use std::{collections::HashMap, path::Path};

use nalgebra::Matrix4;
use wgpu::util::DeviceExt;

use crate::{error::ShaderError, text::QuadVertex};

/// Shader used when no custom source is given.
pub const DEFAULT_SHADER: &str = include_str!("text.wgsl");

pub const PROJECTION_UNIFORM: &str = "projection";
pub const TEXT_COLOR_UNIFORM: &str = "textColor";

/// Byte size of the `Globals` uniform block in the shader.
const UNIFORM_BLOCK_SIZE: usize = 80;

/// Where a named uniform lives inside the uniform block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct UniformSlot {
    offset: usize,
    size: usize,
}

/// Uniforms declared by the `Globals` struct, in WGSL layout.
const UNIFORM_LAYOUT: &[(&str, UniformSlot)] = &[
    (
        PROJECTION_UNIFORM,
        UniformSlot {
            offset: 0,
            size: 64,
        },
    ),
    (
        TEXT_COLOR_UNIFORM,
        UniformSlot {
            offset: 64,
            size: 12,
        },
    ),
];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    // position
    0 => Float32x2,
    // tex_coords
    1 => Float32x2,
];

/// CPU copy of the uniform block.
///
/// Name lookups are resolved against the declared layout once and memoized;
/// the set of uniforms is fixed once the shader exists, so entries are never
/// invalidated.
struct UniformBlock {
    data: [u8; UNIFORM_BLOCK_SIZE],
    slots: HashMap<String, UniformSlot, fxhash::FxBuildHasher>,
    dirty: bool,
}

impl UniformBlock {
    fn new() -> Self {
        Self {
            data: [0; UNIFORM_BLOCK_SIZE],
            slots: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            dirty: true,
        }
    }

    fn slot(&mut self, name: &str) -> Result<UniformSlot, ShaderError> {
        if let Some(&slot) = self.slots.get(name) {
            return Ok(slot);
        }

        let slot = UNIFORM_LAYOUT
            .iter()
            .find(|(uniform, _)| *uniform == name)
            .map(|&(_, slot)| slot)
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))?;

        self.slots.insert(name.to_string(), slot);
        Ok(slot)
    }

    fn set(&mut self, name: &str, value: &[f32]) -> Result<(), ShaderError> {
        let slot = self.slot(name)?;
        let bytes: &[u8] = bytemuck::cast_slice(value);
        if bytes.len() != slot.size {
            return Err(ShaderError::UniformSize {
                name: name.to_string(),
                expected: slot.size,
                actual: bytes.len(),
            });
        }

        self.data[slot.offset..slot.offset + slot.size].copy_from_slice(bytes);
        self.dirty = true;
        Ok(())
    }
}

/// Orthographic projection mapping `(0, 0)..(width, height)` pixels to clip
/// space, origin at the bottom-left.
pub fn pixel_projection(width: u32, height: u32) -> Matrix4<f32> {
    Matrix4::new_orthographic(0.0, width.max(1) as f32, 0.0, height.max(1) as f32, -1.0, 1.0)
}

/// The text shader program: pipeline, uniform block, and bind group layouts.
pub struct TextShader {
    pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    wireframe: bool,
    glyph_bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: UniformBlock,
}

impl TextShader {
    /// Loads WGSL source from `path` and builds the program.
    pub fn from_file(
        device: &wgpu::Device,
        path: impl AsRef<Path>,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("loading shader {}", path.display());
        Self::from_wgsl(device, &source, format)
    }

    /// Builds the program from WGSL source.
    ///
    /// The source must declare `vs_main`/`fs_main`, the `Globals` uniform
    /// block at group 0 and the glyph texture/sampler at group 1, as in
    /// [`DEFAULT_SHADER`].
    pub fn from_wgsl(
        device: &wgpu::Device,
        source: &str,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Text Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Text Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let glyph_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Glyph Bind Group Layout"),
                entries: &[
                    // Texture 2D
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Sampler
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Text Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &glyph_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &module,
            format,
            wgpu::PolygonMode::Fill,
        );

        let wireframe_pipeline = device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
            .then(|| {
                create_pipeline(
                    device,
                    &pipeline_layout,
                    &module,
                    format,
                    wgpu::PolygonMode::Line,
                )
            });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            log::error!("Text shader failed validation: {}", error);
            return Err(ShaderError::Compile(error.to_string()));
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Text Uniform Buffer"),
            size: UNIFORM_BLOCK_SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Text Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            wireframe_pipeline,
            wireframe: false,
            glyph_bind_group_layout,
            uniform_buffer,
            uniform_bind_group,
            uniforms: UniformBlock::new(),
        })
    }

    /// Layout for the per-glyph texture + sampler bind group (group 1).
    pub fn glyph_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.glyph_bind_group_layout
    }

    /// Sets a uniform by name. The value reaches the GPU on the next
    /// [`Self::flush`].
    pub fn set_uniform(&mut self, name: &str, value: &[f32]) -> Result<(), ShaderError> {
        self.uniforms.set(name, value)
    }

    pub fn set_color(&mut self, color: [f32; 3]) {
        if let Err(e) = self.set_uniform(TEXT_COLOR_UNIFORM, &color) {
            log::error!("Failed to set text color: {}", e);
        }
    }

    pub fn set_projection(&mut self, projection: &Matrix4<f32>) {
        if let Err(e) = self.set_uniform(PROJECTION_UNIFORM, projection.as_slice()) {
            log::error!("Failed to set projection: {}", e);
        }
    }

    pub fn supports_wireframe(&self) -> bool {
        self.wireframe_pipeline.is_some()
    }

    /// Switches between filled and line polygons. Returns `false` when the
    /// device cannot draw lines.
    pub fn set_wireframe(&mut self, enabled: bool) -> bool {
        if enabled && self.wireframe_pipeline.is_none() {
            return false;
        }
        self.wireframe = enabled;
        true
    }

    /// Records a copy of the uniform block into the GPU buffer if it changed.
    ///
    /// The copy goes through the encoder so it is ordered with the render
    /// passes recorded around it.
    pub fn flush(&mut self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) {
        if !self.uniforms.dirty {
            return;
        }

        let staging_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Text Uniform Staging Buffer"),
            contents: &self.uniforms.data,
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        encoder.copy_buffer_to_buffer(
            &staging_buffer,
            0,
            &self.uniform_buffer,
            0,
            UNIFORM_BLOCK_SIZE as u64,
        );

        self.uniforms.dirty = false;
    }

    /// Makes this program current in `rpass` and binds the uniform block.
    pub fn activate(&self, rpass: &mut wgpu::RenderPass<'_>) {
        let pipeline = match (&self.wireframe_pipeline, self.wireframe) {
            (Some(wireframe), true) => wireframe,
            _ => &self.pipeline,
        };
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &self.uniform_bind_group, &[]);
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Text Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
