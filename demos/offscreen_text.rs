use std::sync::Arc;

use image::{ImageBuffer, Rgba};
use quadtext::{
    FontStorage, WgpuTextRenderer, WgpuTextRendererConfig,
    fontdb::{self, Family, Query},
    palette::Srgb,
};

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 256;

/// Font given on the command line, or any installed sans-serif face.
fn pick_font(font_storage: &mut FontStorage) -> Arc<quadtext::fontdue::Font> {
    if let Some(path) = std::env::args().nth(1) {
        let id = font_storage
            .load_font_file(&path)
            .expect("failed to load font file");
        return font_storage.font(id).expect("failed to parse font file");
    }

    font_storage.load_system_fonts();

    const FAMILIES: &[Family<'_>] = &[Family::SansSerif];
    let query = Query {
        families: FAMILIES,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };

    font_storage
        .query(&query)
        .map(|(_, font)| font)
        .expect("no usable system font; pass a font file path")
}

#[allow(clippy::unwrap_used)]
fn main() {
    env_logger::init();
    pollster::block_on(run());
}

async fn run() {
    // 1. Setup wgpu
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        flags: wgpu::InstanceFlags::default(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("Failed to find an appropriate adapter");

    // line polygons are optional, ask for them only when the adapter has them
    let required_features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .expect("Failed to create device");

    let device = Arc::new(device);
    let queue = Arc::new(queue);

    // 2. Load the font and build the glyph cache
    let mut font_storage = FontStorage::new();
    let font = pick_font(&mut font_storage);

    let texture_format = wgpu::TextureFormat::Rgba8Unorm;
    let mut renderer = WgpuTextRenderer::new(
        device.clone(),
        queue.clone(),
        texture_format,
        &font,
        WgpuTextRendererConfig {
            viewport: [WIDTH, HEIGHT],
            ..Default::default()
        },
    )
    .expect("failed to create text renderer");

    // 3. Create Target Texture
    let target_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Target Texture"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: texture_format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let target_view = target_texture.create_view(&wgpu::TextureViewDescriptor::default());

    // 4. Render
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Render Encoder"),
    });

    {
        let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.3,
                        g: 0.3,
                        b: 0.3,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    let pen = renderer.render_text(
        &mut encoder,
        &target_view,
        "ABC abc",
        25.0,
        150.0,
        1.5,
        Srgb::new(0.5, 0.8, 0.2),
    );
    renderer.render_text(
        &mut encoder,
        &target_view,
        " chained",
        pen.x(),
        pen.y(),
        1.5,
        Srgb::new(1.0, 1.0, 1.0),
    );

    if renderer.set_wireframe(true).is_ok() {
        renderer.render_text(
            &mut encoder,
            &target_view,
            "wireframe",
            25.0,
            40.0,
            1.0,
            Srgb::new(0.3, 0.7, 0.9),
        );
        renderer.set_wireframe(false).unwrap();
    }

    // 5. Copy to Buffer
    let u32_size = std::mem::size_of::<u32>() as u32;
    let output_buffer_size = (u32_size * WIDTH * HEIGHT) as wgpu::BufferAddress;
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Output Buffer"),
        size: output_buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &target_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(u32_size * WIDTH),
                rows_per_image: Some(HEIGHT),
            },
        },
        wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(Some(encoder.finish()));

    // 6. Read Buffer and Save
    let buffer_slice = output_buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |v| sender.send(v).unwrap());

    instance.poll_all(true);
    receiver.recv().unwrap().unwrap();

    let data = buffer_slice.get_mapped_range();
    let buffer = data.to_vec();
    drop(data);
    output_buffer.unmap();

    std::fs::create_dir_all("debug").expect("failed to create debug directory");

    let img_buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(WIDTH, HEIGHT, buffer).expect("failed to create image buffer");

    img_buffer
        .save("debug/offscreen_text.png")
        .expect("failed to save image");

    println!(
        "Saved rendered image to debug/offscreen_text.png ({} draw calls in the last run)",
        renderer.last_draw_calls()
    );
}
