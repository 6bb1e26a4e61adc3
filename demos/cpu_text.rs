use image::{ImageBuffer, Luma};
use quadtext::{
    CpuRenderer, FontStorage, GlyphCacheConfig, GlyphTextureCache, MissingGlyphPolicy,
    TextRenderer, TextRendererConfig,
    fontdb::{self, Family, Query},
};

const WIDTH: usize = 640;
const HEIGHT: usize = 160;

fn pick_system_font(font_storage: &mut FontStorage) -> fontdb::ID {
    font_storage.load_system_fonts();
    assert!(
        !font_storage.is_empty(),
        "system fonts are required for the cpu text demo"
    );

    const FAMILIES: &[Family<'_>] = &[Family::SansSerif];
    let query = Query {
        families: FAMILIES,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };

    if let Ok((font_id, _)) = font_storage.query(&query) {
        return font_id;
    }

    font_storage
        .faces()
        .next()
        .map(|face| face.id)
        .expect("no usable fonts registered in FontStorage")
}

#[allow(clippy::unwrap_used)]
fn main() {
    env_logger::init();

    let mut font_storage = FontStorage::new();
    let font_id = match std::env::args().nth(1) {
        Some(path) => font_storage.load_font_file(path).unwrap(),
        None => pick_system_font(&mut font_storage),
    };
    let font = font_storage.font(font_id).unwrap();

    let mut cpu = CpuRenderer::new(WIDTH, HEIGHT);
    let cache =
        GlyphTextureCache::build(&font, &GlyphCacheConfig::default(), &mut cpu).unwrap();
    println!("cached {} glyphs", cache.len());

    // non-ASCII characters are outside the cache; keep a gap for them
    let renderer = TextRenderer::new(TextRendererConfig {
        missing_glyph: MissingGlyphPolicy::Advance(16.0),
    });

    let pen = renderer.render_text(&cache, "ABC abc", 25.0, 90.0, 1.0, [1.0; 3], &mut cpu);
    renderer.render_text(&cache, " \u{e9}t\u{e9}", pen.x(), pen.y(), 1.0, [1.0; 3], &mut cpu);
    renderer.render_text(&cache, "half size", 25.0, 30.0, 0.5, [1.0; 3], &mut cpu);

    println!("{} draw calls", cpu.draw_calls());

    let bitmap = cpu.into_bitmap();

    std::fs::create_dir_all("debug").expect("failed to create debug directory");

    let img_buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(bitmap.width as u32, bitmap.height as u32, bitmap.pixels)
            .expect("failed to create image buffer");

    img_buffer
        .save("debug/cpu_text.png")
        .expect("failed to save image");

    println!("Saved rendered image to debug/cpu_text.png");
}
