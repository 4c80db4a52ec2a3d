use flowtext::{
    AttributedText, BlockInfo, FlowChunk, FlowRegion, FontSpec, HeuristicFonts, HeuristicShaper,
    Placement, Point, TextBuilder,
};

/// 10px body font; with [`mono`] every character advances 5px.
pub const BODY: FontSpec = FontSpec::new(0, 10.0);
pub const BODY_LINE: f32 = 10.0;

const VOCABULARY: &[&str] = &[
    "flow", "region", "glyph", "line", "word", "text", "shape", "margin", "baseline", "kerning",
    "ligature", "hyphen", "column", "page", "paragraph", "span",
];

/// Monospace font model: 0.5em advance, ascent 0.8em, descent 0.2em.
pub fn mono() -> HeuristicFonts {
    HeuristicFonts::monospace(0.5)
}

/// Shape `text` into a chunk.
pub fn shaped(fonts: &HeuristicFonts, text: AttributedText) -> FlowChunk {
    let glyphs = HeuristicShaper::new(fonts).shape(&text);
    FlowChunk::new(glyphs, text)
}

/// Single-run chunk in the body font.
pub fn chunk(fonts: &HeuristicFonts, text: &str, block: BlockInfo) -> FlowChunk {
    shaped(
        fonts,
        TextBuilder::new()
            .block(block)
            .push_run(text, BODY, BODY_LINE)
            .build(),
    )
}

/// Deterministic filler text of `words` space-separated words.
pub fn lorem(words: usize, seed: usize) -> String {
    let mut out = String::with_capacity(words * 8);
    for i in 0..words {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(VOCABULARY[(i * 7 + seed * 3) % VOCABULARY.len()]);
    }
    out
}

/// `paragraphs` chunks of filler text with the given block descriptor.
pub fn document(
    fonts: &HeuristicFonts,
    paragraphs: usize,
    words: usize,
    block: BlockInfo,
) -> Vec<FlowChunk> {
    (0..paragraphs)
        .map(|p| chunk(fonts, &lorem(words, p), block))
        .collect()
}

/// 100x100 square with a 40 wide, 60 deep notch cut into the top middle.
pub fn u_region() -> FlowRegion {
    FlowRegion::polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(30.0, 0.0),
        Point::new(30.0, 60.0),
        Point::new(70.0, 60.0),
        Point::new(70.0, 0.0),
        Point::new(100.0, 0.0),
        Point::new(100.0, 100.0),
        Point::new(0.0, 100.0),
    ])
}

/// Panics when a glyph was left undecided by a layout pass.
pub fn assert_all_decided(chunks: &[FlowChunk]) {
    for (c, chunk) in chunks.iter().enumerate() {
        for (g, placement) in chunk.glyphs().placements().enumerate() {
            assert_ne!(
                placement,
                Placement::Pending,
                "chunk {} glyph {} has no placement",
                c,
                g
            );
        }
    }
}

/// Visible X of every glyph of `chunk`.
pub fn visible_xs(chunk: &FlowChunk) -> Vec<Option<f32>> {
    chunk
        .glyphs()
        .placements()
        .map(|p| p.position().map(|pt| pt.x))
        .collect()
}
