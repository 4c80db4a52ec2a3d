//! DHAT heap profiler for flowtext.
//!
//! Profiles allocation patterns of a layout pass over synthetic documents:
//! shape -> analyze -> layout.
//!
//! Usage:
//!   cargo run -p flowtext-heap-profile --release -- [OPTIONS] [DOCUMENTS...]
//!
//! Outputs dhat-<phase>-<document>.json files in the output directory
//! (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::process::Command;

use flowtext::{
    analyze_words, BlockInfo, FlowChunk, FlowConfig, FlowEngine, FlowRegion, FontSpec,
    HeuristicFonts, HeuristicShaper, Point, RenderContext, TextAlign, TextBuilder,
};

const COLUMN_WIDTH: f32 = 460.0;
const COLUMN_HEIGHT: f32 = 760.0;

/// (name, paragraphs, words per paragraph)
const DOCUMENTS: &[(&str, usize, usize)] = &[
    ("short-note", 4, 40),
    ("article", 40, 120),
    ("chapter", 200, 150),
];

const VOCABULARY: &[&str] = &[
    "regions", "accept", "poured", "lines", "of", "text", "while", "words", "keep", "their",
    "glyph", "groups", "to\u{00AD}gether", "and", "soft", "hyphens",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Analyze,
    Layout,
    Full,
}

impl Phase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "analyze" => Some(Self::Analyze),
            "layout" => Some(Self::Layout),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::Layout => "layout",
            Self::Full => "full",
        }
    }
}

fn build_document(fonts: &HeuristicFonts, paragraphs: usize, words: usize) -> Vec<FlowChunk> {
    let shaper = HeuristicShaper::new(fonts).with_ligature("fi");
    let block = BlockInfo {
        bottom_margin: 8.0,
        indent: 16.0,
        align: TextAlign::Full,
        ..BlockInfo::default()
    };
    (0..paragraphs)
        .map(|p| {
            let mut body = String::with_capacity(words * 8);
            for w in 0..words {
                if w > 0 {
                    body.push(' ');
                }
                body.push_str(VOCABULARY[(w * 3 + p * 5) % VOCABULARY.len()]);
            }
            let text = TextBuilder::new()
                .block(block)
                .push_run(&body, FontSpec::new(0, 14.0), 18.0)
                .build();
            FlowChunk::new(shaper.shape(&text), text)
        })
        .collect()
}

fn regions(count: usize) -> Vec<FlowRegion> {
    (0..count)
        .map(|c| {
            if c % 2 == 0 {
                FlowRegion::rect(c as f32 * 500.0, 0.0, COLUMN_WIDTH, COLUMN_HEIGHT)
            } else {
                let x = c as f32 * 500.0;
                FlowRegion::polygon(vec![
                    Point::new(x, 0.0),
                    Point::new(x + COLUMN_WIDTH, 0.0),
                    Point::new(x + COLUMN_WIDTH * 0.6, COLUMN_HEIGHT),
                    Point::new(x, COLUMN_HEIGHT),
                ])
            }
        })
        .collect()
}

fn profile_document(name: &str, phase: Phase) {
    let Some(&(_, paragraphs, words)) = DOCUMENTS.iter().find(|(n, _, _)| *n == name) else {
        eprintln!("Unknown document: {}", name);
        std::process::exit(1);
    };
    let fonts = HeuristicFonts::proportional();
    let engine = FlowEngine::new(FlowConfig::default());

    match phase {
        Phase::Analyze => {
            let chunks = build_document(&fonts, paragraphs, words);
            let ctx = RenderContext::default();
            let total: usize = chunks
                .iter()
                .map(|c| analyze_words(c.glyphs(), c.text(), &fonts, &ctx).words().len())
                .sum();
            if total == 0 {
                panic!("document {} produced zero words", name);
            }
        }
        Phase::Layout => {
            let mut chunks = build_document(&fonts, paragraphs, words);
            let regions = regions(64);
            let outcome = engine
                .layout(&mut chunks, &regions, &fonts)
                .unwrap_or_else(|e| panic!("layout {}: {}", name, e));
            if outcome.lines.is_empty() {
                panic!("document {} produced zero lines", name);
            }
        }
        Phase::Full => {
            // Re-flow the same chunks into progressively more regions, as a
            // viewer does while its window grows.
            let mut chunks = build_document(&fonts, paragraphs, words);
            for count in [1usize, 4, 16, 64] {
                let regions = regions(count);
                engine
                    .layout(&mut chunks, &regions, &fonts)
                    .unwrap_or_else(|e| panic!("layout {} into {} regions: {}", name, count, e));
            }
        }
    }
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [DOCUMENTS...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --phase <analyze|layout|full>  Pipeline phase to profile (default: layout)");
    eprintln!("  --out-dir <DIR>                Output directory for dhat JSON (default: target/memory)");
    eprintln!("  --aggregate                    Single profile for all documents (default: per-document)");
    eprintln!();
    eprintln!("Documents: short-note, article, chapter (default: all).");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut phase = Phase::Layout;
    let mut out_dir = PathBuf::from("target/memory");
    let mut documents: Vec<String> = Vec::with_capacity(DOCUMENTS.len());
    let mut aggregate = false;
    // Internal flag: when set, we're a child process profiling a single document.
    let mut single_mode = false;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                phase = args
                    .get(i)
                    .and_then(|p| Phase::from_str(p))
                    .unwrap_or_else(|| {
                        eprintln!("Unknown phase: {}", args.get(i).map_or("", String::as_str));
                        usage();
                        std::process::exit(1);
                    });
            }
            "--out-dir" => {
                i += 1;
                let Some(dir) = args.get(i) else {
                    usage();
                    std::process::exit(1);
                };
                out_dir = PathBuf::from(dir);
            }
            "--aggregate" => {
                aggregate = true;
            }
            "--single" => {
                single_mode = true;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => {
                documents.push(other.to_string());
            }
        }
        i += 1;
    }

    if documents.is_empty() {
        documents.extend(DOCUMENTS.iter().map(|(name, _, _)| name.to_string()));
    }

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", out_dir.display(), e);
        std::process::exit(1);
    });

    let phase_name = phase.name();

    if single_mode {
        assert!(documents.len() == 1, "--single expects exactly one document");
        let name = &documents[0];
        let json_path = out_dir.join(format!("dhat-{phase_name}-{name}.json"));
        let _profiler = dhat::Profiler::builder().file_name(json_path).build();
        profile_document(name, phase);
        return;
    }

    if aggregate {
        let json_path = out_dir.join(format!("dhat-{phase_name}.json"));
        eprintln!(
            "heap-profile: phase={}, documents={} (aggregate), out={}",
            phase_name,
            documents.len(),
            out_dir.display()
        );
        let _profiler = dhat::Profiler::builder()
            .file_name(json_path.clone())
            .build();
        for name in &documents {
            eprintln!("  profiling: {}", name);
            profile_document(name, phase);
        }
        eprintln!(
            "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
            json_path.display()
        );
        return;
    }

    // Per-document mode: one child process each for clean DHAT sessions.
    let self_exe = std::env::current_exe().unwrap_or_else(|e| {
        eprintln!("Failed to determine own executable path: {}", e);
        std::process::exit(1);
    });

    eprintln!(
        "heap-profile: phase={}, documents={} (per-document), out={}",
        phase_name,
        documents.len(),
        out_dir.display()
    );

    let mut any_failed = false;
    for name in &documents {
        eprintln!("  profiling: {} -> dhat-{}-{}.json", name, phase_name, name);
        let status = Command::new(&self_exe)
            .arg("--single")
            .arg("--phase")
            .arg(phase_name)
            .arg("--out-dir")
            .arg(&out_dir)
            .arg(name)
            .status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                eprintln!("    FAILED (exit {})", s.code().unwrap_or(-1));
                any_failed = true;
            }
            Err(e) => {
                eprintln!("    FAILED to spawn: {}", e);
                any_failed = true;
            }
        }
    }

    eprintln!();
    eprintln!("Profiles saved to {}", out_dir.display());
    eprintln!("Open in https://nnethercote.github.io/dh_view/dh_view.html");

    if any_failed {
        std::process::exit(1);
    }
}
