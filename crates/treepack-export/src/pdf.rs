//! Paginated PDF rendering with atomic persistence.

use std::fmt::Write as _;
use std::path::Path;

use printpdf::path::PaintMode;
use printpdf::{BuiltinFont, Color, Mm, PdfDocument, Rect, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::atomic::{WriteError, write_atomic};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 12.0;
const LINE_HEIGHT_MM: f32 = 4.5;
const FONT_SIZE_PT: f32 = 9.0;
const FOOTER_Y_MM: f32 = 7.0;
const MAX_COLS: usize = 160;
const LINES_PER_PAGE: usize = 60;
const TAB_WIDTH: usize = 4;

// Background/foreground palettes, 0-255 channels.
const LIGHT_BG: (u8, u8, u8) = (255, 255, 255);
const LIGHT_FG: (u8, u8, u8) = (20, 22, 28);
const DARK_BG: (u8, u8, u8) = (24, 26, 32);
const DARK_FG: (u8, u8, u8) = (235, 235, 235);

/// Rendering options for PDF documents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    /// Dark background palette.
    pub dark: bool,
    /// Prefix each input line with a right-aligned counter.
    pub line_numbers: bool,
    /// Centered "current/total" footer on every page.
    pub page_numbers: bool,
}

/// Errors from PDF rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Document font could not be registered.
    #[error("Failed to set up document font: {source}")]
    Font {
        #[source]
        source: printpdf::Error,
    },

    /// Document bytes could not be encoded.
    #[error("Failed to encode document: {source}")]
    Encode {
        #[source]
        source: printpdf::Error,
    },

    /// The rendered document could not be persisted.
    #[error(transparent)]
    Persist(#[from] WriteError),
}

/// Renders plain text into paginated, monospace-styled PDF documents.
pub struct PdfRenderer;

impl PdfRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render `text` and return the encoded document bytes.
    pub fn render(&self, text: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        let pages = paginate(text, options);
        debug!(pages = pages.len(), "rendering document");
        emit(&pages, options)
    }

    /// Render `text` and atomically persist the document at `dest`.
    pub fn render_atomic(
        &self,
        text: &str,
        options: &PdfOptions,
        dest: &Path,
    ) -> Result<(), RenderError> {
        let bytes = self.render(text, options)?;
        write_atomic(dest, &bytes)?;
        Ok(())
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the text pipeline: sanitize, number, wrap, then split into pages.
fn paginate(text: &str, options: &PdfOptions) -> Vec<Vec<String>> {
    let clean = sanitize(text);
    let numbered = if options.line_numbers {
        number_lines(&clean)
    } else {
        clean
    };
    let lines = soft_wrap(&numbered, MAX_COLS);
    lines
        .chunks(LINES_PER_PAGE)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Replace every character that is not printable ASCII (and not a line
/// break or tab) with an escaped code-point placeholder; normalize CR/CRLF
/// to LF and expand tabs.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\n' => out.push('\n'),
            '\t' => {
                for _ in 0..TAB_WIDTH {
                    out.push(' ');
                }
            }
            '\u{20}'..='\u{7e}' => out.push(c),
            other => {
                let _ = write!(out, "<U+{:04X}>", other as u32);
            }
        }
    }
    out
}

/// Prefix each line with a fixed-width, right-aligned, one-based counter.
fn number_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        let _ = writeln!(out, "{:>6}  {}", i + 1, line);
    }
    out
}

/// Split lines longer than `width` columns at the column boundary,
/// preserving every character.
fn soft_wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            out.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            out.push(chunk.iter().collect());
        }
    }
    out
}

fn palette_color(channels: (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(channels.0) / 255.0,
        f32::from(channels.1) / 255.0,
        f32::from(channels.2) / 255.0,
        None,
    ))
}

/// Width of `text` in millimeters at the given Courier size (Courier
/// advance width is 600/1000 em).
fn text_width_mm(text: &str, font_size_pt: f32) -> f32 {
    const PT_TO_MM: f32 = 25.4 / 72.0;
    text.chars().count() as f32 * font_size_pt * 0.6 * PT_TO_MM
}

/// Emit paginated lines as a PDF document.
fn emit(pages: &[Vec<String>], options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
    let (bg, fg) = if options.dark {
        (DARK_BG, DARK_FG)
    } else {
        (LIGHT_BG, LIGHT_FG)
    };

    let (doc, first_page, first_layer) = PdfDocument::new(
        "treepack export",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "content",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|source| RenderError::Font { source })?;

    let total = pages.len();
    for (index, lines) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content")
        };
        let layer = doc.get_page(page).get_layer(layer);

        layer.set_fill_color(palette_color(bg));
        layer.add_rect(
            Rect::new(Mm(0.0), Mm(0.0), Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM))
                .with_mode(PaintMode::Fill),
        );

        layer.set_fill_color(palette_color(fg));
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        for line in lines {
            if !line.is_empty() {
                layer.use_text(line.clone(), FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
            }
            y -= LINE_HEIGHT_MM;
        }

        if options.page_numbers {
            let label = format!("{}/{}", index + 1, total);
            let x = (PAGE_WIDTH_MM - text_width_mm(&label, FONT_SIZE_PT)) / 2.0;
            layer.use_text(label, FONT_SIZE_PT, Mm(x), Mm(FOOTER_Y_MM), &font);
        }
    }

    doc.save_to_bytes()
        .map_err(|source| RenderError::Encode { source })
}
