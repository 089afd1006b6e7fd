use crate::error::Res;
use crate::export::{Cell, Table};
use anyhow::anyhow;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::ops::Range;

// A4 portrait, in millimetres.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;

const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const TITLE_HEIGHT: f32 = 10.0;
const SUBTITLE_HEIGHT: f32 = 8.0;
const ROW_HEIGHT: f32 = 7.0;

/// Approximate advance of one Helvetica character at `BODY_SIZE`, used to clip long cells.
const CHAR_WIDTH: f32 = 1.9;

/// A title, an optional subtitle, then the table. The header row is repeated at the top of every
/// page.
pub(super) fn render(table: &Table) -> Res<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        table.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("Unable to load Helvetica: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("Unable to load Helvetica Bold: {e}"))?;

    let columns = Columns::new(table.headers.len());
    let mut y = PAGE_HEIGHT - MARGIN;
    let mut layer = doc.get_page(page).get_layer(layer);

    layer.use_text(table.title.as_str(), TITLE_SIZE, Mm(MARGIN), Mm(y), &bold);
    y -= TITLE_HEIGHT;
    if let Some(subtitle) = &table.subtitle {
        layer.use_text(subtitle.as_str(), SUBTITLE_SIZE, Mm(MARGIN), Mm(y), &regular);
        y -= SUBTITLE_HEIGHT;
    }

    let pages = paginate(table.rows.len(), rows_fitting(y), rows_fitting(PAGE_HEIGHT - MARGIN));
    for (n, range) in pages.into_iter().enumerate() {
        if n > 0 {
            let (page, index) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(index);
            y = PAGE_HEIGHT - MARGIN;
        }
        let headers: Vec<&str> = table.headers.iter().map(String::as_str).collect();
        draw_row(&layer, &columns, &headers, y, &bold);
        y -= ROW_HEIGHT;
        for cells in &table.rows[range] {
            let texts: Vec<String> = cells.iter().map(Cell::text).collect();
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            draw_row(&layer, &columns, &texts, y, &regular);
            y -= ROW_HEIGHT;
        }
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow!("Unable to write the PDF document: {e}"))
}

/// Evenly spaced columns across the printable width.
struct Columns {
    width: f32,
    count: usize,
}

impl Columns {
    fn new(count: usize) -> Self {
        let count = count.max(1);
        Self {
            width: (PAGE_WIDTH - 2.0 * MARGIN) / count as f32,
            count,
        }
    }

    fn x(&self, i: usize) -> f32 {
        MARGIN + self.width * i as f32
    }

    fn max_chars(&self) -> usize {
        ((self.width - 2.0) / CHAR_WIDTH).max(1.0) as usize
    }
}

fn draw_row(
    layer: &PdfLayerReference,
    columns: &Columns,
    texts: &[&str],
    y: f32,
    font: &IndirectFontRef,
) {
    for (i, text) in texts.iter().take(columns.count).enumerate() {
        let text = clip(text, columns.max_chars());
        layer.use_text(text, BODY_SIZE, Mm(columns.x(i)), Mm(y), font);
    }
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// How many rows, header included, fit between `top` and the bottom margin.
fn rows_fitting(top: f32) -> usize {
    (((top - MARGIN) / ROW_HEIGHT).floor().max(0.0)) as usize
}

/// Splits `rows` data rows into pages. Each page spends one line on the header. The first page
/// has less room because of the title block. There is always at least one page.
fn paginate(rows: usize, first_page_lines: usize, page_lines: usize) -> Vec<Range<usize>> {
    let first = first_page_lines.saturating_sub(1).max(1);
    let rest = page_lines.saturating_sub(1).max(1);
    let mut pages = vec![0..rows.min(first)];
    let mut start = rows.min(first);
    while start < rows {
        let end = (start + rest).min(rows);
        pages.push(start..end);
        start = end;
    }
    pages
}
