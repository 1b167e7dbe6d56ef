use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::error::OcrError;

use super::{BoundingRegion, OcrGateway, TextToken};

/// Tesseract-backed [`OcrGateway`].
///
/// Cheap to clone; a fresh engine instance is created per call so the
/// gateway can be shared across worker threads.
#[derive(Clone)]
pub struct TesseractOcr {
    inner: Arc<TesseractOcrInner>,
}

struct TesseractOcrInner {
    languages: String,
    dpi: u32,
}

impl TesseractOcr {
    pub fn new(languages: &[String], dpi: u32) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(TesseractOcrInner {
                languages: lang_str,
                dpi,
            }),
        }
    }

    pub fn from_config(config: &crate::config::OcrConfig) -> Self {
        Self::new(&config.languages, config.dpi)
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }

    fn annotate_bytes(&self, image_data: &[u8]) -> Result<Vec<TextToken>, OcrError> {
        let _span = tracing::info_span!("ocr.tesseract").entered();

        // Load image
        let img = image::load_from_memory(image_data)
            .map_err(|e| OcrError::DecodeImage(e.to_string()))?;

        // Convert to PNG in memory for leptess
        let mut png_data = Vec::new();
        let mut cursor = Cursor::new(&mut png_data);
        img.write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| OcrError::DecodeImage(format!("Failed to re-encode image: {}", e)))?;

        // Create Tesseract instance
        let mut lt = leptess::LepTess::new(None, &self.inner.languages)
            .map_err(|e| OcrError::EngineInit(e.to_string()))?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| OcrError::Recognition(format!("Failed to set image: {}", e)))?;
        lt.set_source_resolution(self.inner.dpi as i32);

        // Word-level TSV output carries the bounding boxes the parser needs
        let tsv = lt
            .get_tsv_text(0)
            .map_err(|e| OcrError::Recognition(format!("TSV output failed: {}", e)))?;

        Ok(parse_tsv(&tsv))
    }
}

impl OcrGateway for TesseractOcr {
    fn annotate(&self, photo: &Path) -> Result<Vec<TextToken>, OcrError> {
        let bytes = std::fs::read(photo).map_err(|e| OcrError::ReadPhoto {
            path: photo.to_path_buf(),
            source: e,
        })?;
        self.annotate_bytes(&bytes)
    }
}

/// Parses tesseract TSV output into word tokens, preserving reading order.
///
/// TSV columns: level, page, block, par, line, word, left, top, width,
/// height, conf, text. Word rows have level 5; anything malformed is skipped.
fn parse_tsv(tsv: &str) -> Vec<TextToken> {
    let mut tokens = Vec::new();

    for line in tsv.lines() {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let geometry: Option<Vec<f64>> = cols[6..10].iter().map(|c| c.parse().ok()).collect();
        let Some(g) = geometry else { continue };

        tokens.push(TextToken::new(
            text,
            BoundingRegion::rect(g[0], g[1], g[2], g[3]),
        ));
    }

    tokens
}
