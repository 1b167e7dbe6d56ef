//! Annotation parser: turns OCR text tokens into candidate inventory ids.
//!
//! An inventory label is `@` followed by two uppercase letters and four
//! digits (`@AB1234`). Labels arrive from OCR either as one token, or split
//! into a bare `@` token followed by the remainder.

use log::debug;

use crate::ocr::{Point, TextToken};

/// A text fragment matching the inventory-label grammar, before being
/// confirmed as an actual record.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateId {
    pub value: String,
    /// Centroid of the token's bounding region, when the engine reported one.
    pub position: Option<Point>,
}

pub struct AnnotationParser {
    /// Continuation-only gate: a token following a bare `@` must cover at
    /// least this many square pixels to count as a label fragment. Small
    /// decorative marks otherwise produce false `@`-continuations.
    min_continuation_area: f64,
}

impl AnnotationParser {
    pub fn new(min_continuation_area: f64) -> Self {
        Self {
            min_continuation_area,
        }
    }

    pub fn from_config(config: &crate::config::ParserConfig) -> Self {
        Self::new(config.min_continuation_area)
    }

    /// Single ordered scan over the tokens. Deterministic and side-effect
    /// free; every textual occurrence of a label becomes its own candidate.
    pub fn parse(&self, tokens: &[TextToken]) -> Vec<CandidateId> {
        let mut candidates = Vec::new();
        // Position of a bare `@` token awaiting its continuation.
        let mut pending_at: Option<Option<Point>> = None;

        for token in tokens {
            let text = correct_confusables(&token.text);
            let position = token.region.centroid();

            if text == "@" {
                pending_at = Some(position);
                continue;
            }

            if let Some(value) = leading_label(&text) {
                candidates.push(CandidateId {
                    value,
                    position,
                });
            }

            // The pending flag is consumed by this check whether or not the
            // concatenation matches.
            if let Some(at_position) = pending_at.take() {
                let combined: String =
                    std::iter::once('@').chain(text.chars().take(6)).collect();
                if is_label(&combined) {
                    if token.region.area() < self.min_continuation_area {
                        debug!(
                            "Dropping @-continuation '{}': fragment area below {}",
                            combined, self.min_continuation_area
                        );
                    } else {
                        let position = match (at_position, position) {
                            (Some(a), Some(b)) => Some(Point::midpoint(a, b)),
                            (a, b) => a.or(b),
                        };
                        candidates.push(CandidateId {
                            value: combined,
                            position,
                        });
                    }
                }
            }
        }

        candidates
    }
}

/// Compensates for the OCR engine reading the label font's `I` as `l` or `1`.
///
/// 6-character tokens are corrected at index 1 (a label tail `XI1234` read
/// after a bare `@`); 7-character tokens at index 2, triggered by `l` there
/// or by `1` at index 1, matching the deployed recognizer's behavior.
fn correct_confusables(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();

    if chars.len() == 6 && (chars[1] == 'l' || chars[1] == '1') {
        chars[1] = 'I';
    } else if chars.len() == 7 && (chars[2] == 'l' || chars[1] == '1') {
        chars[2] = 'I';
    }

    chars.into_iter().collect()
}

/// Fixed-length character-class check: `@`, two uppercase ASCII letters,
/// four ASCII digits.
fn is_label(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.len() == 7
        && chars[0] == '@'
        && chars[1].is_ascii_uppercase()
        && chars[2].is_ascii_uppercase()
        && chars[3..].iter().all(|c| c.is_ascii_digit())
}

/// The first 7 characters of `text`, when they form a complete label.
fn leading_label(text: &str) -> Option<String> {
    let head: String = text.chars().take(7).collect();
    is_label(&head).then_some(head)
}
