//! Line-scoped lexer for the generated course markdown.
//!
//! The generation prompt commits the service to a fixed tag grammar on top of
//! plain markdown. This lexer turns the raw text into a `Vec<CourseBlock>` the
//! renderer can draw directly, with every custom tag recognised on its own
//! line:
//!
//! - `[NIVEL ASIGNADO: …]` — hoisted into document metadata, not a block.
//! - `> **[DECLARACIÓN DE METADATOS: …]**` — developer-facing preamble, stripped.
//! - `[PROGRESO: n]` / `[PROGRESS: n]` — progress checkpoint, clamped to 0–100.
//! - `[TAG DE DIAGRAMA: …]` — diagram placeholder (nothing is fetched).
//! - `[RECURSO: tipo | título]`, `[Documentación Oficial: …]`,
//!   `[Artículo Técnico: …]` — simulated citations, never hyperlinks.
//! - ```` ```quiz ```` fences — JSON quiz definitions; malformed JSON drops
//!   the block silently (logged, never fatal).
//! - `> **[BOTÓN: …]**` — the SPA's back button, stripped (back is a key).
//! - `[[Término]]` / `[[Término|Definición]]` — inline glossary spans.
//!
//! Tag interpretation applies only to plain-paragraph lines; inside code
//! fences everything is literal.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Tooltip text for a glossary term that carries no definition.
pub const GLOSSARY_FALLBACK: &str = "Definición disponible en el curso completo.";

static LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[NIVEL ASIGNADO:\s*(.+?)\s*\]\s*$").unwrap());
static METADATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*>?\s*\*\*\[DECLARACIÓN DE METADATOS:").unwrap());
static BACK_BUTTON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*>?\s*\*\*\[BOTÓN:.*\]\*\*\s*$").unwrap());
static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[\s*(?:PROGRESO|PROGRESS)\s*:\s*(-?\d+)\s*\]\s*$").unwrap()
});
static DIAGRAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[TAG DE DIAGRAMA:\s*(.+?)\s*\]\s*$").unwrap());
static RESOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[RECURSO:\s*(.+?)\s*\|\s*(.+?)\s*\]\s*$").unwrap());
static RESOURCE_SHORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[(Documentación Oficial|Artículo Técnico):\s*(.+?)\s*\]\s*$").unwrap()
});
static GLOSSARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]|]+?)(?:\|([^\[\]]+?))?\]\]").unwrap());
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*]|\d+\.)\s+(.*)$").unwrap());

/// One question inside a ```quiz fence.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
    pub explanation: String,
}

/// An inline run within a paragraph or bullet line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    /// A glossary term; `definition` is `None` for the bare `[[Term]]` form.
    Glossary { term: String, definition: Option<String> },
}

/// A typed block of course content, in document order.
#[derive(Debug, Clone)]
pub enum CourseBlock {
    /// Markdown heading; `level` is the number of `#` characters (1–6).
    Heading { level: u8, text: String },
    Paragraph(Vec<Inline>),
    Bullet(Vec<Inline>),
    Quote(String),
    /// A fenced code block other than ```quiz.
    Code { language: String, body: String },
    /// Progress checkpoint; `percent` is already clamped to 0–100.
    Progress { percent: u8 },
    Diagram { description: String },
    /// A simulated citation: kind is e.g. "Documentación Oficial".
    Resource { kind: String, title: String },
    Quiz(Vec<QuizItem>),
}

/// A glossary term collected while lexing, for tooltip cycling.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: Option<String>,
}

/// The lexed course: hoisted metadata plus the renderable block sequence.
#[derive(Debug, Clone, Default)]
pub struct CourseDocument {
    /// Level label from the `[NIVEL ASIGNADO: …]` header, if present.
    pub level: Option<String>,
    pub blocks: Vec<CourseBlock>,
    /// Every glossary term in document order (first occurrence wins).
    pub glossary: Vec<GlossaryEntry>,
}

/// Lexes the raw course markdown into a [`CourseDocument`].
///
/// Never fails: unknown constructs degrade to plain paragraphs, and a
/// malformed quiz fence is dropped with a warning.
pub fn lex(markdown: &str) -> CourseDocument {
    let mut doc = CourseDocument::default();
    let mut lines = markdown.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        // Fenced code: consume until the closing fence (or EOF).
        if let Some(rest) = trimmed.strip_prefix("```") {
            let language = rest.trim().to_owned();
            let mut body_lines: Vec<&str> = Vec::new();
            for body_line in lines.by_ref() {
                if body_line.trim().starts_with("```") {
                    break;
                }
                body_lines.push(body_line);
            }
            let body = body_lines.join("\n");
            if language.eq_ignore_ascii_case("quiz") {
                if let Some(items) = parse_quiz(&body) {
                    doc.blocks.push(CourseBlock::Quiz(items));
                }
            } else {
                doc.blocks.push(CourseBlock::Code { language, body });
            }
            continue;
        }

        // Stripped metadata lines.
        if METADATA_RE.is_match(trimmed) || BACK_BUTTON_RE.is_match(trimmed) {
            continue;
        }
        if let Some(caps) = LEVEL_RE.captures(trimmed) {
            if doc.level.is_none() {
                doc.level = Some(caps[1].to_owned());
            }
            continue;
        }

        // Single-line custom tags.
        if let Some(caps) = PROGRESS_RE.captures(trimmed) {
            let raw: i64 = caps[1].parse().unwrap_or(0);
            let percent = raw.clamp(0, 100) as u8;
            doc.blocks.push(CourseBlock::Progress { percent });
            continue;
        }
        if let Some(caps) = DIAGRAM_RE.captures(trimmed) {
            doc.blocks.push(CourseBlock::Diagram { description: caps[1].to_owned() });
            continue;
        }
        if let Some(caps) = RESOURCE_RE.captures(trimmed) {
            doc.blocks.push(CourseBlock::Resource {
                kind: caps[1].to_owned(),
                title: caps[2].to_owned(),
            });
            continue;
        }
        if let Some(caps) = RESOURCE_SHORT_RE.captures(trimmed) {
            doc.blocks.push(CourseBlock::Resource {
                kind: caps[1].to_owned(),
                title: caps[2].to_owned(),
            });
            continue;
        }

        // Standard markdown structure.
        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|&c| c == '#').count().min(6) as u8;
            let text = trimmed.trim_start_matches('#').trim().to_owned();
            doc.blocks.push(CourseBlock::Heading { level, text });
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('>') {
            doc.blocks.push(CourseBlock::Quote(rest.trim().to_owned()));
            continue;
        }
        if let Some(caps) = BULLET_RE.captures(trimmed) {
            let inlines = parse_inlines(&caps[1], &mut doc.glossary);
            doc.blocks.push(CourseBlock::Bullet(inlines));
            continue;
        }

        let inlines = parse_inlines(trimmed, &mut doc.glossary);
        doc.blocks.push(CourseBlock::Paragraph(inlines));
    }

    doc
}

/// Splits a plain-text line into text runs and glossary spans, recording each
/// first-seen term in the document glossary.
fn parse_inlines(line: &str, glossary: &mut Vec<GlossaryEntry>) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut last_end = 0;

    for caps in GLOSSARY_RE.captures_iter(line) {
        let whole = caps.get(0).unwrap();
        if whole.start() > last_end {
            inlines.push(Inline::Text(line[last_end..whole.start()].to_owned()));
        }
        let term = caps[1].trim().to_owned();
        let definition = caps.get(2).map(|m| m.as_str().trim().to_owned());
        if !glossary.iter().any(|e| e.term == term) {
            glossary.push(GlossaryEntry { term: term.clone(), definition: definition.clone() });
        }
        inlines.push(Inline::Glossary { term, definition });
        last_end = whole.end();
    }

    if last_end < line.len() {
        inlines.push(Inline::Text(line[last_end..].to_owned()));
    }
    inlines
}

/// Parses a ```quiz fence body. Returns `None` (block dropped) when the JSON
/// does not parse or no item survives shape validation.
fn parse_quiz(body: &str) -> Option<Vec<QuizItem>> {
    let items: Vec<QuizItem> = match serde_json::from_str(body) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "malformed quiz JSON, dropping block");
            return None;
        }
    };
    let valid: Vec<QuizItem> = items
        .into_iter()
        .filter(|q| {
            let ok = q.options.len() >= 2 && q.correct_answer < q.options.len();
            if !ok {
                tracing::warn!(question = %q.question, "quiz item fails shape check, skipping");
            }
            ok
        })
        .collect();
    if valid.is_empty() {
        None
    } else {
        Some(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_parses_regardless_of_whitespace() {
        for text in ["[PROGRESO: 40]", "[ PROGRESO :40 ]", "  [PROGRESS:  40]  "] {
            let doc = lex(text);
            assert_eq!(doc.blocks.len(), 1, "input: {text:?}");
            match &doc.blocks[0] {
                CourseBlock::Progress { percent } => assert_eq!(*percent, 40),
                other => panic!("expected progress block, got {other:?}"),
            }
        }
    }

    #[test]
    fn progress_clamps_out_of_range_values() {
        let doc = lex("[PROGRESO: 250]\n[PROGRESO: -10]");
        match (&doc.blocks[0], &doc.blocks[1]) {
            (CourseBlock::Progress { percent: a }, CourseBlock::Progress { percent: b }) => {
                assert_eq!(*a, 100);
                assert_eq!(*b, 0);
            }
            other => panic!("expected two progress blocks, got {other:?}"),
        }
    }

    #[test]
    fn level_header_is_hoisted_not_rendered() {
        let doc = lex("[NIVEL ASIGNADO: Intermedio]\n## Bloque 1");
        assert_eq!(doc.level.as_deref(), Some("Intermedio"));
        assert_eq!(doc.blocks.len(), 1);
        assert!(matches!(doc.blocks[0], CourseBlock::Heading { level: 2, .. }));
    }

    #[test]
    fn metadata_and_back_button_lines_are_stripped() {
        let markdown = "\
> **[DECLARACIÓN DE METADATOS: instrucciones para el desarrollador.]**
Contenido real.
> **[BOTÓN: Volver a las 10 Variaciones de Lección anteriores]**";
        let doc = lex(markdown);
        assert_eq!(doc.blocks.len(), 1);
        assert!(matches!(doc.blocks[0], CourseBlock::Paragraph(_)));
    }

    #[test]
    fn both_resource_forms_lex_to_resource_blocks() {
        let doc = lex(
            "[RECURSO: Documentación Oficial | Deployment Pipelines]\n\
             [Artículo Técnico: Medallion Architecture]",
        );
        match &doc.blocks[0] {
            CourseBlock::Resource { kind, title } => {
                assert_eq!(kind, "Documentación Oficial");
                assert_eq!(title, "Deployment Pipelines");
            }
            other => panic!("expected resource, got {other:?}"),
        }
        match &doc.blocks[1] {
            CourseBlock::Resource { kind, title } => {
                assert_eq!(kind, "Artículo Técnico");
                assert_eq!(title, "Medallion Architecture");
            }
            other => panic!("expected resource, got {other:?}"),
        }
    }

    #[test]
    fn diagram_tag_keeps_its_description() {
        let doc = lex("[TAG DE DIAGRAMA: flujo de datos bronze-silver-gold]");
        match &doc.blocks[0] {
            CourseBlock::Diagram { description } => {
                assert_eq!(description, "flujo de datos bronze-silver-gold");
            }
            other => panic!("expected diagram, got {other:?}"),
        }
    }

    #[test]
    fn glossary_spans_with_and_without_definition() {
        let doc = lex("Un [[Lakehouse|Almacén unificado]] combina lo mejor de un [[Warehouse]].");
        let CourseBlock::Paragraph(inlines) = &doc.blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(inlines.len(), 4);
        assert_eq!(
            inlines[1],
            Inline::Glossary {
                term: "Lakehouse".to_owned(),
                definition: Some("Almacén unificado".to_owned())
            }
        );
        assert_eq!(
            inlines[3],
            Inline::Glossary { term: "Warehouse".to_owned(), definition: None }
        );
        assert_eq!(doc.glossary.len(), 2);
        assert_eq!(doc.glossary[1].definition, None);
    }

    #[test]
    fn well_formed_quiz_fence_yields_quiz_block() {
        let markdown = "\
```quiz
[{\"question\": \"¿Qué es DAX?\", \"options\": [\"a\", \"b\", \"c\"], \"correctAnswer\": 1, \"explanation\": \"porque sí\"}]
```";
        let doc = lex(markdown);
        match &doc.blocks[0] {
            CourseBlock::Quiz(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].correct_answer, 1);
            }
            other => panic!("expected quiz, got {other:?}"),
        }
    }

    #[test]
    fn malformed_quiz_json_drops_the_block() {
        let doc = lex("```quiz\nnot json at all\n```\nSiguiente párrafo.");
        assert_eq!(doc.blocks.len(), 1);
        assert!(matches!(doc.blocks[0], CourseBlock::Paragraph(_)));
    }

    #[test]
    fn quiz_items_with_bad_indices_are_skipped() {
        let markdown = "\
```quiz
[{\"question\": \"q1\", \"options\": [\"a\", \"b\"], \"correctAnswer\": 5, \"explanation\": \"e\"},
 {\"question\": \"q2\", \"options\": [\"a\", \"b\"], \"correctAnswer\": 0, \"explanation\": \"e\"}]
```";
        let doc = lex(markdown);
        match &doc.blocks[0] {
            CourseBlock::Quiz(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].question, "q2");
            }
            other => panic!("expected quiz, got {other:?}"),
        }
    }

    #[test]
    fn non_quiz_fences_stay_code_blocks() {
        let doc = lex("```powershell\nGet-ChildItem\n```");
        match &doc.blocks[0] {
            CourseBlock::Code { language, body } => {
                assert_eq!(language, "powershell");
                assert_eq!(body, "Get-ChildItem");
            }
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn bullets_and_quotes_are_structural() {
        let doc = lex("- primer punto\n1. segundo punto\n> una cita");
        assert!(matches!(doc.blocks[0], CourseBlock::Bullet(_)));
        assert!(matches!(doc.blocks[1], CourseBlock::Bullet(_)));
        assert!(matches!(doc.blocks[2], CourseBlock::Quote(_)));
    }
}
