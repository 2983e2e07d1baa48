//! HTTP client for the Gemini `generateContent` REST endpoint.
//!
//! Every flow operation maps to exactly one POST. Structured calls (diagnosis,
//! level, pillars, variations) constrain the response with a JSON schema via
//! `generationConfig`; the course and chat calls take free-form markdown.
//!
//! The service contract is Spanish throughout — the system instruction, the
//! prompts, and the level labels on the wire all follow the tutoring persona.
//! All calls are single-attempt; a 120-second client-wide timeout bounds hung
//! requests.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use mentor_core::types::{
    AnsweredQuestion, ChatMessage, ChatRole, CourseContent, DiagnosisQuestion, KnowledgeFile,
    UserLevel,
};

use crate::gen::types::GenError;

/// How many recent chat turns are replayed as context for a chat reply.
pub const CHAT_CONTEXT_TURNS: usize = 10;

/// Default model when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const SYSTEM_INSTRUCTION: &str = "\
Actuarás como \"Fabric DevOps Expert\" (MentorAI), un consultor senior y mentor experto en la arquitectura de datos moderna de Microsoft Fabric, Power BI y la implementación de prácticas CI/CD (Azure DevOps, Visual Studio Code, PowerShell).
Tu rol también incluye ser el \"Arquitecto de la Experiencia\", definiendo la UI/UX de la aplicación final.
Tu tono es profesional, técnico, didáctico y directo al punto.
Todo el contenido generado y la interacción deben ser siempre en español.
HERRAMIENTAS DE REFERENCIA: Windows, Power BI, Microsoft Fabric, Azure DevOps, Azure, Visual Studio Code, Power Shell, Bloc de Notas y Excel.
RESTRICCIÓN DE FUENTES: No debes mostrar ni hacer referencia a URL/webs verificadas ni a la fuente de la que obtienes la información. Usa referencias simuladas.";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

/// One request part: either text or an inline base64 attachment, never both.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// The `{"level": …}` envelope of the level-evaluation response.
#[derive(Deserialize)]
struct LevelEnvelope {
    level: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Owns the `reqwest::Client` and the credentials for all generation calls.
pub struct GenClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GenClient {
    /// Builds a client with a 120-second request timeout.
    ///
    /// # Errors
    ///
    /// `MissingApiKey` when the key is blank; `Transport` if the underlying
    /// HTTP client cannot be constructed.
    pub fn new(api_key: String, model: String) -> Result<Self, GenError> {
        if api_key.trim().is_empty() {
            return Err(GenError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { http, api_key, model })
    }

    /// Issues one `generateContent` POST and returns the first candidate's
    /// first text part.
    ///
    /// Knowledge files are attached as `inlineData` parts ahead of the prompt
    /// text, matching the service's expectation that grounding documents
    /// precede the instruction.
    async fn generate(
        &self,
        prompt: String,
        files: &[KnowledgeFile],
        generation_config: Option<GenerationConfig>,
    ) -> Result<String, GenError> {
        let mut parts: Vec<Part> = files
            .iter()
            .map(|f| Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: f.mime_type.clone(),
                    data: f.data.clone(),
                }),
            })
            .collect();
        parts.push(Part { text: Some(prompt), inline_data: None });

        let body = GenerateContentRequest {
            system_instruction: Content {
                parts: vec![Part { text: Some(SYSTEM_INSTRUCTION.to_owned()), inline_data: None }],
            },
            contents: vec![Content { parts }],
            generation_config,
        };

        let url = format!(
            "{API_BASE}/{model}:generateContent?key={key}",
            model = self.model,
            key = self.api_key
        );
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::Api { status: status.as_u16(), body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);
        match text {
            Some(t) if !t.trim().is_empty() => Ok(t),
            _ => Err(GenError::EmptyResponse),
        }
    }

    /// Fetches the three diagnosis questions.
    ///
    /// # Errors
    ///
    /// Transport/API errors, or `Schema` when the response is not exactly
    /// three well-formed questions.
    pub async fn diagnosis_questions(
        &self,
        files: &[KnowledgeFile],
    ) -> Result<Vec<DiagnosisQuestion>, GenError> {
        let prompt = "\
Genera 3 preguntas técnicas de selección múltiple para evaluar el nivel de experiencia de un usuario en el ecosistema Microsoft Fabric, Power BI y DevOps.
Las preguntas deben cubrir conceptos generales pero claves para clasificar en Principiante, Intermedio o Avanzado.
Devuelve un JSON array de objetos con: id (number), question (string), options (array of strings), correctAnswer (number, índice de la opción correcta)."
            .to_owned();

        let config = GenerationConfig {
            response_mime_type: "application/json",
            response_schema: json!({
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "INTEGER" },
                        "question": { "type": "STRING" },
                        "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "correctAnswer": { "type": "INTEGER" }
                    },
                    "required": ["id", "question", "options", "correctAnswer"]
                }
            }),
        };

        let text = self.generate(prompt, files, Some(config)).await?;
        parse_questions(&text)
    }

    /// Classifies the user from their diagnosis answers.
    ///
    /// Never fails: any transport, API, or parse problem degrades to
    /// `Beginner`, logged at warn level. A wrong level costs one slightly
    /// mistuned course; a blocked flow costs the whole session.
    pub async fn evaluate_level(
        &self,
        answers: &[AnsweredQuestion],
        files: &[KnowledgeFile],
    ) -> UserLevel {
        let serialized = serde_json::to_string(answers).unwrap_or_else(|_| "[]".to_owned());
        let prompt = format!(
            "Basado en las siguientes respuestas del usuario a preguntas técnicas, determina su nivel (Principiante, Intermedio, Avanzado).\n\
             Respuestas: {serialized}\n\
             Devuelve SOLO un JSON con la propiedad \"level\"."
        );

        let config = GenerationConfig {
            response_mime_type: "application/json",
            response_schema: json!({
                "type": "OBJECT",
                "properties": {
                    "level": {
                        "type": "STRING",
                        "enum": ["Principiante", "Intermedio", "Avanzado"]
                    }
                }
            }),
        };

        match self.generate(prompt, files, Some(config)).await {
            Ok(text) => parse_level(&text).unwrap_or_else(|| {
                tracing::warn!("level response unparseable, defaulting to Beginner");
                UserLevel::Beginner
            }),
            Err(e) => {
                tracing::warn!(error = %e, "level evaluation failed, defaulting to Beginner");
                UserLevel::Beginner
            }
        }
    }

    /// Fetches the ten strategic pillar topics for a submitted topic.
    pub async fn pillars(
        &self,
        topic: &str,
        level: UserLevel,
        files: &[KnowledgeFile],
    ) -> Result<Vec<String>, GenError> {
        let prompt = format!(
            "Tema central: \"{topic}\".\n\
             Nivel del usuario: \"{level}\".\n\
             Genera 10 \"Temas Pilar\" amplios y estratégicos relacionados con el ecosistema Microsoft Fabric/Power BI/DevOps.\n\
             Deben enfocarse en conceptos técnicos clave, componentes de la suite o etapas del ciclo de vida.\n\
             Devuelve SOLO un JSON array de strings.",
            level = level.wire_label()
        );
        let text = self.generate(prompt, files, Some(string_array_config())).await?;
        parse_topic_list(&text)
    }

    /// Fetches the ten lesson variations for a chosen pillar.
    pub async fn variations(
        &self,
        pillar: &str,
        level: UserLevel,
        files: &[KnowledgeFile],
    ) -> Result<Vec<String>, GenError> {
        let prompt = format!(
            "Tema Pilar seleccionado: \"{pillar}\".\n\
             Nivel del usuario: \"{level}\".\n\
             Genera 10 \"Variaciones de Lección\" muy específicas y diferenciadas.\n\
             Deben centrarse en escenarios de uso concretos, herramientas específicas y casos prácticos.\n\
             Devuelve SOLO un JSON array de strings.",
            level = level.wire_label()
        );
        let text = self.generate(prompt, files, Some(string_array_config())).await?;
        parse_topic_list(&text)
    }

    /// Generates the full course markdown for a chosen variation.
    ///
    /// The formatting contract in the prompt (metadata header, progress tags,
    /// glossary terms, simulated resources, quiz code fences, closing button
    /// line) is what `course::lexer` parses on the way back in.
    pub async fn course(
        &self,
        variation: &str,
        level: UserLevel,
        files: &[KnowledgeFile],
    ) -> Result<CourseContent, GenError> {
        let label = level.wire_label();
        let prompt = format!(
            "Genera un curso técnico completo basado en la lección: \"{variation}\".\n\
             Nivel del Usuario: {label} (Ajusta el tecnicismo, profundidad y ejemplos de código acorde a este nivel).\n\
             \n\
             INSTRUCCIONES DE FORMATO OBLIGATORIAS:\n\
             \n\
             1. METADATA HEADER (Debe ir al principio exacto del markdown):\n\
                [NIVEL ASIGNADO: {label}]\n\
                > **[DECLARACIÓN DE METADATOS: El contenido a continuación incluye instrucciones de implementación (UX/UI METADATA, JSON/YAML, Recursos) destinadas al desarrollador de la App, y no son contenido didáctico directo de lectura para el usuario final.]**\n\
             \n\
             2. ESTRUCTURA:\n\
                - Divide el curso en 5 a 7 bloques temáticos (H2).\n\
                - Usa H3 para subtemas.\n\
                - Incluye ejemplos de código (PowerShell, JSON, YAML) en bloques de código.\n\
             \n\
             3. ELEMENTOS VISUALES Y METADATA:\n\
                - AL INICIO de cada bloque: [TAG DE DIAGRAMA: descripción técnica del diagrama]\n\
                - AL FINAL de cada bloque (Barra de progreso del tema): [PROGRESO: XX] (Donde XX es 20, 40, 60, 80, 100).\n\
                - GLOSARIO: Usa el formato [[Término|Definición corta]] para que sean clicables.\n\
             \n\
             4. RECURSOS SIMULADOS (Al final de cada bloque, antes del Quiz):\n\
                - Usa el formato: [RECURSO: Documentación Oficial | Título del tema] o [RECURSO: Artículo Técnico | Título del concepto].\n\
                - NO uses URLs.\n\
             \n\
             5. EVALUACIÓN (Al final de cada bloque, Título: \"#### Evaluación del Módulo\"):\n\
                - Genera un bloque de código ```quiz con un JSON array de 5 objetos.\n\
                - Cada objeto debe tener:\n\
                  - \"question\": string\n\
                  - \"options\": array de 5 strings (5 opciones obligatorias)\n\
                  - \"correctAnswer\": number (índice 0-4)\n\
                  - \"explanation\": string (feedback de refuerzo explicando el por qué)\n\
             \n\
             6. CIERRE DEL CURSO:\n\
                - Sección H2: \"Desafío de Aplicación Práctica\" (Propuesta de proyecto real).\n\
                - Línea final exacta: > **[BOTÓN: Volver a las 10 Variaciones de Lección anteriores]**"
        );

        let markdown = self.generate(prompt, files, None).await?;
        Ok(CourseContent { title: variation.to_owned(), markdown })
    }

    /// Answers a chat question with the recent conversation as context.
    pub async fn chat_reply(
        &self,
        message: &str,
        history: &[ChatMessage],
        files: &[KnowledgeFile],
    ) -> Result<String, GenError> {
        let history_text = render_chat_context(history);
        let prompt = format!(
            "HISTORIAL DE CONVERSACIÓN PREVIA (Q&A):\n\
             {history_text}\n\
             \n\
             PREGUNTA ACTUAL DEL USUARIO:\n\
             {message}\n\
             \n\
             INSTRUCCIÓN:\n\
             Responde como \"MentorAI\" (Fabric DevOps Expert).\n\
             Tu respuesta debe ser técnica, precisa, didáctica y útil.\n\
             Si la pregunta no tiene relación con Microsoft Fabric, Power BI, Azure o DevOps, indícalo amablemente.\n\
             Sé conciso pero completo."
        );
        self.generate(prompt, files, None).await
    }
}

/// Shared `generationConfig` for the two calls returning a plain string array.
fn string_array_config() -> GenerationConfig {
    GenerationConfig {
        response_mime_type: "application/json",
        response_schema: json!({
            "type": "ARRAY",
            "items": { "type": "STRING" }
        }),
    }
}

// ---------------------------------------------------------------------------
// Response validation (pure, unit-tested)
// ---------------------------------------------------------------------------

/// Validates the diagnosis response: exactly 3 questions, each with at least
/// 2 options and an in-range correct index.
fn parse_questions(text: &str) -> Result<Vec<DiagnosisQuestion>, GenError> {
    let questions: Vec<DiagnosisQuestion> =
        serde_json::from_str(text).map_err(|e| GenError::Schema(e.to_string()))?;
    if questions.len() != 3 {
        return Err(GenError::Schema(format!(
            "expected 3 diagnosis questions, got {}",
            questions.len()
        )));
    }
    for q in &questions {
        if q.options.len() < 2 {
            return Err(GenError::Schema(format!(
                "question {} has {} options, need at least 2",
                q.id,
                q.options.len()
            )));
        }
        if q.correct_answer >= q.options.len() {
            return Err(GenError::Schema(format!(
                "question {} has correct index {} out of range",
                q.id, q.correct_answer
            )));
        }
    }
    Ok(questions)
}

/// Validates a pillar/variation response: exactly 10 distinct non-empty
/// strings after trimming.
fn parse_topic_list(text: &str) -> Result<Vec<String>, GenError> {
    let raw: Vec<String> =
        serde_json::from_str(text).map_err(|e| GenError::Schema(e.to_string()))?;
    let mut items: Vec<String> = Vec::with_capacity(raw.len());
    for s in raw {
        let s = s.trim().to_owned();
        if !s.is_empty() && !items.contains(&s) {
            items.push(s);
        }
    }
    if items.len() != 10 {
        return Err(GenError::Schema(format!(
            "expected 10 distinct items, got {}",
            items.len()
        )));
    }
    Ok(items)
}

/// Parses the `{"level": …}` envelope into a level, if possible.
fn parse_level(text: &str) -> Option<UserLevel> {
    let envelope: LevelEnvelope = serde_json::from_str(text).ok()?;
    UserLevel::from_wire_label(&envelope.level)
}

/// Renders the most recent [`CHAT_CONTEXT_TURNS`] messages as the `Usuario:` /
/// `MentorAI:` transcript expected by the chat prompt.
fn render_chat_context(history: &[ChatMessage]) -> String {
    let start = history.len().saturating_sub(CHAT_CONTEXT_TURNS);
    history[start..]
        .iter()
        .map(|msg| {
            let speaker = match msg.role {
                ChatRole::User => "Usuario",
                ChatRole::Assistant => "MentorAI",
            };
            format!("{speaker}: {}", msg.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::types::ChatRole;

    #[test]
    fn parses_three_well_formed_questions() {
        let text = r#"[
            {"id": 1, "question": "¿Qué es un Lakehouse?", "options": ["a", "b", "c"], "correctAnswer": 0},
            {"id": 2, "question": "¿Qué hace DAX?", "options": ["a", "b"], "correctAnswer": 1},
            {"id": 3, "question": "¿Qué es un pipeline?", "options": ["a", "b", "c", "d"], "correctAnswer": 3}
        ]"#;
        let questions = parse_questions(text).unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[2].correct_answer, 3);
    }

    #[test]
    fn rejects_wrong_question_count() {
        let text = r#"[{"id": 1, "question": "q", "options": ["a", "b"], "correctAnswer": 0}]"#;
        assert!(matches!(parse_questions(text), Err(GenError::Schema(_))));
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let text = r#"[
            {"id": 1, "question": "q", "options": ["a", "b"], "correctAnswer": 2},
            {"id": 2, "question": "q", "options": ["a", "b"], "correctAnswer": 0},
            {"id": 3, "question": "q", "options": ["a", "b"], "correctAnswer": 0}
        ]"#;
        assert!(matches!(parse_questions(text), Err(GenError::Schema(_))));
    }

    #[test]
    fn topic_list_requires_ten_distinct_entries() {
        let ten: Vec<String> = (0..10).map(|i| format!("Pilar {i}")).collect();
        let text = serde_json::to_string(&ten).unwrap();
        assert_eq!(parse_topic_list(&text).unwrap().len(), 10);

        // Duplicates collapse and fail the count check.
        let mut dup = ten.clone();
        dup[9] = "Pilar 0".to_owned();
        let text = serde_json::to_string(&dup).unwrap();
        assert!(matches!(parse_topic_list(&text), Err(GenError::Schema(_))));
    }

    #[test]
    fn topic_list_trims_whitespace() {
        let ten: Vec<String> = (0..10).map(|i| format!("  Pilar {i}  ")).collect();
        let text = serde_json::to_string(&ten).unwrap();
        let items = parse_topic_list(&text).unwrap();
        assert_eq!(items[0], "Pilar 0");
    }

    #[test]
    fn level_envelope_parses_wire_labels() {
        assert_eq!(
            parse_level(r#"{"level": "Avanzado"}"#),
            Some(UserLevel::Advanced)
        );
        assert_eq!(parse_level(r#"{"level": "experto"}"#), None);
        assert_eq!(parse_level("not json"), None);
    }

    #[test]
    fn chat_context_keeps_only_recent_turns() {
        let history: Vec<ChatMessage> = (0..15)
            .map(|i| {
                let role = if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant };
                ChatMessage::new(role, format!("mensaje {i}"))
            })
            .collect();
        let rendered = render_chat_context(&history);
        assert!(!rendered.contains("mensaje 4"));
        assert!(rendered.contains("mensaje 5"));
        assert!(rendered.contains("mensaje 14"));
        assert!(rendered.lines().count() == 10);
        assert!(rendered.starts_with("MentorAI: mensaje 5"));
    }
}
