//! Help overlay renderer.
//!
//! Draws a centred modal box over the current step using ratatui's `Clear`
//! widget to erase the background first. Rendered inside the same
//! `terminal.draw()` closure as everything else.

use ratatui::{
    text::{Line, Text},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::AppState;
use crate::theme::Theme;

use super::layout::{centered_overlay, panel_block};

/// Renders the help overlay as a centred modal.
///
/// Skipped on very narrow terminals to prevent a zero-height `Rect`.
pub fn render_overlay(frame: &mut Frame, state: &AppState, theme: &Theme) {
    if frame.area().width < 60 {
        return;
    }

    let overlay = centered_overlay(frame, 80, 80);
    frame.render_widget(Clear, overlay);

    let block = panel_block(" Ayuda — j/k desplaza, ? o Esc cierra ", true, theme);
    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((state.help_scroll, 0)),
        overlay,
    );
}

/// Builds the help text as a multi-line `Text` value, grouped by surface.
fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Flujo de aprendizaje"),
        Line::from("  j / k         Mover cursor / desplazar"),
        Line::from("  1-9           Elegir una opción (diagnóstico y quiz)"),
        Line::from("  Enter / l     Confirmar selección"),
        Line::from("  h             Volver un paso (borra lo generado en el paso actual)"),
        Line::from("  i             Escribir (tema, chat, ruta de archivo)"),
        Line::from(""),
        Line::from("Vista de curso"),
        Line::from("  j / k         Desplazar el curso"),
        Line::from("  g / G         Ir al inicio / final"),
        Line::from("  Tab           Siguiente pregunta de quiz"),
        Line::from("  Enter         Enviar la respuesta del quiz activo"),
        Line::from("  t             Recorrer el glosario (tooltip)"),
        Line::from(""),
        Line::from("Paneles"),
        Line::from("  a             Abrir / cerrar el chat Q&A (+10 XP por respuesta)"),
        Line::from("  r             Historial (Tab cambia entre CURSOS y Q&A)"),
        Line::from("  f             Base de conocimiento (solo PDF)"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Abrir / cerrar esta ayuda"),
        Line::from("  Esc           Cerrar panel / salir del modo escritura"),
        Line::from("  q             Salir de la aplicación"),
    ])
}
