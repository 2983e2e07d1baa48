//! Course content pipeline: lexing the generated markdown into typed blocks
//! and driving the interactive quiz widgets embedded in it.

pub mod lexer;
pub mod quiz;
