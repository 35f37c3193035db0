//! Quiet Text - a minimalist editor core with incremental syntax highlighting
//!
//! The [`syntax`] module holds the highlighting engine. The remaining modules
//! model the editor around it: the annotated document, the session, settings
//! and event dispatch.

pub mod config;
pub mod dispatch;
pub mod document;
pub mod editor;
pub mod error;
pub mod input;
pub mod render;
pub mod search;
pub mod session;
pub mod syntax;
