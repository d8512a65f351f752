#![warn(missing_docs)]
//! Novelist Core - formatted text engine for long-form fiction
//!
//! # Overview
//!
//! `novelist-core` holds the document model behind a scene editor: paragraphs of formatted
//! fragments, a cursor that edits them, a linear undo history with typing coalescing, and
//! insights (spelling, grammar and typography warnings, user notes) anchored to text ranges that
//! follow every edit. It does no rendering; a host UI drives it through [`TextCursor`] and listens
//! to [`InsightEvent`]s.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  SceneDocument + TextCursor                 │  ← Public editing API
//! ├─────────────────────────────────────────────┤
//! │  UndoHistory (DocumentCommand)              │  ← Reversible edits
//! ├─────────────────────────────────────────────┤
//! │  InsightManager (RangeVec)                  │  ← Range-anchored annotations
//! ├─────────────────────────────────────────────┤
//! │  Document (paragraphs / fragments)          │  ← Formatted text
//! ├─────────────────────────────────────────────┤
//! │  ParagraphIndex (Rope-based)                │  ← Position ↔ paragraph
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Text formats live in a [`TextFormatRegistry`] shared by every scene of a project; documents
//! only store [`FormatId`]s. Background statistics and inspections run on an
//! [`AnalysisWorker`] and are applied back on the editing thread.
//!
//! # Quick Start
//!
//! ```rust
//! use novelist_core::{EditorConfig, FormatId, SceneDocument, TextFormat, TextFormatRegistry};
//! use novelist_core_lang::LanguageRegistry;
//!
//! let formats = TextFormatRegistry::shared();
//! let dream = formats.borrow_mut().push_back(TextFormat::named("Dream").with_italic(true));
//!
//! let mut scene = SceneDocument::new(formats, EditorConfig::default(), &LanguageRegistry::with_defaults());
//! let mut cursor = scene.cursor();
//! cursor.insert_text("Hello, World!").unwrap();
//! cursor.select(7, 12);
//! cursor.set_character_format(dream).unwrap();
//!
//! assert_eq!(scene.character_format_at(8).unwrap(), dream);
//! assert_eq!(scene.character_format_at(6).unwrap(), FormatId::DEFAULT);
//!
//! scene.undo();
//! assert_eq!(scene.character_format_at(8).unwrap(), FormatId::DEFAULT);
//! ```
//!
//! # Module Description
//!
//! - [`identity`] - Dense integer identifiers with owned handles
//! - [`ranges`] - Sorted container of range-tagged elements
//! - [`format`] / [`format_registry`] - Format definitions and the shared registry
//! - [`document`] - Paragraphs, fragments and rich slices
//! - [`cursor`] - Editing cursor
//! - [`history`] - Undo/redo
//! - [`insight`] - Insights and their manager
//! - [`marker`] - Positions that follow edits
//! - [`scene`] - Scene documents
//! - [`analysis`] / [`inspection`] - Background statistics and inspection providers
//! - [`persistence`] - Scene tree serialization
//! - [`config`] - Editor configuration

pub mod analysis;
pub mod config;
pub mod cursor;
pub mod document;
pub mod error;
pub mod format;
pub mod format_registry;
pub mod history;
pub mod identity;
pub mod insight;
pub mod inspection;
pub mod marker;
pub mod paragraph_index;
pub mod persistence;
pub mod ranges;
pub mod scene;

pub use analysis::{
    AnalysisKind, AnalysisOutput, AnalysisRequest, AnalysisResult, AnalysisWorker, Generation,
    TextStatistics,
};
pub use config::EditorConfig;
pub use cursor::{MoveOperation, TextCursor};
pub use document::{Document, Fragment, LINE_SEPARATOR, Paragraph, RichParagraph, RichText};
pub use error::{
    ConfigError, DocumentError, FormatError, InspectionError, PersistenceError, UniquenessError,
};
pub use format::{Alignment, CharacterFormat, Indentation, Margins, TextFormat};
pub use format_registry::{FormatId, SharedFormatRegistry, TextFormatRegistry};
pub use history::{DocumentCommand, DocumentEdit, UndoHistory};
pub use identity::{Id, IdManager};
pub use insight::{
    Insight, InsightAction, InsightCommand, InsightEvent, InsightHandle, InsightKind,
    InsightManager, InsightMenu, InsightRow, RemovalReason,
};
pub use inspection::{Finding, Inspector, RegexInspector, RegexRule, TypographyInspector};
pub use marker::{MarkerAttachment, MarkerEvent, MarkerId, MarkerSet, TextMarker};
pub use ranges::{RangeVec, Ranged};
pub use scene::SceneDocument;
