//! Scene persistence.
//!
//! Scenes are stored as a [`SceneTree`]: paragraphs with their format attributes, each holding
//! fragments with text and character attributes. Every node carries both the format id and the
//! format's name and attributes, so a scene still loads sensibly into a project whose registry
//! changed since it was saved.
//!
//! Loading is transactional. The tree is validated and the new document is built completely
//! before it replaces the scene's content; on error the scene is untouched.

use crate::document::{Document, Fragment, Paragraph};
use crate::error::PersistenceError;
use crate::format::{Alignment, CharacterFormat, Indentation, Margins, TextFormat};
use crate::format_registry::{FormatId, TextFormatRegistry};
use crate::scene::SceneDocument;
use novelist_core_lang::ProjectLanguage;
use serde::{Deserialize, Serialize};

/// Version written by [`to_tree`] and accepted by [`load_tree`].
pub const SCENE_VERSION: &str = "1.0";

/// Root of a persisted scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTree {
    /// Format version.
    pub version: String,
    /// Language tag, e.g. `en-US`.
    #[serde(default)]
    pub language: String,
    /// Paragraphs in order.
    pub paragraphs: Vec<ParagraphNode>,
}

/// Paragraph attributes of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphAttributes {
    /// Alignment.
    pub alignment: Alignment,
    /// Margins.
    pub margins: Margins,
    /// Paragraph indentation.
    pub indent: u32,
    /// First-line indentation.
    pub text_indent: u32,
    /// Automatic first-line indentation.
    pub auto_text_indent: bool,
}

impl ParagraphAttributes {
    fn of(format: &TextFormat) -> Self {
        Self {
            alignment: format.alignment,
            margins: format.margins,
            indent: format.indentation.indent,
            text_indent: format.indentation.text_indent,
            auto_text_indent: format.indentation.auto_text_indent,
        }
    }

    fn matches(&self, format: &TextFormat) -> bool {
        *self == Self::of(format)
    }

    fn indentation(&self) -> Indentation {
        Indentation {
            indent: self.indent,
            text_indent: self.text_indent,
            auto_text_indent: self.auto_text_indent,
        }
    }
}

/// One persisted paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphNode {
    /// Paragraph format id at save time.
    pub format: u32,
    /// Paragraph format name at save time.
    #[serde(default)]
    pub format_name: String,
    /// Paragraph format attributes at save time.
    #[serde(default)]
    pub attributes: ParagraphAttributes,
    /// Fragments; an empty paragraph keeps one empty fragment for its character format.
    #[serde(default)]
    pub fragments: Vec<FragmentNode>,
}

/// One persisted run of equally formatted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentNode {
    /// Text, without paragraph separators.
    pub text: String,
    /// Character format id at save time.
    pub format: u32,
    /// Character format name at save time.
    #[serde(default)]
    pub format_name: String,
    /// Character attributes at save time.
    #[serde(default)]
    pub attributes: CharacterFormat,
}

/// Build the persisted tree of `scene`.
pub fn to_tree(scene: &SceneDocument) -> SceneTree {
    let formats = scene.formats().borrow();
    let paragraphs = scene
        .document()
        .paragraphs()
        .iter()
        .map(|paragraph| {
            let format = formats.resolve_format(paragraph.format());
            ParagraphNode {
                format: paragraph.format().0,
                format_name: format.name.clone(),
                attributes: ParagraphAttributes::of(format),
                fragments: paragraph
                    .fragments()
                    .iter()
                    .map(|fragment| {
                        let character = formats.resolve_format(fragment.format());
                        FragmentNode {
                            text: fragment.text().to_string(),
                            format: fragment.format().0,
                            format_name: character.name.clone(),
                            attributes: character.character,
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    SceneTree {
        version: SCENE_VERSION.to_string(),
        language: scene.language().identifier(),
        paragraphs,
    }
}

/// Serialize `scene` to pretty-printed JSON.
pub fn to_json(scene: &SceneDocument) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(&to_tree(scene))?)
}

/// Find the registered format a persisted node refers to.
///
/// Tries the id (if its name still matches), then the name, then equal attributes, then falls
/// back to the default format.
fn resolve_node(
    formats: &TextFormatRegistry,
    id: u32,
    name: &str,
    same_attributes: impl Fn(&TextFormat) -> bool,
) -> FormatId {
    let id = FormatId(id);
    if let Some(format) = formats.get(id)
        && format.name == name
    {
        return id;
    }
    if !name.is_empty()
        && let Some(found) = formats.find_by_name(name)
    {
        return found;
    }
    if let Some((found, _)) = formats.iter().find(|(_, format)| same_attributes(*format)) {
        return found;
    }
    tracing::warn!(%id, name, "persisted format not found, using default");
    formats.default_id()
}

fn build_document(tree: &SceneTree, formats: &TextFormatRegistry) -> Result<Document, PersistenceError> {
    if tree.version != SCENE_VERSION {
        return Err(PersistenceError::UnsupportedVersion(tree.version.clone()));
    }
    if tree.paragraphs.is_empty() {
        return Err(PersistenceError::Malformed("scene has no paragraphs".into()));
    }

    let paragraphs = tree
        .paragraphs
        .iter()
        .map(|node| {
            let format = resolve_node(formats, node.format, &node.format_name, |f| {
                node.attributes.matches(f)
            });
            let fragments = node
                .fragments
                .iter()
                .map(|fragment| {
                    let character = resolve_node(formats, fragment.format, &fragment.format_name, |f| {
                        f.character == fragment.attributes
                    });
                    Fragment::new(fragment.text.as_str(), character)
                })
                .collect();
            Paragraph::new(format, fragments)
        })
        .collect();

    Document::from_paragraphs(paragraphs).map_err(PersistenceError::Malformed)
}

/// Replace the content of `scene` with `tree`.
///
/// Not undoable: history and insights are cleared and the loaded state is the new clean point.
pub fn load_tree(scene: &mut SceneDocument, tree: &SceneTree) -> Result<(), PersistenceError> {
    let document = {
        let formats = scene.formats().borrow();
        build_document(tree, &formats)?
    };

    let language = if tree.language.is_empty() {
        scene.language()
    } else {
        tree.language.parse::<ProjectLanguage>().unwrap_or_else(|err| {
            tracing::warn!(%err, language = %tree.language, "keeping current language");
            scene.language()
        })
    };

    scene.replace_document(document);
    scene.set_language(language);
    tracing::debug!(
        paragraphs = tree.paragraphs.len(),
        language = %language,
        "scene loaded"
    );
    Ok(())
}

/// Parse JSON and load it into `scene`.
pub fn load_json(scene: &mut SceneDocument, json: &str) -> Result<(), PersistenceError> {
    let tree: SceneTree = serde_json::from_str(json)?;
    load_tree(scene, &tree)
}

/// Paragraph attributes as a format definition, for hosts creating missing formats.
pub fn format_from_paragraph(node: &ParagraphNode) -> TextFormat {
    TextFormat::named(node.format_name.clone())
        .with_alignment(node.attributes.alignment)
        .with_margins(node.attributes.margins)
        .with_indentation(node.attributes.indentation())
}
