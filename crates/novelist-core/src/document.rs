//! Formatted document storage.
//!
//! A [`Document`] is a non-empty sequence of [`Paragraph`]s, each holding a non-empty sequence of
//! [`Fragment`]s. Positions are character offsets into the flat text where consecutive paragraphs
//! are joined by one separator position. A paragraph without text keeps a single empty fragment
//! as an anchor for its character format.
//!
//! The mutation primitives here are low level: they do not record history or notify insights.
//! Editing goes through [`crate::SceneDocument`] and [`crate::TextCursor`].

use crate::error::DocumentError;
use crate::format_registry::FormatId;
use crate::paragraph_index::{PARAGRAPH_SEPARATOR, ParagraphIndex};
use std::ops::{Range, RangeInclusive};

/// Soft line break inside a paragraph.
pub const LINE_SEPARATOR: char = '\u{2028}';

/// Unicode paragraph separator, accepted on input as a paragraph break.
const UNICODE_PARAGRAPH_SEPARATOR: char = '\u{2029}';

/// A run of text with one character format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    text: String,
    format: FormatId,
    len: usize,
}

impl Fragment {
    /// Create a fragment. `text` must not contain paragraph separators.
    pub fn new(text: impl Into<String>, format: FormatId) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self { text, format, len }
    }

    /// An empty anchor fragment.
    pub fn empty(format: FormatId) -> Self {
        Self::new(String::new(), format)
    }

    /// Fragment text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character format.
    pub fn format(&self) -> FormatId {
        self.format
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for an empty anchor fragment.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn has_separator(&self) -> bool {
        self.text
            .contains([PARAGRAPH_SEPARATOR, UNICODE_PARAGRAPH_SEPARATOR, '\r'])
    }

    fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
        self.len += text.chars().count();
    }

    /// Split into `[0, at)` and `[at, len)`.
    fn split_at(&self, at: usize) -> (Fragment, Fragment) {
        let byte = byte_offset(&self.text, at);
        (
            Fragment::new(&self.text[..byte], self.format),
            Fragment::new(&self.text[byte..], self.format),
        )
    }

    fn slice(&self, range: Range<usize>) -> Fragment {
        let start = byte_offset(&self.text, range.start);
        let end = byte_offset(&self.text, range.end);
        Fragment::new(&self.text[start..end], self.format)
    }
}

fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Drop empty fragments, merge neighbours sharing a format, keep one anchor if nothing is left.
fn normalize(fragments: Vec<Fragment>) -> Vec<Fragment> {
    let anchor = fragments.first().map_or(FormatId::DEFAULT, Fragment::format);
    let mut out: Vec<Fragment> = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        if fragment.is_empty() {
            continue;
        }
        if let Some(last) = out.last_mut()
            && last.format == fragment.format
        {
            last.push_str(&fragment.text);
        } else {
            out.push(fragment);
        }
    }

    if out.is_empty() {
        out.push(Fragment::empty(anchor));
    }
    out
}

/// A paragraph: paragraph format plus fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    format: FormatId,
    fragments: Vec<Fragment>,
}

impl Paragraph {
    /// Create a paragraph; fragments are normalized.
    pub fn new(format: FormatId, fragments: Vec<Fragment>) -> Self {
        Self {
            format,
            fragments: normalize(fragments),
        }
    }

    /// An empty paragraph whose anchor carries `character_format`.
    pub fn empty(format: FormatId, character_format: FormatId) -> Self {
        Self::new(format, vec![Fragment::empty(character_format)])
    }

    /// Paragraph format.
    pub fn format(&self) -> FormatId {
        self.format
    }

    /// Fragments in order. Never empty.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(Fragment::len).sum()
    }

    /// Returns `true` if the paragraph holds no text.
    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(Fragment::is_empty)
    }

    /// Paragraph text.
    pub fn text(&self) -> String {
        self.fragments.iter().map(Fragment::text).collect()
    }

    /// Split fragments at a paragraph-local offset. An empty paragraph hands its anchor to both
    /// halves.
    fn split_fragments(&self, offset: usize) -> (Vec<Fragment>, Vec<Fragment>) {
        if self.is_empty() {
            return (self.fragments.clone(), self.fragments.clone());
        }

        let mut head = Vec::new();
        let mut tail = Vec::new();
        let mut acc = 0;
        for fragment in &self.fragments {
            let end = acc + fragment.len();
            if end <= offset {
                head.push(fragment.clone());
            } else if acc >= offset {
                tail.push(fragment.clone());
            } else {
                let (left, right) = fragment.split_at(offset - acc);
                head.push(left);
                tail.push(right);
            }
            acc = end;
        }
        (head, tail)
    }

    /// Fragments covering the paragraph-local `[start, end)`.
    fn extract(&self, start: usize, end: usize) -> Vec<Fragment> {
        if self.is_empty() {
            return self.fragments.clone();
        }

        let mut out = Vec::new();
        let mut acc = 0;
        for fragment in &self.fragments {
            let frag_end = acc + fragment.len();
            let lo = start.max(acc);
            let hi = end.min(frag_end);
            if lo < hi {
                out.push(fragment.slice(lo - acc..hi - acc));
            }
            acc = frag_end;
        }
        out
    }

    /// Re-tag the fragments within paragraph-local `[start, end)` through `retag`.
    fn retag(&mut self, start: usize, end: usize, retag: &impl Fn(FormatId) -> FormatId) {
        let mut out = Vec::with_capacity(self.fragments.len() + 2);
        let mut acc = 0;
        for fragment in &self.fragments {
            let frag_end = acc + fragment.len();
            let lo = start.clamp(acc, frag_end);
            let hi = end.clamp(acc, frag_end);
            if lo >= hi {
                out.push(fragment.clone());
            } else {
                let before = fragment.slice(0..lo - acc);
                let mut inside = fragment.slice(lo - acc..hi - acc);
                let after = fragment.slice(hi - acc..fragment.len());
                inside.format = retag(inside.format);
                out.extend([before, inside, after]);
            }
            acc = frag_end;
        }
        self.fragments = normalize(out);
    }
}

/// One paragraph of a [`RichText`] slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichParagraph {
    /// Paragraph format.
    pub format: FormatId,
    /// Fragments (may be empty or hold empty anchors).
    pub fragments: Vec<Fragment>,
}

impl RichParagraph {
    fn len(&self) -> usize {
        self.fragments.iter().map(Fragment::len).sum()
    }
}

/// A formatted slice of a document: `n` paragraphs joined by `n - 1` separators.
///
/// When inserted, the first paragraph's fragments join the paragraph at the insertion point and
/// the last paragraph's format applies to the paragraph holding the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    /// Paragraphs of the slice. Never empty.
    pub paragraphs: Vec<RichParagraph>,
}

impl RichText {
    /// An empty slice.
    pub fn empty() -> Self {
        Self {
            paragraphs: vec![RichParagraph {
                format: FormatId::DEFAULT,
                fragments: Vec::new(),
            }],
        }
    }

    /// Plain text in one character format. `\n` and U+2029 become paragraph breaks carrying
    /// `paragraph_format`; `\r` is dropped.
    pub fn plain(text: &str, character_format: FormatId, paragraph_format: FormatId) -> Self {
        let cleaned: String = text.chars().filter(|&c| c != '\r').collect();
        let paragraphs = cleaned
            .split([PARAGRAPH_SEPARATOR, UNICODE_PARAGRAPH_SEPARATOR])
            .map(|part| RichParagraph {
                format: paragraph_format,
                fragments: vec![Fragment::new(part, character_format)],
            })
            .collect();
        Self { paragraphs }
    }

    /// A paragraph break whose new paragraph gets `paragraph_format` and an anchor in
    /// `character_format`.
    pub fn paragraph_break(paragraph_format: FormatId, character_format: FormatId) -> Self {
        Self::plain("\n", character_format, paragraph_format)
    }

    /// Length in positions, separators included.
    pub fn len(&self) -> usize {
        let text: usize = self.paragraphs.iter().map(RichParagraph::len).sum();
        text + self.paragraphs.len().saturating_sub(1)
    }

    /// Returns `true` if the slice covers no positions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat text with `\n` separators.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.fragments.iter().map(Fragment::text).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns `true` if the slice contains no paragraph break.
    pub fn is_single_paragraph(&self) -> bool {
        self.paragraphs.len() == 1
    }

    /// Rewrite every paragraph and character format through `map`.
    pub(crate) fn map_formats(&mut self, map: impl Fn(FormatId) -> FormatId) {
        for paragraph in &mut self.paragraphs {
            paragraph.format = map(paragraph.format);
            for fragment in &mut paragraph.fragments {
                fragment.format = map(fragment.format);
            }
        }
    }

    /// Append a single-paragraph slice to the end of this one.
    pub(crate) fn extend_inline(&mut self, other: RichText) {
        if let Some(last) = self.paragraphs.last_mut() {
            for paragraph in other.paragraphs {
                last.fragments.extend(paragraph.fragments);
            }
        }
    }
}

/// Previous fragments of the paragraphs touched by a character-format change.
pub type FragmentSnapshot = Vec<(usize, Vec<Fragment>)>;

/// Previous formats of the paragraphs touched by a paragraph-format change.
pub type ParagraphFormatSnapshot = Vec<(usize, FormatId)>;

/// The formatted text buffer.
#[derive(Debug, Clone)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
    index: ParagraphIndex,
}

impl Document {
    /// A document with one empty paragraph.
    pub fn new(paragraph_format: FormatId, character_format: FormatId) -> Self {
        Self {
            paragraphs: vec![Paragraph::empty(paragraph_format, character_format)],
            index: ParagraphIndex::new(),
        }
    }

    /// Build from paragraphs. Fails if a fragment contains a paragraph separator.
    pub(crate) fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Result<Self, String> {
        if paragraphs.is_empty() {
            return Ok(Self::default());
        }
        if let Some(idx) = paragraphs
            .iter()
            .position(|p| p.fragments.iter().any(Fragment::has_separator))
        {
            return Err(format!("paragraph {idx} contains a paragraph separator"));
        }
        let flat = paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Self {
            index: ParagraphIndex::from_text(&flat),
            paragraphs,
        })
    }

    /// Total length in positions.
    pub fn len(&self) -> usize {
        self.index.len_chars()
    }

    /// Returns `true` if the document holds no text and a single paragraph.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Paragraph by index.
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    /// All paragraphs.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Flat text with `\n` between paragraphs.
    pub fn text(&self) -> String {
        self.index.text()
    }

    /// Text of each paragraph.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(Paragraph::text).collect()
    }

    /// Paragraph containing `pos` (clamped to the document).
    pub fn paragraph_of(&self, pos: usize) -> usize {
        self.index.paragraph_of(pos)
    }

    /// `[start, end)` of paragraph `index`, separator excluded.
    pub fn paragraph_range(&self, index: usize) -> Range<usize> {
        self.index.paragraph_range(index)
    }

    /// Paragraphs touched by `range`.
    pub fn paragraphs_in_range(&self, range: &Range<usize>) -> RangeInclusive<usize> {
        self.paragraph_of(range.start)..=self.paragraph_of(range.end)
    }

    /// Character at `pos`; paragraph separators read as `\n`.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.index.char_at(pos)
    }

    /// Fail unless `pos` is within `[0, len]`.
    pub fn check_position(&self, pos: usize) -> Result<(), DocumentError> {
        if pos > self.len() {
            return Err(DocumentError::OutOfRange {
                position: pos,
                length: self.len(),
            });
        }
        Ok(())
    }

    /// Fail unless `range` is ordered and within the document.
    pub fn check_range(&self, range: &Range<usize>) -> Result<(), DocumentError> {
        if range.start > range.end {
            return Err(DocumentError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        self.check_position(range.end)
    }

    /// Flat text of `range`.
    pub fn text_in_range(&self, range: Range<usize>) -> Result<String, DocumentError> {
        self.check_range(&range)?;
        Ok(self.index.slice(range))
    }

    /// Character format in effect at `pos`: the format of the character before `pos`, or of the
    /// paragraph's first fragment at a paragraph start.
    pub fn character_format_at(&self, pos: usize) -> Result<FormatId, DocumentError> {
        self.check_position(pos)?;
        let p = self.paragraph_of(pos);
        let offset = pos - self.index.paragraph_start(p);
        let paragraph = &self.paragraphs[p];

        if offset == 0 {
            return Ok(paragraph.fragments[0].format);
        }
        let mut acc = 0;
        for fragment in &paragraph.fragments {
            acc += fragment.len();
            if acc >= offset {
                return Ok(fragment.format);
            }
        }
        Ok(paragraph.fragments[paragraph.fragments.len() - 1].format)
    }

    /// Paragraph format of the paragraph containing `pos`.
    pub fn paragraph_format_at(&self, pos: usize) -> Result<FormatId, DocumentError> {
        self.check_position(pos)?;
        Ok(self.paragraphs[self.paragraph_of(pos)].format)
    }

    /// Runs of character formats within `range`, separators skipped, neighbours merged.
    pub fn format_runs(&self, range: Range<usize>) -> Result<Vec<(Range<usize>, FormatId)>, DocumentError> {
        self.check_range(&range)?;
        let mut runs: Vec<(Range<usize>, FormatId)> = Vec::new();

        for p in self.paragraphs_in_range(&range) {
            let start = self.index.paragraph_start(p);
            let mut acc = start;
            for fragment in &self.paragraphs[p].fragments {
                let frag_range = acc..acc + fragment.len();
                acc = frag_range.end;
                let lo = range.start.max(frag_range.start);
                let hi = range.end.min(frag_range.end);
                if lo >= hi {
                    continue;
                }
                if let Some((last, format)) = runs.last_mut()
                    && *format == fragment.format
                    && last.end + 1 >= lo
                {
                    last.end = hi;
                } else {
                    runs.push((lo..hi, fragment.format));
                }
            }
        }
        Ok(runs)
    }

    /// Copy of `range` as a rich slice. Empty paragraphs contribute their anchors.
    pub fn slice(&self, range: Range<usize>) -> Result<RichText, DocumentError> {
        self.check_range(&range)?;
        let paragraphs = self
            .paragraphs_in_range(&range)
            .map(|p| {
                let pr = self.paragraph_range(p);
                let lo = range.start.max(pr.start) - pr.start;
                let hi = range.end.min(pr.end).max(pr.start) - pr.start;
                RichParagraph {
                    format: self.paragraphs[p].format,
                    fragments: self.paragraphs[p].extract(lo, hi),
                }
            })
            .collect();
        Ok(RichText { paragraphs })
    }

    /// Insert `content` at `pos`. Returns the number of positions inserted.
    pub fn insert_rich(&mut self, pos: usize, content: &RichText) -> Result<usize, DocumentError> {
        self.check_position(pos)?;
        if let Some(paragraph) = content
            .paragraphs
            .iter()
            .position(|p| p.fragments.iter().any(Fragment::has_separator))
        {
            return Err(DocumentError::SeparatorInFragment { paragraph });
        }
        let len = content.len();
        let Some(last) = content.paragraphs.last() else {
            return Ok(0);
        };
        if len == 0 && content.is_single_paragraph() {
            return Ok(0);
        }

        let p = self.paragraph_of(pos);
        let offset = pos - self.index.paragraph_start(p);
        let target = &self.paragraphs[p];
        let (head, tail) = target.split_fragments(offset);
        let target_format = target.format;

        let first = &content.paragraphs[0];
        if content.is_single_paragraph() {
            let fragments = head
                .into_iter()
                .chain(first.fragments.iter().cloned())
                .chain(tail)
                .collect();
            self.paragraphs[p].fragments = normalize(fragments);
        } else {
            let n = content.paragraphs.len();
            let mut replacement = Vec::with_capacity(n);
            replacement.push(Paragraph::new(
                target_format,
                head.into_iter().chain(first.fragments.iter().cloned()).collect(),
            ));
            for middle in &content.paragraphs[1..n - 1] {
                replacement.push(Paragraph::new(middle.format, middle.fragments.clone()));
            }
            replacement.push(Paragraph::new(
                last.format,
                last.fragments.iter().cloned().chain(tail).collect(),
            ));
            self.paragraphs.splice(p..=p, replacement);
        }

        self.index.insert(pos, &content.text());
        Ok(len)
    }

    /// Remove `range` and return what was removed.
    pub fn remove(&mut self, range: Range<usize>) -> Result<RichText, DocumentError> {
        let removed = self.slice(range.clone())?;
        if range.is_empty() {
            return Ok(removed);
        }

        let p1 = self.paragraph_of(range.start);
        let p2 = self.paragraph_of(range.end);
        let off1 = range.start - self.index.paragraph_start(p1);
        let off2 = range.end - self.index.paragraph_start(p2);

        let (head, _) = self.paragraphs[p1].split_fragments(off1);
        let (_, tail) = self.paragraphs[p2].split_fragments(off2);
        self.paragraphs[p1].fragments = normalize(head.into_iter().chain(tail).collect());
        if p2 > p1 {
            self.paragraphs.drain(p1 + 1..=p2);
        }

        self.index.remove(range);
        Ok(removed)
    }

    /// Re-tag the character format of `range`.
    ///
    /// With `only` set, just fragments currently carrying that format change. An empty range on an
    /// empty paragraph re-tags its anchor. Returns the previous fragments for undo.
    pub fn set_character_format(
        &mut self,
        range: Range<usize>,
        format: FormatId,
        only: Option<FormatId>,
    ) -> Result<FragmentSnapshot, DocumentError> {
        self.check_range(&range)?;
        let retag = |current: FormatId| match only {
            Some(old) if old != current => current,
            _ => format,
        };

        let mut snapshot = Vec::new();
        for p in self.paragraphs_in_range(&range) {
            let pr = self.paragraph_range(p);
            let paragraph = &mut self.paragraphs[p];

            if paragraph.is_empty() {
                let covered = if range.is_empty() {
                    pr.start == range.start
                } else {
                    pr.start >= range.start && pr.start < range.end
                };
                if covered {
                    snapshot.push((p, paragraph.fragments.clone()));
                    let anchor = &mut paragraph.fragments[0];
                    anchor.format = retag(anchor.format);
                }
                continue;
            }

            let lo = range.start.max(pr.start) - pr.start;
            let hi = range.end.min(pr.end).max(pr.start) - pr.start;
            if lo >= hi {
                continue;
            }
            snapshot.push((p, paragraph.fragments.clone()));
            paragraph.retag(lo, hi, &retag);
        }
        Ok(snapshot)
    }

    /// Restore fragments captured by [`Document::set_character_format`].
    pub fn restore_fragments(&mut self, snapshot: &FragmentSnapshot) {
        for (p, fragments) in snapshot {
            if let Some(paragraph) = self.paragraphs.get_mut(*p) {
                paragraph.fragments = fragments.clone();
            }
        }
    }

    /// Set the paragraph format of every paragraph touched by `range`.
    pub fn set_paragraph_format(
        &mut self,
        range: Range<usize>,
        format: FormatId,
    ) -> Result<ParagraphFormatSnapshot, DocumentError> {
        self.check_range(&range)?;
        let mut snapshot = Vec::new();
        for p in self.paragraphs_in_range(&range) {
            let paragraph = &mut self.paragraphs[p];
            snapshot.push((p, paragraph.format));
            paragraph.format = format;
        }
        Ok(snapshot)
    }

    /// Restore paragraph formats captured by [`Document::set_paragraph_format`].
    pub fn restore_paragraph_formats(&mut self, snapshot: &ParagraphFormatSnapshot) {
        for &(p, format) in snapshot {
            if let Some(paragraph) = self.paragraphs.get_mut(p) {
                paragraph.format = format;
            }
        }
    }

    /// `(position, char, format)` for every non-separator character. Handy for comparing
    /// documents independently of fragment boundaries.
    pub fn formatted_chars(&self) -> Vec<(usize, char, FormatId)> {
        let mut out = Vec::with_capacity(self.len());
        let mut pos = 0;
        for paragraph in &self.paragraphs {
            for fragment in &paragraph.fragments {
                for c in fragment.text.chars() {
                    out.push((pos, c, fragment.format));
                    pos += 1;
                }
            }
            pos += 1;
        }
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(FormatId::DEFAULT, FormatId::DEFAULT)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.paragraphs == other.paragraphs
    }
}

impl Eq for Document {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DREAM: FormatId = FormatId(3);
    const HEADING: FormatId = FormatId(4);

    fn doc_with(text: &str) -> Document {
        let mut doc = Document::default();
        doc.insert_rich(0, &RichText::plain(text, FormatId::DEFAULT, FormatId::DEFAULT))
            .unwrap();
        doc
    }

    #[test]
    fn starts_with_one_anchor_paragraph() {
        let doc = Document::default();
        assert_eq!(doc.len(), 0);
        assert_eq!(doc.paragraph_count(), 1);
        assert_eq!(doc.paragraphs()[0].fragments().len(), 1);
    }

    #[test]
    fn insert_rejects_separator_inside_fragment() {
        let mut doc = doc_with("abc");
        let content = RichText {
            paragraphs: vec![RichParagraph {
                format: FormatId::DEFAULT,
                fragments: vec![Fragment::new("x\ny", FormatId::DEFAULT)],
            }],
        };
        assert_eq!(
            doc.insert_rich(1, &content),
            Err(DocumentError::SeparatorInFragment { paragraph: 0 })
        );
        assert_eq!(doc.text(), "abc");
        assert_eq!(doc.paragraph_count(), 1);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn character_format_scenario() {
        let mut doc = doc_with("Hello, World!");
        doc.set_character_format(7..12, DREAM, None).unwrap();

        assert_eq!(doc.character_format_at(8).unwrap(), DREAM);
        assert_eq!(doc.character_format_at(12).unwrap(), DREAM);
        assert_eq!(doc.character_format_at(13).unwrap(), FormatId::DEFAULT);
        assert_eq!(doc.character_format_at(7).unwrap(), FormatId::DEFAULT);
        assert_eq!(doc.character_format_at(6).unwrap(), FormatId::DEFAULT);
        assert_eq!(
            doc.character_format_at(14),
            Err(DocumentError::OutOfRange { position: 14, length: 13 })
        );
    }

    #[test]
    fn multi_paragraph_insert_and_remove_are_inverse() {
        let mut doc = doc_with("Hello World");
        doc.set_paragraph_format(0..0, HEADING).unwrap();
        let before = doc.clone();

        let content = RichText::plain("one\ntwo\nthree", DREAM, FormatId::DEFAULT);
        let inserted = doc.insert_rich(5, &content).unwrap();
        assert_eq!(inserted, 13);
        assert_eq!(doc.paragraph_texts(), vec!["Helloone", "two", "three World"]);
        assert_eq!(doc.paragraph_format_at(0).unwrap(), HEADING);
        assert_eq!(doc.paragraph_format_at(doc.len()).unwrap(), FormatId::DEFAULT);

        let removed = doc.remove(5..18).unwrap();
        assert_eq!(removed.text(), "one\ntwo\nthree");
        assert_eq!(doc, before);

        doc.insert_rich(5, &removed).unwrap();
        assert_eq!(doc.text(), "Helloone\ntwo\nthree World");
    }

    #[test]
    fn removing_separator_merges_and_restores_formats() {
        let mut doc = doc_with("ab\ncd");
        doc.set_paragraph_format(3..3, HEADING).unwrap();
        let before = doc.clone();

        let removed = doc.remove(2..3).unwrap();
        assert_eq!(doc.paragraph_texts(), vec!["abcd"]);
        assert_eq!(doc.paragraph_format_at(0).unwrap(), FormatId::DEFAULT);

        doc.insert_rich(2, &removed).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn paragraph_break_at_end_keeps_character_format() {
        let mut doc = Document::default();
        doc.insert_rich(0, &RichText::plain("Hello", DREAM, FormatId::DEFAULT))
            .unwrap();
        doc.insert_rich(5, &RichText::paragraph_break(HEADING, DREAM))
            .unwrap();

        assert_eq!(doc.paragraph_texts(), vec!["Hello", ""]);
        assert_eq!(doc.character_format_at(6).unwrap(), DREAM);
        assert_eq!(doc.paragraph_format_at(6).unwrap(), HEADING);
        assert_eq!(doc.paragraph_format_at(5).unwrap(), FormatId::DEFAULT);
    }

    #[test]
    fn empty_paragraph_anchor_survives_remove_and_undo() {
        let mut doc = doc_with("a\n");
        doc.set_character_format(2..2, DREAM, None).unwrap();
        assert_eq!(doc.paragraphs()[1].fragments()[0].format(), DREAM);
        let before = doc.clone();

        let removed = doc.remove(1..2).unwrap();
        assert_eq!(doc.text(), "a");
        doc.insert_rich(1, &removed).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn set_character_format_across_paragraphs() {
        let mut doc = doc_with("abc\ndef\nghi");
        let snapshot = doc.set_character_format(2..9, DREAM, None).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            doc.format_runs(0..11).unwrap(),
            vec![(0..2, FormatId::DEFAULT), (2..9, DREAM), (9..11, FormatId::DEFAULT)]
        );

        doc.restore_fragments(&snapshot);
        assert_eq!(doc.format_runs(0..11).unwrap(), vec![(0..11, FormatId::DEFAULT)]);
    }

    #[test]
    fn replace_only_matching_format() {
        let mut doc = doc_with("abcdef");
        doc.set_character_format(0..2, DREAM, None).unwrap();
        doc.set_character_format(0..6, HEADING, Some(FormatId::DEFAULT))
            .unwrap();
        assert_eq!(
            doc.format_runs(0..6).unwrap(),
            vec![(0..2, DREAM), (2..6, HEADING)]
        );
    }

    #[test]
    fn soft_break_is_inside_paragraph() {
        let doc = doc_with("one\u{2028}two");
        assert_eq!(doc.paragraph_count(), 1);
        assert_eq!(doc.len(), 7);
        assert_eq!(doc.text_in_range(3..4).unwrap(), "\u{2028}");
    }

    #[test]
    fn carriage_returns_are_dropped() {
        let doc = doc_with("a\r\nb");
        assert_eq!(doc.paragraph_texts(), vec!["a", "b"]);
    }

    #[test]
    fn invalid_ranges_are_rejected_without_mutation() {
        let mut doc = doc_with("abc");
        assert_eq!(
            doc.remove(2..1).unwrap_err(),
            DocumentError::InvalidRange { start: 2, end: 1 }
        );
        assert!(doc.remove(1..9).is_err());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn multibyte_text_splits_on_chars() {
        let mut doc = doc_with("größer");
        doc.set_character_format(2..4, DREAM, None).unwrap();
        assert_eq!(doc.text_in_range(2..4).unwrap(), "öß");
        let removed = doc.remove(1..5).unwrap();
        assert_eq!(removed.text(), "röße");
        assert_eq!(doc.text(), "gr");
    }
}
