//! Literal find/replace over a document tree.
//!
//! Every string payload that is displayed to readers goes through a literal,
//! non-overlapping, left-to-right replacement. Tags, ordering, URLs and every
//! opaque node stay exactly as they were.

use super::{
    Block, ContextElement, InlineSpan, RichTextBlock, RichTextElement, TableCell, TextObject,
};

/// In-place literal substitution.
pub trait Substitute {
    fn substitute(&mut self, find: &str, replace: &str);
}

/// Replaces every occurrence of `find` in `text`. An empty `find` matches nothing.
#[must_use]
pub fn substitute_text(text: &str, find: &str, replace: &str) -> String {
    if find.is_empty() {
        return text.to_string();
    }
    text.replace(find, replace)
}

impl Substitute for String {
    fn substitute(&mut self, find: &str, replace: &str) {
        if !find.is_empty() && self.contains(find) {
            *self = self.replace(find, replace);
        }
    }
}

impl<T: Substitute> Substitute for [T] {
    fn substitute(&mut self, find: &str, replace: &str) {
        for item in self {
            item.substitute(find, replace);
        }
    }
}

impl<T: Substitute> Substitute for Vec<T> {
    fn substitute(&mut self, find: &str, replace: &str) {
        self.as_mut_slice().substitute(find, replace);
    }
}

impl<T: Substitute> Substitute for Option<T> {
    fn substitute(&mut self, find: &str, replace: &str) {
        if let Some(inner) = self {
            inner.substitute(find, replace);
        }
    }
}

impl Substitute for TextObject {
    fn substitute(&mut self, find: &str, replace: &str) {
        self.text.substitute(find, replace);
    }
}

impl Substitute for Block {
    fn substitute(&mut self, find: &str, replace: &str) {
        match self {
            Block::Context(context) => context.elements.substitute(find, replace),
            Block::Header(header) => header.text.substitute(find, replace),
            Block::Markdown(markdown) => markdown.text.substitute(find, replace),
            Block::RichText(rich_text) => rich_text.substitute(find, replace),
            Block::Section(section) => section.text.substitute(find, replace),
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flatten() {
                    cell.substitute(find, replace);
                }
            }
            Block::Other(_) => {}
        }
    }
}

impl Substitute for ContextElement {
    fn substitute(&mut self, find: &str, replace: &str) {
        match self {
            ContextElement::Text(text) => text.substitute(find, replace),
            ContextElement::Other(_) => {}
        }
    }
}

impl Substitute for TableCell {
    fn substitute(&mut self, find: &str, replace: &str) {
        match self {
            TableCell::RawText(cell) => cell.text.substitute(find, replace),
            TableCell::RichText(rich_text) => rich_text.substitute(find, replace),
            TableCell::Other(_) => {}
        }
    }
}

impl Substitute for RichTextBlock {
    fn substitute(&mut self, find: &str, replace: &str) {
        self.elements.substitute(find, replace);
    }
}

impl Substitute for RichTextElement {
    fn substitute(&mut self, find: &str, replace: &str) {
        match self {
            RichTextElement::RichTextList(list) => list.elements.substitute(find, replace),
            RichTextElement::RichTextSection(spans)
            | RichTextElement::RichTextQuote(spans)
            | RichTextElement::RichTextPreformatted(spans) => {
                spans.elements.substitute(find, replace);
            }
            RichTextElement::Other(_) => {}
        }
    }
}

impl Substitute for InlineSpan {
    fn substitute(&mut self, find: &str, replace: &str) {
        match self {
            InlineSpan::Text(span) => span.text.substitute(find, replace),
            // The target URL is never rewritten, only the label.
            InlineSpan::Link(span) => span.text.substitute(find, replace),
            InlineSpan::Emoji(span) => span.name.substitute(find, replace),
            InlineSpan::Color(span) => span.value.substitute(find, replace),
            InlineSpan::Other(_) => {}
        }
    }
}
