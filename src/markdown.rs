//! The Markdown structurer. Converts a post body into an [`Outline`]: the
//! blocks preceding the first `##` heading (the intro) and an ordered list of
//! [`Chapter`]s, each with its own blocks and a tree of [`Subsection`]s built
//! from the `###`..`######` headings inside it.
//!
//! Structuring happens in two passes over the body:
//!
//! 1. [`tokenize`] scans lines into [`Block`]s. Blank lines separate blocks;
//!    a heading, list item, quote marker, or code fence starts a new block;
//!    any other line continues the current paragraph (or list item), which
//!    lets prose wrap across lines.
//! 2. [`structure`] walks the blocks, opening a chapter at each `##` heading,
//!    assigning every heading a document-unique anchor id, and nesting the
//!    deeper headings of each chapter.
//!
//! Only the subset of Markdown needed for long-form posts is understood; see
//! [`Block`] for the supported constructs.

use std::collections::HashSet;

/// Prefixes the anchor ids of `##` headings.
pub const CHAPTER_PREFIX: &str = "chapter-";

/// Prefixes the anchor ids of `###`..`######` headings.
pub const SECTION_PREFIX: &str = "section-";

const FENCE: &str = "```";

/// A block-level element of a post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Wrapped prose. Source lines are trimmed and joined with `\n`.
    Paragraph(String),

    /// A `- ` list.
    UnorderedList(Vec<String>),

    /// A `1. ` list. `start` is the number of the first item.
    OrderedList { start: u64, items: Vec<String> },

    /// A `>` quote. Lines holding only `>` separate paragraphs and appear as
    /// empty lines in the text.
    Quote(String),

    /// A fenced code block, kept verbatim.
    Code {
        language: Option<String>,
        code: String,
    },

    /// A heading rendered in the flow of the document. `##` headings never
    /// appear as blocks of a structured outline; they become [`Chapter`]s.
    /// `#` headings have no anchor.
    Heading {
        level: u8,
        text: String,
        anchor: Option<String>,
    },
}

/// The structure of one post body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    /// Blocks preceding the first chapter.
    pub intro: Vec<Block>,
    pub chapters: Vec<Chapter>,
}

/// A `##` section of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// The heading text, unrendered and without any ordinal.
    pub title: String,
    pub anchor: String,
    pub blocks: Vec<Block>,

    /// The top-level subsections, in document order.
    pub subsections: Vec<Subsection>,
}

/// A `###`..`######` heading inside a chapter, together with the deeper
/// headings that follow it before the next heading of the same or a shallower
/// level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsection {
    pub title: String,
    pub anchor: String,
    pub level: u8,
    pub children: Vec<Subsection>,
}

/// Structures `body` into an [`Outline`]. Anchor ids are unique within the
/// returned outline and depend only on `body`.
pub fn structure(body: &str) -> Outline {
    let mut anchors = Anchors::default();
    let mut outline = Outline::default();
    let mut chapter: Option<ChapterBuilder> = None;

    for (position, block) in tokenize(body) {
        let block = match block {
            Block::Heading { level: 2, text, .. } => {
                if let Some(finished) = chapter.take() {
                    outline.chapters.push(finished.finish());
                }
                let anchor = anchors.assign(CHAPTER_PREFIX, &text, position);
                chapter = Some(ChapterBuilder::new(text, anchor));
                continue;
            }
            Block::Heading { level, text, .. } if level >= 3 => {
                let anchor = anchors.assign(SECTION_PREFIX, &text, position);
                if let Some(chapter) = chapter.as_mut() {
                    chapter.open_subsection(level, &text, &anchor);
                }
                Block::Heading {
                    level,
                    text,
                    anchor: Some(anchor),
                }
            }
            block => block,
        };

        match chapter.as_mut() {
            Some(chapter) => chapter.blocks.push(block),
            None => outline.intro.push(block),
        }
    }

    if let Some(finished) = chapter {
        outline.chapters.push(finished.finish());
    }
    outline
}

/// Accumulates the active chapter. `open` holds the subsections whose
/// subtrees may still grow, shallowest first; every entry is strictly deeper
/// than the one below it.
struct ChapterBuilder {
    title: String,
    anchor: String,
    blocks: Vec<Block>,
    subsections: Vec<Subsection>,
    open: Vec<Subsection>,
}

impl ChapterBuilder {
    fn new(title: String, anchor: String) -> Self {
        ChapterBuilder {
            title,
            anchor,
            blocks: Vec::new(),
            subsections: Vec::new(),
            open: Vec::new(),
        }
    }

    fn open_subsection(&mut self, level: u8, title: &str, anchor: &str) {
        while self.open.last().map_or(false, |top| top.level >= level) {
            self.close_top();
        }
        self.open.push(Subsection {
            title: title.to_owned(),
            anchor: anchor.to_owned(),
            level,
            children: Vec::new(),
        });
    }

    /// Pops the deepest open subsection and attaches it to its parent, or to
    /// the chapter when it has none.
    fn close_top(&mut self) {
        if let Some(closed) = self.open.pop() {
            match self.open.last_mut() {
                Some(parent) => parent.children.push(closed),
                None => self.subsections.push(closed),
            }
        }
    }

    fn finish(mut self) -> Chapter {
        while !self.open.is_empty() {
            self.close_top();
        }
        Chapter {
            title: self.title,
            anchor: self.anchor,
            blocks: self.blocks,
            subsections: self.subsections,
        }
    }
}

/// The set of anchor ids already handed out within one document.
#[derive(Debug, Default)]
pub struct Anchors {
    used: HashSet<String>,
}

impl Anchors {
    /// Returns a fresh anchor id for a heading with `text` found on line
    /// `position` (1-based). The id is `prefix` followed by the slugified text,
    /// or by `position` when the text slugifies to nothing. Ids already taken
    /// get `-2`, `-3`, ... appended.
    pub fn assign(&mut self, prefix: &str, text: &str, position: usize) -> String {
        let slug = slugify(text);
        let base = match slug.is_empty() {
            true => format!("{}{}", prefix, position),
            false => format!("{}{}", prefix, slug),
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Lowercases `text`, drops everything but alphanumerics, whitespace, and
/// hyphens, turns whitespace runs into single hyphens, and collapses repeated
/// hyphens. Leading and trailing hyphens are removed.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    fn push_hyphen(slug: &mut String) {
        if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let mut slug = String::with_capacity(kept.len());
    for word in kept.split_whitespace() {
        if !slug.is_empty() {
            push_hyphen(&mut slug);
        }
        for c in word.chars() {
            match c {
                '-' => push_hyphen(&mut slug),
                c => slug.push(c),
            }
        }
    }
    slug.trim_matches('-').to_owned()
}

/// The block-level meaning of a single source line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Heading { level: u8, text: &'a str },
    Bullet(&'a str),
    Numbered { number: u64, text: &'a str },
    Quote(&'a str),
    Fence { language: Option<&'a str> },
    Text(&'a str),
}

impl<'a> Line<'a> {
    fn classify(line: &'a str) -> Line<'a> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Line::Blank;
        }
        if let Some(info) = trimmed.strip_prefix(FENCE) {
            return Line::Fence {
                language: info.trim_start_matches('`').split_whitespace().next(),
            };
        }
        if let Some(heading) = Self::heading(trimmed) {
            return heading;
        }
        if let Some(text) = trimmed.strip_prefix("- ") {
            return Line::Bullet(text.trim());
        }
        if let Some(numbered) = Self::numbered(trimmed) {
            return numbered;
        }
        if let Some(text) = trimmed.strip_prefix('>') {
            return Line::Quote(text.strip_prefix(' ').unwrap_or(text).trim_end());
        }
        Line::Text(trimmed)
    }

    fn heading(trimmed: &'a str) -> Option<Line<'a>> {
        let level = trimmed.bytes().take_while(|b| *b == b'#').count();
        if !(1..=6).contains(&level) {
            return None;
        }
        let rest = &trimmed[level..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }

        // An optional closing run of `#`s isn't part of the text.
        let mut text = rest.trim();
        let unclosed = text.trim_end_matches('#');
        if unclosed.is_empty() {
            text = unclosed;
        } else if unclosed.len() != text.len() && unclosed.ends_with(char::is_whitespace) {
            text = unclosed.trim_end();
        }

        Some(Line::Heading {
            level: level as u8,
            text,
        })
    }

    fn numbered(trimmed: &'a str) -> Option<Line<'a>> {
        let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits > 9 {
            return None;
        }
        let text = trimmed[digits..].strip_prefix(". ")?;
        Some(Line::Numbered {
            number: trimmed[..digits].parse().ok()?,
            text: text.trim(),
        })
    }

    fn is_closing_fence(line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.len() >= FENCE.len() && trimmed.bytes().all(|b| b == b'`')
    }
}

/// Scans `body` into blocks, each paired with the 1-based line number it
/// starts on. Heading blocks come back without anchors.
pub fn tokenize(body: &str) -> Vec<(usize, Block)> {
    let lines: Vec<&str> = body.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let position = i + 1;
        i += 1;
        let block = match Line::classify(lines[i - 1]) {
            Line::Blank => continue,
            Line::Heading { level, text } => Block::Heading {
                level,
                text: text.to_owned(),
                anchor: None,
            },
            Line::Fence { language } => {
                let mut code = Vec::new();
                while i < lines.len() {
                    i += 1;
                    if Line::is_closing_fence(lines[i - 1]) {
                        break;
                    }
                    code.push(lines[i - 1]);
                }
                Block::Code {
                    language: language.map(str::to_owned),
                    code: code.join("\n"),
                }
            }
            Line::Bullet(first) => {
                let mut items = vec![first.to_owned()];
                while i < lines.len() {
                    match Line::classify(lines[i]) {
                        Line::Bullet(text) => items.push(text.to_owned()),
                        Line::Text(text) => continue_item(&mut items, text),
                        _ => break,
                    }
                    i += 1;
                }
                Block::UnorderedList(items)
            }
            Line::Numbered { number, text } => {
                let mut items = vec![text.to_owned()];
                while i < lines.len() {
                    match Line::classify(lines[i]) {
                        Line::Numbered { text, .. } => items.push(text.to_owned()),
                        Line::Text(text) => continue_item(&mut items, text),
                        _ => break,
                    }
                    i += 1;
                }
                Block::OrderedList {
                    start: number,
                    items,
                }
            }
            Line::Quote(first) => {
                let mut quoted = vec![first];
                while i < lines.len() {
                    match Line::classify(lines[i]) {
                        Line::Quote(text) => quoted.push(text),
                        _ => break,
                    }
                    i += 1;
                }
                Block::Quote(quoted.join("\n"))
            }
            Line::Text(first) => {
                let mut text = first.to_owned();
                while i < lines.len() {
                    match Line::classify(lines[i]) {
                        Line::Text(more) => {
                            text.push('\n');
                            text.push_str(more);
                        }
                        _ => break,
                    }
                    i += 1;
                }
                Block::Paragraph(text)
            }
        };
        blocks.push((position, block));
    }

    blocks
}

fn continue_item(items: &mut [String], text: &str) {
    if let Some(last) = items.last_mut() {
        last.push('\n');
        last.push_str(text);
    }
}
