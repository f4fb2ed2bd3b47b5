//! Post text to HTML rendering.
//!
//! Base markdown comes from `pulldown-cmark` (CommonMark, fenced code blocks
//! included, `~~strike~~` and `~sub~` enabled). On top of it:
//! - every single newline becomes a line break,
//! - `^^text^^` becomes `<sup>`,
//! - a single `~` pair the base parser left alone (because of emphasis
//!   flanking rules, as in `H~**2**~O`) still becomes `<sub>`.
//!
//! The extra pairs are matched across the inline events of one block, so
//! they may wrap emphasis, links or inline code. A pair only closes at the
//! nesting depth it was opened at, which keeps the output well-formed.
//! Unpaired delimiters stay literal. Runs of two or more tildes are never
//! rewritten here. Code blocks and image alt text are left untouched. Raw
//! HTML in the source passes through.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};

/// Inline spans paired on top of the base parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Sub,
    Sup,
}

impl Span {
    fn delimiter(self) -> &'static str {
        match self {
            Span::Sub => "~",
            Span::Sup => "^^",
        }
    }

    fn open_tag(self) -> &'static str {
        match self {
            Span::Sub => "<sub>",
            Span::Sup => "<sup>",
        }
    }

    fn close_tag(self) -> &'static str {
        match self {
            Span::Sub => "</sub>",
            Span::Sup => "</sup>",
        }
    }
}

/// An unmatched delimiter already emitted as literal text
#[derive(Debug)]
struct Opener {
    span: Span,
    /// Index of its `Event::Text` in the output
    at: usize,
    depth: usize,
}

/// Delimiter pairing state for the current block
#[derive(Debug, Default)]
struct Pairing {
    depth: usize,
    open: Vec<Opener>,
}

impl Pairing {
    fn enter(&mut self) {
        self.depth += 1;
    }

    /// Openers inside the closed inline element can no longer be paired
    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        let depth = self.depth;
        self.open.retain(|o| o.depth <= depth);
    }

    fn reset(&mut self) {
        self.depth = 0;
        self.open.clear();
    }

    fn push_text<'a>(&mut self, events: &mut Vec<Event<'a>>, text: &str) {
        let bytes = text.as_bytes();
        let mut plain_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            let (span, len) = match bytes[i] {
                b'^' if bytes.get(i + 1) == Some(&b'^') => (Some(Span::Sup), 2),
                b'~' => {
                    let run = bytes[i..].iter().take_while(|&&b| b == b'~').count();
                    ((run == 1).then_some(Span::Sub), run)
                }
                _ => (None, 1),
            };

            if let Some(span) = span {
                push_plain(events, &text[plain_start..i]);
                self.delimiter(events, span);
                plain_start = i + len;
            }
            i += len;
        }

        push_plain(events, &text[plain_start..]);
    }

    fn delimiter<'a>(&mut self, events: &mut Vec<Event<'a>>, span: Span) {
        let mut matched = None;
        for (pos, opener) in self.open.iter().enumerate().rev() {
            if opener.depth < self.depth {
                break;
            }
            if opener.span == span {
                matched = Some(pos);
                break;
            }
        }

        match matched {
            // At least one event of content between the pair
            Some(pos) if events.len() > self.open[pos].at + 1 => {
                let at = self.open[pos].at;
                events[at] = Event::InlineHtml(CowStr::Borrowed(span.open_tag()));
                events.push(Event::InlineHtml(CowStr::Borrowed(span.close_tag())));
                // Openers after the matched one would straddle the new tags
                self.open.truncate(pos);
            }
            _ => {
                self.open.push(Opener {
                    span,
                    at: events.len(),
                    depth: self.depth,
                });
                events.push(Event::Text(CowStr::Borrowed(span.delimiter())));
            }
        }
    }
}

fn push_plain<'a>(events: &mut Vec<Event<'a>>, text: &str) {
    if !text.is_empty() {
        events.push(Event::Text(text.to_string().into()));
    }
}

fn is_inline(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Subscript
            | Tag::Superscript
            | Tag::Link { .. }
    )
}

fn is_inline_end(tag: &TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Subscript
            | TagEnd::Superscript
            | TagEnd::Link
    )
}

/// Render stored post text as an HTML fragment
pub fn render(raw: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_SUBSCRIPT;
    let parser = Parser::new_ext(raw, options);

    let mut events: Vec<Event<'_>> = Vec::new();
    let mut pairing = Pairing::default();
    let mut in_code_block = false;
    let mut image_depth = 0usize;

    for event in TextMergeStream::new(parser) {
        match event {
            Event::Start(tag @ Tag::CodeBlock(_)) => {
                in_code_block = true;
                pairing.reset();
                events.push(Event::Start(tag));
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                events.push(Event::End(TagEnd::CodeBlock));
            }
            Event::Start(tag @ Tag::Image { .. }) => {
                image_depth += 1;
                pairing.enter();
                events.push(Event::Start(tag));
            }
            Event::End(TagEnd::Image) => {
                image_depth = image_depth.saturating_sub(1);
                pairing.leave();
                events.push(Event::End(TagEnd::Image));
            }
            Event::Start(tag) => {
                if is_inline(&tag) {
                    pairing.enter();
                } else {
                    pairing.reset();
                }
                events.push(Event::Start(tag));
            }
            Event::End(tag) => {
                if is_inline_end(&tag) {
                    pairing.leave();
                } else {
                    pairing.reset();
                }
                events.push(Event::End(tag));
            }
            Event::Text(text)
                if !in_code_block && image_depth == 0 && has_inline_delimiters(&text) =>
            {
                pairing.push_text(&mut events, &text);
            }
            Event::SoftBreak => events.push(Event::HardBreak),
            other => events.push(other),
        }
    }

    let mut output = String::with_capacity(raw.len() + raw.len() / 2);
    html::push_html(&mut output, events.into_iter());
    output
}

fn has_inline_delimiters(text: &str) -> bool {
    text.contains('~') || text.contains("^^")
}
