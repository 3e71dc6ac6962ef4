//! Minimal markdown → [`LayoutJob`] conversion for the result panes.
//! Covers what the model actually emits: paragraphs, headings, bold,
//! italics, inline code and (nested) lists.

use egui::text::{LayoutJob, TextFormat};
use egui::{Color32, FontId};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

#[derive(Debug, Clone)]
pub struct MarkdownStyle {
    pub body_size: f32,
    pub text: Color32,
    pub strong: Color32,
    pub code_background: Color32,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            body_size: 15.0,
            text: Color32::from_gray(200),
            strong: Color32::WHITE,
            code_background: Color32::from_gray(50),
        }
    }
}

impl MarkdownStyle {
    pub fn from_visuals(visuals: &egui::Visuals) -> Self {
        Self {
            text: visuals.text_color(),
            strong: visuals.strong_text_color(),
            code_background: visuals.code_bg_color,
            ..Self::default()
        }
    }

    fn heading_size(&self, level: HeadingLevel) -> f32 {
        match level {
            HeadingLevel::H1 => self.body_size * 1.6,
            HeadingLevel::H2 => self.body_size * 1.35,
            HeadingLevel::H3 => self.body_size * 1.2,
            _ => self.body_size * 1.05,
        }
    }
}

struct Renderer<'s> {
    style: &'s MarkdownStyle,
    job: LayoutJob,
    strong: usize,
    emphasis: usize,
    heading: Option<HeadingLevel>,
    // One entry per open list: the next ordinal, or None for bullets.
    lists: Vec<Option<u64>>,
}

impl<'s> Renderer<'s> {
    fn new(style: &'s MarkdownStyle) -> Self {
        Self {
            style,
            job: LayoutJob::default(),
            strong: 0,
            emphasis: 0,
            heading: None,
            lists: Vec::new(),
        }
    }

    fn format(&self) -> TextFormat {
        let size = self.heading.map_or(self.style.body_size, |l| self.style.heading_size(l));
        let color = if self.strong > 0 || self.heading.is_some() {
            self.style.strong
        } else {
            self.style.text
        };
        TextFormat {
            font_id: FontId::proportional(size),
            color,
            italics: self.emphasis > 0,
            ..Default::default()
        }
    }

    fn push(&mut self, text: &str) {
        let format = self.format();
        self.job.append(text, 0.0, format);
    }

    /// Makes the output end in at least `count` newlines, unless nothing has
    /// been written yet.
    fn ensure_break(&mut self, count: usize) {
        if self.job.text.is_empty() {
            return;
        }
        let existing = self.job.text.len() - self.job.text.trim_end_matches('\n').len();
        if existing < count {
            let newlines = "\n".repeat(count - existing);
            self.push(&newlines);
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                let gap = if self.lists.is_empty() { 2 } else { 1 };
                self.ensure_break(gap);
            }
            Tag::Heading(level, _, _) => {
                self.ensure_break(2);
                self.heading = Some(level);
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.ensure_break(2);
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.ensure_break(1);
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let prefix = format!("{}{}", "    ".repeat(depth), marker);
                self.push(&prefix);
            }
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading(..) => self.heading = None,
            Tag::List(_) => {
                self.lists.pop();
            }
            Tag::Strong => self.strong = self.strong.saturating_sub(1),
            Tag::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            _ => {}
        }
    }

    fn code(&mut self, code: &str) {
        let mut format = self.format();
        format.font_id = FontId::monospace(self.style.body_size * 0.9);
        format.background = self.style.code_background;
        self.job.append(code, 0.0, format);
    }
}

pub fn markdown_layout(markdown: &str, style: &MarkdownStyle) -> LayoutJob {
    let mut renderer = Renderer::new(style);
    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(tag) => renderer.start(tag),
            Event::End(tag) => renderer.end(tag),
            Event::Text(text) => renderer.push(&text),
            Event::Code(code) => renderer.code(&code),
            Event::SoftBreak => renderer.push(" "),
            Event::HardBreak => renderer.push("\n"),
            Event::Rule => renderer.ensure_break(2),
            _ => {}
        }
    }
    renderer.job
}
