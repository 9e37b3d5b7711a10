// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plain-text display components used by the views.

use std::fmt::Write as _;

/// Boxed panel with optional header and footer.
#[derive(Debug, Clone, Default)]
pub struct Card {
    header: Option<String>,
    body: String,
    footer: Option<String>,
}

impl Card {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn render(&self) -> String {
        let sections: Vec<&str> = self
            .header
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.body.as_str()))
            .chain(self.footer.iter().map(String::as_str))
            .collect();

        let width = sections
            .iter()
            .flat_map(|s| s.lines())
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);

        let rule = "─".repeat(width + 2);
        let mut out = String::new();
        let _ = writeln!(out, "┌{}┐", rule);
        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                let _ = writeln!(out, "├{}┤", rule);
            }
            for line in section.lines() {
                let pad = width - line.chars().count();
                let _ = writeln!(out, "│ {}{} │", line, " ".repeat(pad));
            }
            if section.is_empty() {
                let _ = writeln!(out, "│ {} │", " ".repeat(width));
            }
        }
        let _ = write!(out, "└{}┘", rule);
        out
    }
}

/// Kind of value an [`Input`] holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputType {
    #[default]
    Text,
    Email,
    Tel,
    Date,
}

impl InputType {
    fn placeholder(&self) -> &'static str {
        match self {
            InputType::Text => "",
            InputType::Email => "name@example.com",
            InputType::Tel => "+65 9123 4567",
            InputType::Date => "YYYY-MM-DD",
        }
    }
}

/// Labelled single-line field. An error replaces the helper text.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub label: String,
    pub value: String,
    pub input_type: InputType,
    pub required: bool,
    pub disabled: bool,
    pub error: Option<String>,
    pub helper_text: Option<String>,
}

impl Input {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn error(mut self, error: Option<&str>) -> Self {
        self.error = error.map(str::to_string);
        self
    }

    pub fn helper_text(mut self, text: impl Into<String>) -> Self {
        self.helper_text = Some(text.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = render_label(&self.label, self.required, self.disabled);
        let value = if self.value.is_empty() {
            self.input_type.placeholder()
        } else {
            self.value.as_str()
        };
        let _ = write!(out, "\n  > {}", value);
        out.push_str(&render_message(self.error.as_deref(), self.helper_text.as_deref()));
        out
    }
}

/// Labelled multi-line field.
#[derive(Debug, Clone)]
pub struct Textarea {
    pub label: String,
    pub value: String,
    pub rows: usize,
    pub required: bool,
    pub disabled: bool,
    pub error: Option<String>,
    pub helper_text: Option<String>,
}

impl Textarea {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            rows: 4,
            required: false,
            disabled: false,
            error: None,
            helper_text: None,
        }
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn error(mut self, error: Option<&str>) -> Self {
        self.error = error.map(str::to_string);
        self
    }

    pub fn helper_text(mut self, text: impl Into<String>) -> Self {
        self.helper_text = Some(text.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = render_label(&self.label, self.required, self.disabled);
        let mut lines: Vec<&str> = self.value.lines().collect();
        while lines.len() < self.rows {
            lines.push("");
        }
        for line in lines {
            let _ = write!(out, "\n  | {}", line);
        }
        out.push_str(&render_message(self.error.as_deref(), self.helper_text.as_deref()));
        out
    }
}

fn render_label(label: &str, required: bool, disabled: bool) -> String {
    let mut out = label.to_string();
    if required {
        out.push_str(" *");
    }
    if disabled {
        out.push_str(" (disabled)");
    }
    out
}

fn render_message(error: Option<&str>, helper: Option<&str>) -> String {
    match (error, helper) {
        (Some(e), _) => format!("\n  ! {}", e),
        (None, Some(h)) => format!("\n    {}", h),
        (None, None) => String::new(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpinnerSize {
    Small,
    #[default]
    Medium,
    Large,
}

const SPINNER_FRAMES: [&str; 10] = [
    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
];

/// Busy indicator with a label.
#[derive(Debug, Clone)]
pub struct LoadingSpinner {
    size: SpinnerSize,
    label: String,
}

impl Default for LoadingSpinner {
    fn default() -> Self {
        Self {
            size: SpinnerSize::Medium,
            label: "Loading...".to_string(),
        }
    }
}

impl LoadingSpinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: SpinnerSize) -> Self {
        self.size = size;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Frame `tick` of the animation.
    pub fn frame(&self, tick: usize) -> String {
        let glyph = SPINNER_FRAMES[tick % SPINNER_FRAMES.len()];
        match self.size {
            SpinnerSize::Small => glyph.to_string(),
            SpinnerSize::Medium => format!("{} {}", glyph, self.label),
            SpinnerSize::Large => format!("{glyph} {glyph} {glyph}  {}", self.label),
        }
    }

    pub fn render(&self) -> String {
        self.frame(0)
    }
}
