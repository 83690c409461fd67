use askama::Template;

use crate::streams::Stream;
use crate::theme::{colorize, Labeled, Palette};

/// One round stream button on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamButton {
    pub value: usize, // Form value, 1-based (0 = off)
    pub title: String,
    pub label: String,
    pub color: String,
    pub selected: bool,
}

impl Labeled for StreamButton {
    fn label(&self) -> &str {
        &self.label
    }

    fn set_label(&mut self, label: String) {
        self.label = label;
    }

    fn set_color(&mut self, color: &str) {
        self.color = color.to_string();
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub buttons: Vec<StreamButton>,
    pub selection: usize,
    pub volume: u8,
}

impl IndexPage {
    pub fn new(streams: &[Stream], palette: &Palette, selection: usize, volume: u8) -> Self {
        let mut buttons: Vec<StreamButton> = streams
            .iter()
            .enumerate()
            .map(|(i, stream)| StreamButton {
                value: i + 1,
                title: stream.name.clone(),
                label: stream.name.clone(),
                color: String::new(),
                selected: selection == i + 1,
            })
            .collect();

        colorize(&mut buttons, palette);

        Self {
            buttons,
            selection,
            volume,
        }
    }
}
