use std::fmt;

use mw_model::{Flag, LayoutMode, Position};

use crate::rotation::product_index;

/// Items at offsets -1, 0 and +1 around the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slides {
    pub prev: String,
    pub curr: String,
    pub next: String,
}

/// Everything a presenter needs to draw one settled screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Global rotation index the frame was derived from.
    pub global_index: i64,
    /// Product index of the current slide.
    pub item: usize,
    /// Number of products in rotation.
    pub len: usize,
    /// `None` when there is nothing to show.
    pub slides: Option<Slides>,
    pub layout: LayoutMode,
    pub production_mode: Flag,
}

impl Frame {
    /// Frame for `global` on the screen at `position`.
    pub fn at(
        products: &[String],
        global: i64,
        position: Position,
        layout: LayoutMode,
        production_mode: Flag,
    ) -> Self {
        let len = products.len();
        let slide = |offset: i64| products[product_index(global, position, offset, len)].clone();
        let slides = (len > 0).then(|| Slides {
            prev: slide(-1),
            curr: slide(0),
            next: slide(1),
        });
        Self {
            global_index: global,
            item: product_index(global, position, 0, len),
            len,
            slides,
            layout,
            production_mode,
        }
    }

    /// Frame of a static group: the first product, no neighbours.
    pub fn fixed(products: &[String], layout: LayoutMode, production_mode: Flag) -> Self {
        let slides = products.first().map(|first| Slides {
            prev: String::new(),
            curr: first.clone(),
            next: String::new(),
        });
        Self {
            global_index: 0,
            item: 0,
            len: products.len(),
            slides,
            layout,
            production_mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_none()
    }

    /// Current item, if any.
    pub fn current(&self) -> Option<&str> {
        self.slides.as_ref().map(|s| s.curr.as_str())
    }
}

/// Status line shown under the slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStatus {
    /// Nothing to show yet.
    Waiting,
    /// Just (re)synchronized to a published epoch.
    Synchronized,
    Stopped,
    /// 1-based item number out of `of`.
    Showing { item: usize, of: usize },
}

impl ScreenStatus {
    pub fn showing(frame: &Frame) -> Self {
        if frame.is_empty() {
            Self::Waiting
        } else {
            Self::Showing {
                item: frame.item + 1,
                of: frame.len,
            }
        }
    }
}

impl fmt::Display for ScreenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenStatus::Waiting => f.write_str("waiting for controller"),
            ScreenStatus::Synchronized => f.write_str("synchronized"),
            ScreenStatus::Stopped => f.write_str("stopped"),
            ScreenStatus::Showing { item, of } => write!(f, "item {item} of {of}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<String> {
        vec!["A".into(), "B".into(), "C".into()]
    }

    #[test]
    fn slides_surround_the_current_item() {
        let frame = Frame::at(&abc(), 2, 0, LayoutMode::Card, Flag::disabled());
        let slides = frame.slides.unwrap();
        assert_eq!((slides.prev.as_str(), slides.curr.as_str(), slides.next.as_str()), ("B", "C", "A"));
        assert_eq!(frame.item, 2);
    }

    #[test]
    fn position_shifts_the_phase() {
        let frame = Frame::at(&abc(), 2, 1, LayoutMode::Card, Flag::disabled());
        assert_eq!(frame.current(), Some("A"));
    }

    #[test]
    fn empty_products_have_no_slides() {
        let frame = Frame::at(&[], 5, 3, LayoutMode::Card, Flag::disabled());
        assert!(frame.is_empty());
        assert_eq!(ScreenStatus::showing(&frame), ScreenStatus::Waiting);
    }

    #[test]
    fn status_text() {
        assert_eq!(ScreenStatus::Showing { item: 2, of: 3 }.to_string(), "item 2 of 3");
        assert_eq!(ScreenStatus::Waiting.to_string(), "waiting for controller");
    }
}
