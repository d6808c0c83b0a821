use image::GrayImage;
use serde::{Deserialize, Serialize};

/// One capture of the foreign application's board.
#[derive(Debug, Clone)]
pub enum Snapshot {
    /// 8-bit grayscale screen capture.
    Raster(GrayImage),
    /// Structural dump of the page hosting the board.
    Markup(MarkupNode),
}

impl Snapshot {
    pub fn kind(&self) -> &'static str {
        match self {
            Snapshot::Raster(_) => "raster",
            Snapshot::Markup(_) => "markup",
        }
    }
}

/// An element of a structural dump: its class list and its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupNode {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub fn new(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<MarkupNode>) -> Self {
        self.children = children;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Depth-first search for the first node carrying `class`, self included.
    pub fn find(&self, class: &str) -> Option<&MarkupNode> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(class))
    }
}
