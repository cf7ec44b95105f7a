//! Per-row attributes supplied by the emulation alongside each image.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct LineProperty: u8 {
        /// The row continues on the next row (soft wrap).
        const WRAPPED       = 1 << 0;
        const DOUBLE_WIDTH  = 1 << 1;
        /// Both halves of a double-height pair carry this bit; only the
        /// upper one is painted.
        const DOUBLE_HEIGHT = 1 << 2;
    }
}

/// Ordered row attributes. Rows past the end have no attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineProperties {
    props: Vec<LineProperty>,
}

impl LineProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(props: Vec<LineProperty>) -> Self {
        Self { props }
    }

    pub fn get(&self, row: usize) -> LineProperty {
        self.props.get(row).copied().unwrap_or_default()
    }

    pub fn set(&mut self, row: usize, prop: LineProperty) {
        if row >= self.props.len() {
            self.props.resize(row + 1, LineProperty::empty());
        }
        self.props[row] = prop;
    }

    pub fn is_wrapped(&self, row: usize) -> bool {
        self.get(row).contains(LineProperty::WRAPPED)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}
