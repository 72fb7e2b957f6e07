use std::fmt;

/// Name of a node pin. Port arrays share a name and carry an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId {
    pub name: &'static str,
    pub index: Option<usize>,
}

impl PinId {
    pub const fn new(name: &'static str) -> Self {
        Self { name, index: None }
    }

    pub const fn indexed(name: &'static str, index: usize) -> Self {
        Self {
            name,
            index: Some(index),
        }
    }
}

impl From<&'static str> for PinId {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => f.write_str(self.name),
        }
    }
}
