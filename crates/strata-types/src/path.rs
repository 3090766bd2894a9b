use std::fmt;
use std::sync::Arc;

/// Immutable chain of field names and list positions.
///
/// Paths are only used to attribute translation errors to the node that
/// caused them; they never affect the data. Extending a path is cheap: every
/// segment shares its parent.
#[derive(Clone, Default)]
pub struct Path(Option<Arc<Segment>>);

struct Segment {
    parent: Path,
    part: Part,
}

enum Part {
    Field(String),
    Index(usize),
}

impl Path {
    /// The empty root path.
    pub fn root() -> Self {
        Self(None)
    }

    /// A child path naming a field.
    pub fn extend(&self, name: impl Into<String>) -> Self {
        Self(Some(Arc::new(Segment {
            parent: self.clone(),
            part: Part::Field(name.into()),
        })))
    }

    /// A child path naming a position inside a list.
    pub fn index(&self, position: usize) -> Self {
        Self(Some(Arc::new(Segment {
            parent: self.clone(),
            part: Part::Index(position),
        })))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// Number of segments from the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = &self.0;
        while let Some(segment) = cursor {
            depth += 1;
            cursor = &segment.parent.0;
        }
        depth
    }

    fn parts(&self) -> Vec<&Part> {
        let mut parts = Vec::new();
        let mut cursor = &self.0;
        while let Some(segment) = cursor {
            parts.push(&segment.part);
            cursor = &segment.parent.0;
        }
        parts.reverse();
        parts
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "<root>");
        }
        for (i, part) in self.parts().into_iter().enumerate() {
            match part {
                Part::Field(name) if i == 0 => write!(f, "{name}")?,
                Part::Field(name) => write!(f, ".{name}")?,
                Part::Index(pos) => write!(f, "[{pos}]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}
