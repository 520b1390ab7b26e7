use serde_json::{Map, Value};
use std::fmt;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A dotted, optionally bracket-indexed address inside a JSON document.
///
/// `book.author.name` walks three object keys; `items[0].name` walks the key
/// `items`, then the first element of that array, then the key `name`. The
/// empty string addresses the document root.
///
/// Array descent is always spelled with an explicit index. `items.name` is the
/// key `name` of an *object* stored at `items`, and does not resolve when
/// `items` is an array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

/// Largest array index a [`Path::write`] may create. Reads are not limited.
pub const MAX_WRITE_INDEX: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path {path:?}: {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: &'static str,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(s: &str) -> Result<Self, PathError> {
        let fail = |reason| PathError {
            path: s.to_owned(),
            reason,
        };

        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self { segments });
        }

        for part in s.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(i) => part.split_at(i),
                None => (part, ""),
            };

            if key.contains(']') {
                return Err(fail("unmatched ']'"));
            }

            if key.is_empty() && rest.is_empty() {
                return Err(fail("empty segment"));
            }

            // `a.[0]` would be a second spelling of `a[0]`.
            if key.is_empty() && !segments.is_empty() {
                return Err(fail("empty key before '['"));
            }

            if !key.is_empty() {
                segments.push(Segment::Key(key.to_owned()));
            }

            while !rest.is_empty() {
                let inner = rest.strip_prefix('[').ok_or_else(|| fail("unexpected text after ']'"))?;
                let close = inner.find(']').ok_or_else(|| fail("unclosed '['"))?;
                let index = inner[..close]
                    .parse::<usize>()
                    .map_err(|_| fail("array index is not a non-negative integer"))?;

                segments.push(Segment::Index(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Extends the path by one object key.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_owned()));
        Self { segments }
    }

    /// Extends the path by one array index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// The final segment as a display name, or `root` for the root path.
    pub fn name(&self) -> String {
        match self.segments.last() {
            None => "root".to_owned(),
            Some(Segment::Key(key)) => key.clone(),
            Some(Segment::Index(index)) => format!("[{}]", index),
        }
    }

    /// Reads the value at this path. Any missing key, out-of-range index or
    /// container mismatch along the way yields `None`.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Writes `new` at this path, creating intermediate containers as needed.
    ///
    /// A key segment turns a non-object into an empty object and an index
    /// segment turns a non-array into an empty array, padding it with nulls up
    /// to the index. Whatever was previously stored there is discarded.
    ///
    /// Fails without touching `target` when an index exceeds
    /// [`MAX_WRITE_INDEX`].
    pub fn write(&self, target: &mut Value, new: Value) -> Result<(), PathError> {
        let too_large = self
            .segments
            .iter()
            .any(|segment| matches!(segment, Segment::Index(index) if *index > MAX_WRITE_INDEX));
        if too_large {
            return Err(PathError {
                path: self.to_string(),
                reason: "array index too large to write",
            });
        }

        let mut current = target;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => {
                    if !current.is_object() {
                        *current = Value::Object(Map::new());
                    }

                    match current {
                        Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                        _ => unreachable!("object ensured above"),
                    }
                }
                Segment::Index(index) => {
                    if !current.is_array() {
                        *current = Value::Array(Vec::new());
                    }

                    match current {
                        Value::Array(items) => {
                            if let Some(len) = index.checked_add(1).filter(|len| *len > items.len()) {
                                items.resize(len, Value::Null);
                            }

                            &mut items[*index]
                        }
                        _ => unreachable!("array ensured above"),
                    }
                }
            };
        }

        *current = new;
        Ok(())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
