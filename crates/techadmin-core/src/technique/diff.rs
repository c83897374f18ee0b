//! Change-set computation over two structurally identical records.
//!
//! A record type describes itself as a list of [`Field`]s, each with its own
//! equality rule. [`change_set`] walks that list and reports which fields
//! differ between an original snapshot and a working copy.
//!
//! ```
//! use techadmin_core::technique::diff::{Field, change_set};
//!
//! struct Point { x: i32, tags: Vec<String> }
//!
//! fn x(p: &Point) -> &i32 { &p.x }
//! fn tags(p: &Point) -> Vec<String> { p.tags.clone() }
//!
//! let fields = vec![Field::scalar("x", x), Field::sequence("tags", tags)];
//! let a = Point { x: 1, tags: vec!["a".into()] };
//! let b = Point { x: 2, tags: vec!["a".into()] };
//!
//! let changes = change_set(&a, &b, &fields);
//! assert!(changes.contains("x"));
//! assert!(!changes.contains("tags"));
//! ```

type Differs<R> = Box<dyn Fn(&R, &R) -> bool + Send + Sync>;

/// One comparable field of a record.
pub struct Field<R> {
    name: &'static str,
    differs: Differs<R>,
}

impl<R: 'static> Field<R> {
    /// A field compared by plain equality of the borrowed value.
    pub fn scalar<T>(name: &'static str, get: fn(&R) -> &T) -> Self
    where
        T: PartialEq + ?Sized + 'static,
    {
        Self {
            name,
            differs: Box::new(move |original, current| get(original) != get(current)),
        }
    }

    /// A sequence field compared element by element, in order.
    ///
    /// `get` produces the normalised sequence for each side, so any
    /// filtering applied before comparison is the same for both records.
    pub fn sequence<T>(name: &'static str, get: fn(&R) -> Vec<T>) -> Self
    where
        T: PartialEq + 'static,
    {
        Self {
            name,
            differs: Box::new(move |original, current| get(original) != get(current)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn differs(&self, original: &R, current: &R) -> bool {
        (self.differs)(original, current)
    }
}

impl<R> std::fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

/// Names of the fields that differ, in field-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changed: Vec<&'static str>,
}

impl ChangeSet {
    pub fn contains(&self, name: &str) -> bool {
        self.changed.iter().any(|changed| *changed == name)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changed.iter().copied()
    }
}

/// Compares every field of `current` against `original` independently.
pub fn change_set<R: 'static>(original: &R, current: &R, fields: &[Field<R>]) -> ChangeSet {
    ChangeSet {
        changed: fields
            .iter()
            .filter(|field| field.differs(original, current))
            .map(Field::name)
            .collect(),
    }
}
