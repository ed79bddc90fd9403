//! Field paths into record trees.

use std::fmt;

use crate::record::ID_FIELD;

/// Errors related to field path parsing and validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path component is unusable.
    #[error("invalid field path component '{component}' at position {position}: {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path as a whole is unusable.
    #[error("invalid field path: {message}")]
    InvalidPath { message: String },
}

/// A validated, non-empty sequence of field names leading from a record's
/// root to one nested leaf.
///
/// Written in dotted form: `"address.city"` names the `city` field of the
/// mapping held in the record's `address` field. Paths are parsed once, when
/// a table is configured, never at each access.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldPath {
    components: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path.
    ///
    /// ```rust
    /// use kvtables_core::FieldPath;
    ///
    /// let path = FieldPath::parse("address.city").unwrap();
    /// assert_eq!(path.len(), 2);
    /// assert_eq!(path.to_string(), "address.city");
    ///
    /// assert!(FieldPath::parse("").is_err());
    /// assert!(FieldPath::parse("a..b").is_err());
    /// assert!(FieldPath::parse("id").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::InvalidPath {
                message: "empty path".to_string(),
            });
        }
        Self::new(s.split('.').map(str::to_string).collect())
    }

    /// Build a path from already separated components, validating each.
    pub fn new(components: Vec<String>) -> Result<Self, PathError> {
        if components.is_empty() {
            return Err(PathError::InvalidPath {
                message: "empty path".to_string(),
            });
        }
        for (position, component) in components.iter().enumerate() {
            if component.is_empty() {
                return Err(PathError::InvalidComponent {
                    component: component.clone(),
                    position,
                    message: "empty component".to_string(),
                });
            }
        }
        if components[0] == ID_FIELD {
            return Err(PathError::InvalidComponent {
                component: components[0].clone(),
                position: 0,
                message: "the record id cannot be mapped".to_string(),
            });
        }
        Ok(FieldPath { components })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("."))
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

/// Macro for writing field paths known to be valid.
///
/// # Example
///
/// ```rust
/// use kvtables_core::field_path;
///
/// let p = field_path!("profile.born");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! field_path {
    ($s:expr) => {
        $crate::FieldPath::parse($s).expect("invalid field path literal")
    };
}
