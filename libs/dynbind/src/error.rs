use crate::location::Location;
use crate::path::{Path, PathElement};
use crate::value::Value;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures of [`lower`](crate::lower) and [`raise`](crate::raise).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported kind: {kind}")]
    UnsupportedKind { kind: String },

    #[error("{}{}{message}", location_prefix(.location), path_prefix(.path))]
    TypeMismatch {
        message: String,
        /// Position of the offending node below the value passed in.
        path: Path,
        location: Option<Location>,
    },
}

impl Error {
    /// Mismatch between `src` and the destination, e.g. "expected a map, found a sequence".
    pub(crate) fn expected(expected: &str, src: &Value) -> Self {
        Self::mismatch(format!("expected {expected}, found {}", src.kind().describe()), src)
    }

    pub(crate) fn mismatch(message: impl Into<String>, src: &Value) -> Self {
        Error::TypeMismatch {
            message: message.into(),
            path: Path::root(),
            location: src.locations().first().cloned(),
        }
    }

    /// Record that the error happened below `element`.
    ///
    /// Called while unwinding, so the outermost element ends up first.
    pub(crate) fn within(mut self, element: PathElement) -> Self {
        if let Error::TypeMismatch { path, .. } = &mut self {
            path.push_front(element);
        }
        self
    }

    pub(crate) fn within_key(self, key: &str) -> Self {
        self.within(PathElement::Key(key.to_owned()))
    }
}

fn location_prefix(location: &Option<Location>) -> String {
    match location {
        Some(location) if !location.is_empty() => format!("{location}: "),
        _ => String::new(),
    }
}

fn path_prefix(path: &Path) -> String {
    if path.is_root() {
        String::new()
    } else {
        format!("{path}: ")
    }
}
