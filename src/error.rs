use std::fmt;

// Fatal import failures. Everything less severe than these is collected
// as a warning string on the image and parsing continues.
#[derive(Debug)]
pub enum LoadError {
    Xml(roxmltree::Error),
    NotSvg,
    Io(std::io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Xml(err) => write!(f, "failed parsing XML: {}", err),
            LoadError::NotSvg => write!(f, "Root element was not <svg>."),
            LoadError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Xml(err) => Some(err),
            LoadError::Io(err) => Some(err),
            LoadError::NotSvg => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(value: std::io::Error) -> Self {
        LoadError::Io(value)
    }
}

impl From<roxmltree::Error> for LoadError {
    fn from(value: roxmltree::Error) -> Self {
        LoadError::Xml(value)
    }
}

// Fatal export failures. Per-object export problems are collected as
// warning strings and returned alongside the result instead.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(value: std::io::Error) -> Self {
        SaveError::Io(value)
    }
}
