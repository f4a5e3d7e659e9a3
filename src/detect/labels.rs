use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelsError {
    #[error("failed to read labels file: {0}")]
    Io(#[from] std::io::Error),
    #[error("labels file is empty")]
    Empty,
    #[error("class {0:?} not found in label set")]
    ClassNotFound(String),
}

/// Ordered class names; line order in the file defines the class indices the
/// network was trained with.
#[derive(Debug, Clone)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelsError> {
        let content = std::fs::read_to_string(path)?;
        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Err(LabelsError::Empty);
        }

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Like `index_of`, but a missing class is a startup error.
    pub fn require(&self, name: &str) -> Result<usize, LabelsError> {
        self.index_of(name)
            .ok_or_else(|| LabelsError::ClassNotFound(name.to_string()))
    }
}
