// Ordered list of files with a current position

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Playlist {
    files: Vec<PathBuf>,
    current: usize,
}

impl Playlist {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Path> {
        self.files.get(self.current).map(PathBuf::as_path)
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    pub fn set_current(&mut self, index: usize) {
        if index < self.files.len() {
            self.current = index;
        }
    }

    /// Indices to try, in order, when moving forward from `start` (inclusive)
    pub fn forward_from(&self, start: usize) -> std::ops::Range<usize> {
        start.min(self.files.len())..self.files.len()
    }

    /// Indices to try, in order, when moving backward from `start` (inclusive)
    pub fn backward_from(&self, start: usize) -> std::iter::Rev<std::ops::Range<usize>> {
        (0..start.saturating_add(1).min(self.files.len())).rev()
    }

    /// Index before the current one, staying at the first file
    pub fn previous_index(&self) -> usize {
        self.current.saturating_sub(1)
    }
}
