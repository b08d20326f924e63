//! On-demand access to all-sky camera frames.
use crate::loader::error::LoaderError;
use ndarray::{s, Array3, Array4};
use std::fmt;
use std::sync::Arc;

/// A stack of image frames held by a container. Frames are only read when requested.
pub trait ImageStack: Send + Sync {
    /// Number of frames in the stack
    fn len(&self) -> usize;

    /// Reads frame `index` as height x width x channels pixels.
    /// Callers guarantee `index < self.len()`.
    fn frame(&self, index: usize) -> Result<Array3<u8>, LoaderError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Image stack already held in memory, frames x height x width x channels
#[derive(Debug, Clone)]
pub struct MemoryImages {
    pixels: Array4<u8>,
}

impl MemoryImages {
    pub fn new(pixels: Array4<u8>) -> MemoryImages {
        MemoryImages { pixels }
    }
}

impl ImageStack for MemoryImages {
    fn len(&self) -> usize {
        self.pixels.shape()[0]
    }

    fn frame(&self, index: usize) -> Result<Array3<u8>, LoaderError> {
        Ok(self.pixels.slice(s![index, .., .., ..]).to_owned())
    }
}

/// Handle to an image dataset. Cloning shares the underlying stack.
#[derive(Clone)]
pub struct LazyImages {
    stack: Arc<dyn ImageStack>,
}

impl LazyImages {
    pub fn new(stack: Arc<dyn ImageStack>) -> LazyImages {
        LazyImages { stack }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Fetches a single frame from the underlying stack.
    ///
    /// # Errors
    /// Will return `Err` if `index` is out of range or the stack cannot be read.
    pub fn get(&self, index: usize) -> Result<Array3<u8>, LoaderError> {
        let len = self.stack.len();
        if index >= len {
            return Err(LoaderError::ImageIndex { index, len });
        }
        self.stack.frame(index)
    }
}

impl fmt::Debug for LazyImages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyImages").field("len", &self.len()).finish()
    }
}
