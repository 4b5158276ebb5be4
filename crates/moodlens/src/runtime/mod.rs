//! Shared runtime state

mod buffers;

pub use buffers::ModalityBuffers;
