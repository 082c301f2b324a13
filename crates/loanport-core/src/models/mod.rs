//! Data models for the upload pipeline
//!
//! Each sub-module covers one area: files in flight, document tags, financing
//! products and the requirements derived from them.

mod document_type;
mod financing;
mod requirement;
mod upload;

pub use document_type::*;
pub use financing::*;
pub use requirement::*;
pub use upload::*;
