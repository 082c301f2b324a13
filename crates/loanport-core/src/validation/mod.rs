//! Validation modules

pub mod file;
pub mod requirements;
pub mod screening;

pub use file::FileValidator;
pub use requirements::{
    cross_category_duplicates, normalize_label, required_count_for, requirement_key,
    validate_items, validate_requirements,
};
pub use screening::{screen_document, ScreeningReport, ScreeningStatus};
