//! Document operations. Each call opens its own handle, does one job, writes
//! its output and returns an outcome whose `Display` is the status line shown
//! to the user.

pub mod info;
pub mod loader;
pub mod merge;
pub mod organize;
pub mod pages;
pub mod security;
pub mod split;
pub mod text;

#[doc(hidden)]
pub mod fixtures;

pub use info::{get_info, get_properties, page_layouts, DocumentInfo, PageLayout, PdfProperties};
pub use loader::load_pdf;
pub use merge::{merge_pdfs, mix_pdfs, MergeOutcome};
pub use organize::{rotate_pages, OrganizeOutcome, Organizer, PageEdit, RotateOutcome};
pub use security::{protect_pdf, ProtectOutcome};
pub use split::{
    extract_range, split_all, split_pdf, split_preview, RangeOutcome, SplitMode, SplitOutcome,
    SplitPreview,
};
pub use text::{extract_text, save_text, ExtractedText, TextOutcome};
