//! Grants Forms - form definitions and the page engine
//!
//! Forms are declared in YAML, one file per form. Each page names a
//! [`PageKind`]; the [`FormsEngine`] resolves a request to a page and hands
//! it to the [`PageBehavior`] for that kind:
//!
//! - [`QuestionPage`]: collects answers and records the visited section
//! - [`SummaryPage`]: shows answers, maps them and submits to GAS
//! - [`StatusPage`]: confirms the submission
//! - [`GenericPage`]: static content
//!
//! # Example
//!
//! ```rust
//! use grants_forms::FormDefinition;
//!
//! let form = FormDefinition::from_yaml(
//!     "slug: eligibility\ntitle: Check\npages:\n  - { path: start, title: Start, kind: generic }\n",
//! )
//! .unwrap();
//! assert_eq!(form.page_url("start"), "/eligibility/start");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod answers;
pub mod definition;
pub mod engine;
pub mod error;
pub mod page;
pub mod registry;
pub mod view;

pub use answers::{collect_answers, FieldError, PageAnswers};
pub use definition::{
    FieldDefinition, FieldType, FormDefinition, FormMetadata, PageDefinition, PageKind,
};
pub use engine::FormsEngine;
pub use error::FormError;
pub use page::{
    default_behaviors, GenericPage, PageBehavior, PageContext, PageServices, QuestionPage,
    StatusPage, SummaryPage,
};
pub use registry::FormRegistry;
pub use view::{PageResponse, ViewModel};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
