//! View models and page responses

use crate::answers::FieldError;
use crate::definition::{FormDefinition, PageDefinition};
use serde::Serialize;
use serde_json::Value;

/// Data a page renders with
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// Template name
    pub view: String,
    /// Page heading
    pub page_title: String,
    /// Form title
    pub service_name: String,
    /// Form slug
    pub form_slug: String,
    /// Page path below the slug
    pub page_path: String,
    /// URL of the previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_link: Option<String>,
    /// Page-specific data
    pub model: Value,
    /// Validation errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ViewModel {
    /// Create a view model for a page
    #[must_use]
    pub fn new(form: &FormDefinition, page: &PageDefinition, view: &str, model: Value) -> Self {
        Self {
            view: view.to_string(),
            page_title: page.title.clone(),
            service_name: form.title.clone(),
            form_slug: form.slug.clone(),
            page_path: page.path.clone(),
            back_link: form.previous_path(&page.path).map(|p| form.page_url(p)),
            model,
            errors: Vec::new(),
        }
    }

    /// Attach validation errors
    #[inline]
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    /// Remove the back link
    #[inline]
    #[must_use]
    pub fn without_back_link(mut self) -> Self {
        self.back_link = None;
        self
    }
}

/// What a page handler answers with
#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse {
    /// Render a view with a status
    Render {
        /// HTTP status
        status: u16,
        /// View to render
        view: ViewModel,
    },
    /// Redirect to a URL
    Redirect(String),
}

impl PageResponse {
    /// Render with 200
    #[inline]
    #[must_use]
    pub fn render(view: ViewModel) -> Self {
        Self::Render { status: 200, view }
    }

    /// Render validation errors with 400
    #[inline]
    #[must_use]
    pub fn invalid(view: ViewModel) -> Self {
        Self::Render { status: 400, view }
    }

    /// Redirect
    #[inline]
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect(location.into())
    }

    /// Redirect target, if this is a redirect
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect(location) => Some(location),
            Self::Render { .. } => None,
        }
    }
}
