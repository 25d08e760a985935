//! Form definitions
//!
//! A form is a YAML document listing its pages in order. Each page names the
//! behavior that handles it and, for question pages, the fields it asks for.

use crate::error::FormError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid")
});

static FIELD_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("field name pattern is valid")
});

/// Behavior that handles a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Asks for answers
    Question,
    /// Shows answers and submits
    Summary,
    /// Confirms a submission
    Status,
    /// Static content
    Generic,
}

/// How a posted field is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Trimmed string
    #[default]
    Text,
    /// Finite number
    Number,
    /// Boolean from yes/no or true/false
    YesNo,
    /// `SHEET-PARCEL` identifier, letters and digits on each side
    LandParcel,
    /// Action codes with `value`/`unit` details under dotted names
    Actions,
}

/// One field on a question page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// State key the answer is stored under
    pub name: String,
    /// Label shown to the applicant
    pub label: String,
    /// How the posted value is read
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether an answer must be given
    #[serde(default)]
    pub required: bool,
}

/// One page of a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDefinition {
    /// URL segment below the form slug
    pub path: String,
    /// Page heading
    pub title: String,
    /// Handling behavior
    pub kind: PageKind,
    /// Section recorded as visited when the page is answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Explicit next page; defaults to the following page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Static body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Fields asked on a question page
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Include Land Grants parcel details in the view model
    #[serde(default)]
    pub load_parcel: bool,
}

/// Values seeded into every journey of a form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormMetadata {
    /// Grant scheme code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Scheme year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

/// A complete form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefinition {
    /// URL slug
    pub slug: String,
    /// Service title
    pub title: String,
    /// Journey seed values
    #[serde(default)]
    pub metadata: FormMetadata,
    /// Pages in journey order
    pub pages: Vec<PageDefinition>,
}

impl FormDefinition {
    /// Parse and validate a YAML definition
    pub fn from_yaml(source: &str) -> Result<Self, FormError> {
        let form: Self = serde_yaml::from_str(source).map_err(FormError::Yaml)?;
        form.validate()?;
        Ok(form)
    }

    /// Check the definition is internally consistent
    pub fn validate(&self) -> Result<(), FormError> {
        let invalid = |message: String| FormError::Invalid {
            slug: self.slug.clone(),
            message,
        };

        if !SLUG_PATTERN.is_match(&self.slug) {
            return Err(invalid(format!("slug '{}' must be lower-case words joined by '-'", self.slug)));
        }
        if self.pages.is_empty() {
            return Err(invalid("form has no pages".to_string()));
        }

        let mut paths = HashSet::new();
        for page in &self.pages {
            if !SLUG_PATTERN.is_match(&page.path) {
                return Err(invalid(format!("page path '{}' is not url-safe", page.path)));
            }
            if !paths.insert(page.path.as_str()) {
                return Err(invalid(format!("duplicate page path '{}'", page.path)));
            }
        }

        let mut field_names = HashSet::new();
        for page in &self.pages {
            if let Some(next) = &page.next {
                if !paths.contains(next.as_str()) {
                    return Err(invalid(format!(
                        "page '{}' points to unknown page '{next}'",
                        page.path
                    )));
                }
            }
            if page.kind != PageKind::Question && !page.fields.is_empty() {
                return Err(invalid(format!(
                    "only question pages may declare fields ('{}')",
                    page.path
                )));
            }
            for field in &page.fields {
                if !FIELD_NAME_PATTERN.is_match(&field.name) {
                    return Err(invalid(format!("invalid field name '{}'", field.name)));
                }
                if !field_names.insert(field.name.as_str()) {
                    return Err(invalid(format!("field '{}' is asked twice", field.name)));
                }
            }
        }

        let count = |kind: PageKind| self.pages.iter().filter(|p| p.kind == kind).count();
        if count(PageKind::Summary) > 1 {
            return Err(invalid("form has more than one summary page".to_string()));
        }
        if count(PageKind::Status) > 1 {
            return Err(invalid("form has more than one status page".to_string()));
        }
        if count(PageKind::Summary) == 1 && count(PageKind::Status) == 0 {
            return Err(invalid("summary page needs a status page to land on".to_string()));
        }

        Ok(())
    }

    /// Page by path
    #[must_use]
    pub fn page(&self, path: &str) -> Option<&PageDefinition> {
        self.pages.iter().find(|p| p.path == path)
    }

    /// First page of the journey
    #[must_use]
    pub fn first_page(&self) -> &PageDefinition {
        &self.pages[0]
    }

    /// First page of a kind
    #[must_use]
    pub fn page_of_kind(&self, kind: PageKind) -> Option<&PageDefinition> {
        self.pages.iter().find(|p| p.kind == kind)
    }

    /// Path that follows a page
    #[must_use]
    pub fn next_path(&self, path: &str) -> Option<&str> {
        let index = self.pages.iter().position(|p| p.path == path)?;
        match &self.pages[index].next {
            Some(next) => Some(next.as_str()),
            None => self.pages.get(index + 1).map(|p| p.path.as_str()),
        }
    }

    /// Path that precedes a page in declaration order
    #[must_use]
    pub fn previous_path(&self, path: &str) -> Option<&str> {
        let index = self.pages.iter().position(|p| p.path == path)?;
        index
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .map(|p| p.path.as_str())
    }

    /// URL of a page
    #[must_use]
    pub fn page_url(&self, path: &str) -> String {
        format!("/{}/{}", self.slug, path)
    }

    /// Question pages in journey order
    pub fn question_pages(&self) -> impl Iterator<Item = &PageDefinition> {
        self.pages.iter().filter(|p| p.kind == PageKind::Question)
    }
}
