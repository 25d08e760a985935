//! Forms engine
//!
//! Resolves `/{slug}/{page}` to a page of a loaded form and dispatches to
//! the behavior registered for the page's kind.

use crate::definition::{FormDefinition, PageKind};
use crate::page::{default_behaviors, PageBehavior, PageContext, PageServices};
use crate::registry::FormRegistry;
use crate::view::PageResponse;
use grants_services::{AppError, AppResult, Session};
use grants_state::keys;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

enum Method<'p> {
    Get,
    Post(&'p [(String, String)]),
}

/// Dispatches form requests to page behaviors
#[derive(Debug, Clone)]
pub struct FormsEngine {
    registry: FormRegistry,
    services: PageServices,
    behaviors: HashMap<PageKind, Arc<dyn PageBehavior>>,
}

impl FormsEngine {
    /// Create engine with the built-in behaviors
    #[must_use]
    pub fn new(registry: FormRegistry, services: PageServices) -> Self {
        let behaviors = default_behaviors()
            .into_iter()
            .map(|behavior| (behavior.kind(), behavior))
            .collect();
        Self {
            registry,
            services,
            behaviors,
        }
    }

    /// Replace the behavior for a page kind
    #[must_use]
    pub fn with_behavior(mut self, behavior: Arc<dyn PageBehavior>) -> Self {
        self.behaviors.insert(behavior.kind(), behavior);
        self
    }

    /// Loaded forms
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &FormRegistry {
        &self.registry
    }

    /// Form by slug
    pub fn form(&self, slug: &str) -> AppResult<Arc<FormDefinition>> {
        self.registry
            .get(slug)
            .ok_or_else(|| AppError::not_found(format!("form '{slug}' not found")).with_context("slug", slug))
    }

    /// URL of a form's first page
    pub fn start_path(&self, slug: &str) -> AppResult<String> {
        let form = self.form(slug)?;
        Ok(form.page_url(&form.first_page().path))
    }

    /// Handle a GET for a page
    pub async fn get(&self, session: &mut Session, slug: &str, path: &str) -> AppResult<PageResponse> {
        self.dispatch(session, slug, path, Method::Get).await
    }

    /// Handle a POST for a page
    pub async fn post(
        &self,
        session: &mut Session,
        slug: &str,
        path: &str,
        posted: &[(String, String)],
    ) -> AppResult<PageResponse> {
        self.dispatch(session, slug, path, Method::Post(posted)).await
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        slug: &str,
        path: &str,
        method: Method<'_>,
    ) -> AppResult<PageResponse> {
        let form = self.form(slug)?;
        let page = form.page(path).ok_or_else(|| {
            AppError::not_found(format!("page '{path}' not found"))
                .with_context("slug", slug)
                .with_context("page", path)
        })?;
        let behavior = self.behaviors.get(&page.kind).ok_or_else(|| {
            AppError::internal(format!("no behavior registered for {:?} pages", page.kind))
        })?;

        let Session {
            identity, journeys, ..
        } = session;
        let journey = journeys.entry(form.slug.clone()).or_default();

        if journey.is_submitted() && page.kind != PageKind::Status {
            if let Some(status) = form.page_of_kind(PageKind::Status) {
                return Ok(PageResponse::redirect(form.page_url(&status.path)));
            }
        }

        if !journey.is_submitted() {
            identity.apply_to(&mut journey.answers);
            if let Some(scheme) = &form.metadata.scheme {
                journey
                    .answers
                    .insert_if_absent(keys::SCHEME, Value::String(scheme.clone()));
            }
            if let Some(year) = form.metadata.year {
                journey.answers.insert_if_absent(keys::YEAR, Value::from(year));
            }
        }

        let mut ctx = PageContext {
            form: &form,
            page,
            journey,
            identity,
            services: &self.services,
        };

        match method {
            Method::Get => behavior.handle_get(&mut ctx).await,
            Method::Post(posted) => behavior.handle_post(&mut ctx, posted).await,
        }
    }
}
