//! Page behaviors
//!
//! Every page kind is handled by a [`PageBehavior`]. The engine resolves a
//! request to a page, builds a [`PageContext`] and calls `handle_get` or
//! `handle_post`; default methods cover rendering and sequencing so each
//! behavior only states what differs.

use crate::answers::{collect_answers, FieldError};
use crate::definition::{FormDefinition, PageDefinition, PageKind};
use crate::view::{PageResponse, ViewModel};
use async_trait::async_trait;
use grants_services::{
    AppError, AppResult, GrantApplicationService, Identity, JourneyState, LandGrantsApi,
};
use grants_state::{keys, split_land_parcel, state_to_gas_payload};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Backends page handlers may call
#[derive(Clone)]
pub struct PageServices {
    /// Grant Application Service
    pub gas: Arc<dyn GrantApplicationService>,
    /// Land Grants API
    pub land_grants: Arc<dyn LandGrantsApi>,
}

impl fmt::Debug for PageServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageServices").finish_non_exhaustive()
    }
}

/// Everything a handler sees for one request
pub struct PageContext<'a> {
    /// Form being filled in
    pub form: &'a FormDefinition,
    /// Requested page
    pub page: &'a PageDefinition,
    /// Journey state for this form
    pub journey: &'a mut JourneyState,
    /// Applicant identity
    pub identity: &'a Identity,
    /// Backends
    pub services: &'a PageServices,
}

impl PageContext<'_> {
    /// URL of a page of the current form
    #[inline]
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.form.page_url(path)
    }
}

/// How a kind of page renders and handles submissions
#[async_trait]
pub trait PageBehavior: Send + Sync + fmt::Debug {
    /// Page kind this behavior handles
    fn kind(&self) -> PageKind;

    /// Template name
    fn view_name(&self) -> &'static str;

    /// Page-specific view data
    async fn view_model(&self, ctx: &PageContext<'_>) -> AppResult<Value>;

    /// Answer a GET
    async fn handle_get(&self, ctx: &mut PageContext<'_>) -> AppResult<PageResponse> {
        let model = self.view_model(ctx).await?;
        Ok(PageResponse::render(ViewModel::new(
            ctx.form,
            ctx.page,
            self.view_name(),
            model,
        )))
    }

    /// Answer a POST
    async fn handle_post(
        &self,
        ctx: &mut PageContext<'_>,
        posted: &[(String, String)],
    ) -> AppResult<PageResponse>;

    /// URL of the page after this one
    fn next_path(&self, ctx: &PageContext<'_>) -> Option<String> {
        ctx.form
            .next_path(&ctx.page.path)
            .map(|path| ctx.url(path))
    }

    /// Move on to the next page, or stay when there is none
    fn proceed(&self, ctx: &PageContext<'_>) -> PageResponse {
        let location = self
            .next_path(ctx)
            .unwrap_or_else(|| ctx.url(&ctx.page.path));
        PageResponse::redirect(location)
    }
}

/// Asks for answers and stores them
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionPage;

impl QuestionPage {
    async fn parcel(&self, ctx: &PageContext<'_>) -> AppResult<Value> {
        if !ctx.page.load_parcel {
            return Ok(Value::Null);
        }
        let Some(land_parcel) = ctx.journey.answers.get_str(keys::LAND_PARCEL) else {
            return Ok(Value::Null);
        };
        let (sheet_id, parcel_id) = split_land_parcel(land_parcel);
        let parcel = ctx
            .services
            .land_grants
            .fetch_parcel(sheet_id, parcel_id)
            .await?;
        serde_json::to_value(parcel)
            .map_err(|e| AppError::internal("failed to encode parcel").with_source(e))
    }
}

#[async_trait]
impl PageBehavior for QuestionPage {
    fn kind(&self) -> PageKind {
        PageKind::Question
    }

    fn view_name(&self) -> &'static str {
        "question-page"
    }

    async fn view_model(&self, ctx: &PageContext<'_>) -> AppResult<Value> {
        let fields: Vec<Value> = ctx
            .page
            .fields
            .iter()
            .map(|field| {
                json!({
                    "name": field.name,
                    "label": field.label,
                    "type": field.field_type,
                    "required": field.required,
                    "value": ctx.journey.answers.get(&field.name),
                })
            })
            .collect();
        let parcel = self.parcel(ctx).await?;

        Ok(json!({
            "content": ctx.page.content,
            "fields": fields,
            "parcel": parcel,
        }))
    }

    async fn handle_post(
        &self,
        ctx: &mut PageContext<'_>,
        posted: &[(String, String)],
    ) -> AppResult<PageResponse> {
        let answers = match collect_answers(ctx.page, posted) {
            Ok(answers) => answers,
            Err(errors) => {
                tracing::debug!(
                    form = %ctx.form.slug,
                    page = %ctx.page.path,
                    errors = errors.len(),
                    "page answers failed validation"
                );
                return self.render_errors(ctx, errors).await;
            }
        };

        answers.apply_to(&mut ctx.journey.answers);
        if let Some(section) = &ctx.page.section {
            ctx.journey.visited_sections.record(section);
        }
        Ok(self.proceed(ctx))
    }
}

impl QuestionPage {
    async fn render_errors(
        &self,
        ctx: &PageContext<'_>,
        errors: Vec<FieldError>,
    ) -> AppResult<PageResponse> {
        let model = self.view_model(ctx).await?;
        Ok(PageResponse::invalid(
            ViewModel::new(ctx.form, ctx.page, self.view_name(), model).with_errors(errors),
        ))
    }
}

/// Shows every answer and submits the application
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryPage;

impl SummaryPage {
    /// First question page with a required field still unanswered
    fn first_incomplete<'f>(&self, ctx: &PageContext<'f>) -> Option<&'f PageDefinition> {
        let answers = &ctx.journey.answers;
        ctx.form.question_pages().find(|page| {
            page.fields
                .iter()
                .any(|field| field.required && answers.get_present(&field.name).is_none())
        })
    }
}

#[async_trait]
impl PageBehavior for SummaryPage {
    fn kind(&self) -> PageKind {
        PageKind::Summary
    }

    fn view_name(&self) -> &'static str {
        "check-answers-page"
    }

    async fn view_model(&self, ctx: &PageContext<'_>) -> AppResult<Value> {
        let rows: Vec<Value> = ctx
            .form
            .question_pages()
            .flat_map(|page| {
                page.fields.iter().map(move |field| {
                    json!({
                        "name": field.name,
                        "label": field.label,
                        "value": ctx.journey.answers.get(&field.name),
                        "changeLink": ctx.url(&page.path),
                    })
                })
            })
            .collect();

        Ok(json!({
            "rows": rows,
            "answers": ctx.journey.answers,
            "payload": state_to_gas_payload(&ctx.journey.answers),
            "visitedSections": ctx.journey.visited_sections,
        }))
    }

    async fn handle_post(
        &self,
        ctx: &mut PageContext<'_>,
        _posted: &[(String, String)],
    ) -> AppResult<PageResponse> {
        if let Some(page) = self.first_incomplete(ctx) {
            tracing::info!(
                form = %ctx.form.slug,
                page = %page.path,
                "submission blocked by unanswered page"
            );
            return Ok(PageResponse::redirect(ctx.url(&page.path)));
        }

        let status_page = ctx
            .form
            .page_of_kind(PageKind::Status)
            .ok_or_else(|| AppError::config(format!("form '{}' has no status page", ctx.form.slug)))?;

        let payload = state_to_gas_payload(&ctx.journey.answers);
        let receipt = ctx.services.gas.submit(&payload).await?;

        tracing::info!(
            form = %ctx.form.slug,
            reference = %receipt.reference,
            status = receipt.status,
            "application submitted"
        );
        ctx.journey.record_submission(receipt.reference, receipt.status);

        Ok(PageResponse::redirect(ctx.url(&status_page.path)))
    }
}

/// Confirms a submission
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPage;

#[async_trait]
impl PageBehavior for StatusPage {
    fn kind(&self) -> PageKind {
        PageKind::Status
    }

    fn view_name(&self) -> &'static str {
        "confirmation-page"
    }

    async fn view_model(&self, ctx: &PageContext<'_>) -> AppResult<Value> {
        let submission = ctx.journey.submission.as_ref();
        Ok(json!({
            "content": ctx.page.content,
            "reference": submission.map(|s| s.reference.as_str()),
            "submittedAt": submission.map(|s| s.submitted_at.to_rfc3339()),
            "sbi": ctx.identity.sbi,
        }))
    }

    async fn handle_get(&self, ctx: &mut PageContext<'_>) -> AppResult<PageResponse> {
        if !ctx.journey.is_submitted() {
            return Ok(PageResponse::redirect(ctx.url(&ctx.form.first_page().path)));
        }
        let model = self.view_model(ctx).await?;
        Ok(PageResponse::render(
            ViewModel::new(ctx.form, ctx.page, self.view_name(), model).without_back_link(),
        ))
    }

    async fn handle_post(
        &self,
        ctx: &mut PageContext<'_>,
        _posted: &[(String, String)],
    ) -> AppResult<PageResponse> {
        Err(AppError::method_not_allowed(format!(
            "page '{}' does not accept submissions",
            ctx.page.path
        ))
        .with_context("form", ctx.form.slug.clone()))
    }
}

/// Static content
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericPage;

#[async_trait]
impl PageBehavior for GenericPage {
    fn kind(&self) -> PageKind {
        PageKind::Generic
    }

    fn view_name(&self) -> &'static str {
        "content-page"
    }

    async fn view_model(&self, ctx: &PageContext<'_>) -> AppResult<Value> {
        Ok(json!({
            "content": ctx.page.content,
            "next": self.next_path(ctx),
        }))
    }

    async fn handle_post(
        &self,
        ctx: &mut PageContext<'_>,
        _posted: &[(String, String)],
    ) -> AppResult<PageResponse> {
        Ok(self.proceed(ctx))
    }
}

/// Behaviors for every page kind
#[must_use]
pub fn default_behaviors() -> Vec<Arc<dyn PageBehavior>> {
    vec![
        Arc::new(QuestionPage),
        Arc::new(SummaryPage),
        Arc::new(StatusPage),
        Arc::new(GenericPage),
    ]
}
