//! Peer-help board operations

use serde_json::json;

use crate::backend::{Backend, BackendResult, Embed, Filter, Order, Request};
use crate::models::{HelpRequest, HelpResponse, HelpStatus, NewHelpRequest, NewHelpResponse};

use super::{rows, single};

/// Optional listing filters, combined conjunctively.
#[derive(Debug, Clone, Default)]
pub struct HelpRequestFilters {
    pub specialty: Option<String>,
    pub semester: Option<i32>,
    pub status: Option<HelpStatus>,
}

/// Raise a help request. New requests always start out `open`.
pub async fn create_help_request(
    backend: &dyn Backend,
    request: &NewHelpRequest,
) -> BackendResult<HelpRequest> {
    let mut values = serde_json::to_value(request)?;
    values["status"] = json!(HelpStatus::Open);
    single(
        "help_requests",
        backend
            .execute(Request::insert("help_requests", values))
            .await?,
    )
}

/// Open board listing, newest first, with the requesting student and the
/// optional course joined in.
pub async fn list_help_requests(
    backend: &dyn Backend,
    filters: &HelpRequestFilters,
) -> BackendResult<Vec<HelpRequest>> {
    let mut request = Request::select("help_requests")
        .embed(Embed::table("students").with(Embed::table("users")))
        .embed(Embed::table("courses"))
        .order(Order::desc("created_at"));

    if let Some(ref specialty) = filters.specialty {
        request = request.filter(Filter::eq("specialty", specialty));
    }
    if let Some(semester) = filters.semester {
        request = request.filter(Filter::eq("semester", semester));
    }
    if let Some(status) = filters.status {
        request = request.filter(Filter::eq("status", status.as_str()));
    }

    rows(backend.execute(request).await?)
}

pub async fn add_help_response(
    backend: &dyn Backend,
    response: &NewHelpResponse,
) -> BackendResult<HelpResponse> {
    let values = serde_json::to_value(response)?;
    single(
        "help_responses",
        backend
            .execute(Request::insert("help_responses", values))
            .await?,
    )
}

/// Responses to one request, oldest first, with responders joined in.
pub async fn list_help_responses(
    backend: &dyn Backend,
    help_request_id: &str,
) -> BackendResult<Vec<HelpResponse>> {
    rows(
        backend
            .execute(
                Request::select("help_responses")
                    .embed(Embed::table("users"))
                    .filter(Filter::eq("help_request_id", help_request_id))
                    .order(Order::asc("created_at")),
            )
            .await?,
    )
}
