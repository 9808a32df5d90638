use crate::errors::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::models::{
    Activity, ActivitySummary, CreateActivityRequest, CreateUserRequest, MembershipRequest, Reply,
    ReplyRequest, TimeQuery, TimeRequest, TimeResponse, User, Viewer,
};
use crate::state::AppState;
use crate::storage;
use crate::ui::{render_activity, render_index};
use crate::votes::{self, toggle_vote};
use crate::window::Window;
use axum::{
    Json,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::info;
use validator::Validate;

const OK: &str = "OK";

/// Home page. A name and handle in the query string register the viewer and
/// a keyword narrows the list.
pub async fn index(
    State(state): State<AppState>,
    Query(viewer): Query<Viewer>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, AppError> {
    if let (Some(username), Some(handle)) = (viewer.username.as_deref(), viewer.handle()) {
        let registration = CreateUserRequest {
            handle: handle.to_string(),
            display_name: username.to_string(),
        };
        if registration.validate().is_ok() {
            storage::upsert_user(&state.pool, handle, username).await?;
        }
    }

    let activities = storage::list_activities(&state.pool, viewer.keyword()).await?;
    Ok(Html(render_index(
        &viewer,
        query.as_deref().unwrap_or(""),
        &activities,
    )))
}

pub async fn activity_page(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(viewer): Query<Viewer>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let home = match query {
        Some(query) if !query.is_empty() => format!("/?{query}"),
        _ => "/".to_string(),
    };
    let Ok(id) = raw_id.parse::<i64>() else {
        return Ok(Redirect::to(&home).into_response());
    };
    let Some(activity) = storage::find_activity(&state.pool, id).await? else {
        return Ok(Redirect::to(&home).into_response());
    };

    let joined = match viewer.handle() {
        Some(handle) => storage::is_member(&state.pool, id, handle).await?,
        None => false,
    };
    let members = storage::count_members(&state.pool, id).await?;
    let replies = storage::list_replies(&state.pool, id).await?;
    Ok(Html(render_activity(&activity, &viewer, members, joined, &replies)).into_response())
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    storage::upsert_user(&state.pool, &payload.handle, &payload.display_name).await?;
    Ok(Json(User {
        handle: payload.handle,
        display_name: payload.display_name,
    }))
}

pub async fn list_activities(
    State(state): State<AppState>,
    Query(viewer): Query<Viewer>,
) -> Result<Json<Vec<ActivitySummary>>, AppError> {
    Ok(Json(storage::list_activities(&state.pool, viewer.keyword()).await?))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Activity>, AppError> {
    storage::find_activity(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Activity not found"))
}

pub async fn create_activity(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    Window::parse(&payload.begintime, &payload.endtime)?.ensure_bookable()?;
    if storage::find_user(&state.pool, &payload.handle).await?.is_none() {
        return Err(AppError::bad_request("Unknown handle"));
    }

    let id = storage::insert_activity(
        &state.pool,
        &payload.handle,
        &payload.title,
        &payload.begintime,
        &payload.endtime,
    )
    .await?;
    let activity = storage::find_activity(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Activity not found"))?;

    info!(id, handle = %payload.handle, "activity created");
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn list_replies(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Reply>>, AppError> {
    if storage::find_activity(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("Activity not found"));
    }
    Ok(Json(storage::list_replies(&state.pool, id).await?))
}

/// Only members of an activity may reply to it.
pub async fn create_reply(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ReplyRequest>,
) -> Result<(StatusCode, Json<Reply>), AppError> {
    let activity_id = payload.activity_id();
    if storage::find_activity(&state.pool, activity_id).await?.is_none() {
        return Err(AppError::not_found("Activity not found"));
    }
    if storage::find_user(&state.pool, &payload.handle).await?.is_none() {
        return Err(AppError::bad_request("Unknown handle"));
    }
    if !storage::is_member(&state.pool, activity_id, &payload.handle).await? {
        return Err(AppError::forbidden("Join this activity to reply"));
    }

    let id = storage::insert_reply(&state.pool, activity_id, &payload.handle, &payload.content)
        .await?;
    let reply = storage::find_reply(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Reply not found"))?;

    info!(id, activity_id, handle = %payload.handle, "reply posted");
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn join_activity(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<MembershipRequest>,
) -> Result<&'static str, AppError> {
    let activity_id = payload.activity_id();
    if storage::find_activity(&state.pool, activity_id).await?.is_none() {
        return Err(AppError::not_found("Activity not found"));
    }
    storage::insert_like(&state.pool, activity_id, &payload.user_handle).await?;
    Ok(OK)
}

pub async fn leave_activity(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<MembershipRequest>,
) -> Result<&'static str, AppError> {
    let activity_id = payload.activity_id();
    storage::delete_like(&state.pool, activity_id, &payload.user_handle).await?;
    info!(
        activity_id,
        handle = %payload.user_handle,
        "participant left"
    );
    Ok(OK)
}

pub async fn get_time(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<TimeQuery>,
) -> Result<Json<TimeResponse>, AppError> {
    let handle = query.handle.as_deref().filter(|handle| !handle.is_empty());
    Ok(Json(votes::load_state(&state.pool, query.activity_id(), handle).await?))
}

pub async fn select_time(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<TimeRequest>,
) -> Result<&'static str, AppError> {
    toggle_vote(&state.pool, &payload.into(), false).await?;
    Ok(OK)
}

pub async fn unselect_time(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<TimeRequest>,
) -> Result<&'static str, AppError> {
    toggle_vote(&state.pool, &payload.into(), true).await?;
    Ok(OK)
}

pub async fn delete_info(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<MembershipRequest>,
) -> Result<&'static str, AppError> {
    votes::clear_votes(&state.pool, payload.activity_id(), &payload.user_handle).await?;
    Ok(OK)
}
