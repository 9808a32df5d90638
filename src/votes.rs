use crate::errors::AppError;
use crate::heatmap::build_heatmap;
use crate::models::{TimeResponse, Vote};
use crate::storage;
use crate::window::{Window, parse_day};
use sqlx::SqlitePool;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    Unchanged,
}

/// Flips one cell for one participant. `currently_selected` is what the
/// caller believes the cell holds; the write is the inverse of it and is a
/// single conditional statement, so repeating a toggle never duplicates or
/// fails.
pub async fn toggle_vote(
    pool: &SqlitePool,
    vote: &Vote,
    currently_selected: bool,
) -> Result<ToggleOutcome, AppError> {
    let affected = if currently_selected {
        storage::delete_vote(pool, vote).await?
    } else {
        let window = load_window(pool, vote.activity_id).await?;
        ensure_votable(&window, vote)?;
        storage::insert_vote(pool, vote).await?
    };

    let outcome = match (currently_selected, affected) {
        (_, 0) => ToggleOutcome::Unchanged,
        (false, _) => ToggleOutcome::Added,
        (true, _) => ToggleOutcome::Removed,
    };
    debug!(
        activity_id = vote.activity_id,
        handle = %vote.user_handle,
        day = %vote.day,
        hour = vote.hour,
        ?outcome,
        "vote toggled"
    );
    Ok(outcome)
}

/// Removes every vote a participant cast for an activity.
pub async fn clear_votes(
    pool: &SqlitePool,
    activity_id: i64,
    handle: &str,
) -> Result<u64, AppError> {
    let removed = storage::delete_participant_votes(pool, activity_id, handle).await?;
    info!(activity_id, handle, removed, "cleared votes");
    Ok(removed)
}

/// Fresh aggregate for an activity as seen by `handle`.
pub async fn load_state(
    pool: &SqlitePool,
    activity_id: i64,
    handle: Option<&str>,
) -> Result<TimeResponse, AppError> {
    let window = load_window(pool, activity_id).await?;
    let counts = storage::count_votes(pool, activity_id).await?;
    let member_count = storage::count_members(pool, activity_id).await?;
    let (selected, can_vote) = match handle {
        Some(handle) => (
            storage::list_participant_votes(pool, activity_id, handle).await?,
            storage::is_member(pool, activity_id, handle).await?,
        ),
        None => (Vec::new(), false),
    };

    let heatmap = build_heatmap(&window, &counts, &selected);
    Ok(TimeResponse {
        activity_id,
        member_count,
        can_vote,
        counts,
        selected,
        heatmap,
    })
}

pub async fn load_window(pool: &SqlitePool, activity_id: i64) -> Result<Window, AppError> {
    let activity = storage::find_activity(pool, activity_id)
        .await?
        .ok_or_else(|| AppError::not_found("Activity not found"))?;
    Window::parse(&activity.begintime, &activity.endtime)
}

fn ensure_votable(window: &Window, vote: &Vote) -> Result<(), AppError> {
    let day = parse_day(&vote.day)?;
    if !window.is_selectable(day, vote.hour) {
        return Err(AppError::bad_request(format!(
            "{} {}:00 is outside the activity window",
            vote.day, vote.hour
        )));
    }
    Ok(())
}
