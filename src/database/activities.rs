// ABOUTME: Learner activity database operations
// ABOUTME: Records activity with computed time deltas and aggregates it per user, program and day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{is_foreign_key_violation, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Activity, ActivityType, DailyActivity};
use crate::pagination::PaginationParams;

const ACTIVITY_COLUMNS: &str =
    "id, user_id, program_id, type, total_time, time_delta, external_id, created_at";

/// Request body for recording an activity
#[derive(Debug, Clone, Deserialize)]
pub struct CreateActivityRequest {
    /// Program the activity belongs to
    pub program_id: i64,
    /// Event kind
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Cumulative seconds reported by the provider
    pub total_time: i64,
    /// Provider-side identifier
    pub external_id: Option<String>,
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    /// Inclusive lower bound
    pub start: DateTime<Utc>,
    /// Exclusive upper bound
    pub end: DateTime<Utc>,
}

impl ActivityWindow {
    /// January 1st through December 31st of `year` (UTC)
    ///
    /// # Errors
    ///
    /// Returns invalid input if the year is out of chrono's range
    pub fn for_year(year: i32) -> AppResult<Self> {
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| AppError::invalid_input("Invalid year parameter"))?;
        let end = Utc
            .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| AppError::invalid_input("Invalid year parameter"))?;
        Ok(Self { start, end })
    }

    /// The trailing 365 days ending at `now`
    #[must_use]
    pub fn trailing_year(now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(365),
            end: now + Duration::seconds(1),
        }
    }
}

/// Filters for per-user activity listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    /// Restrict to one program
    pub program_id: Option<i64>,
    /// Restrict to a time range
    pub window: Option<ActivityWindow>,
}

impl Database {
    /// Record an activity for a user
    ///
    /// `time_delta` is the increase in `total_time` since the user's previous
    /// activity in the same program, floored at zero. The first activity in a
    /// program counts its full `total_time`.
    ///
    /// # Errors
    ///
    /// Returns invalid input for negative time or unknown user/program, or a
    /// database error
    pub async fn create_activity(
        &self,
        user_id: i64,
        request: &CreateActivityRequest,
    ) -> AppResult<Activity> {
        if request.total_time < 0 {
            return Err(AppError::invalid_input("total_time must not be negative"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let previous_total: Option<i64> = sqlx::query_scalar(
            r"
            SELECT total_time FROM activities
            WHERE user_id = $1 AND program_id = $2
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(request.program_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to read previous activity: {e}")))?;

        let time_delta = compute_time_delta(previous_total, request.total_time);
        let now = Utc::now();

        let result = sqlx::query(
            r"
            INSERT INTO activities (
                user_id, program_id, type, total_time, time_delta, external_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(user_id)
        .bind(request.program_id)
        .bind(request.activity_type.as_str())
        .bind(request.total_time)
        .bind(time_delta)
        .bind(request.external_id.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::invalid_input("Unknown user or program")
            } else {
                AppError::database(format!("Failed to create activity: {e}"))
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit activity: {e}")))?;

        Ok(Activity {
            id: result.last_insert_rowid(),
            user_id,
            program_id: request.program_id,
            activity_type: request.activity_type,
            total_time: request.total_time,
            time_delta,
            external_id: request.external_id.clone(),
            created_at: now,
        })
    }

    /// List a user's activity, newest first
    ///
    /// Returns the total number of matching records and the requested page.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_activity_by_user_id(
        &self,
        user_id: i64,
        filter: &ActivityFilter,
        pagination: &PaginationParams,
    ) -> AppResult<(i64, Vec<Activity>)> {
        let (start, end) = filter
            .window
            .map_or((None, None), |w| (Some(w.start), Some(w.end)));
        let conditions = r"
            WHERE user_id = $1
              AND ($2 IS NULL OR program_id = $2)
              AND ($3 IS NULL OR created_at >= $3)
              AND ($4 IS NULL OR created_at < $4)
        ";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM activities {conditions}"))
                .bind(user_id)
                .bind(filter.program_id)
                .bind(start)
                .bind(end)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to count activities: {e}")))?;

        let query = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities {conditions} \
             ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(filter.program_id)
            .bind(start)
            .bind(end)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list activities: {e}")))?;

        let activities = rows
            .iter()
            .map(row_to_activity)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((total, activities))
    }

    /// Aggregate a user's activity per UTC day within `window`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_daily_activity_by_user_id(
        &self,
        user_id: i64,
        window: ActivityWindow,
    ) -> AppResult<Vec<DailyActivity>> {
        let query = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities \
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list daily activity: {e}")))?;

        let activities = rows
            .iter()
            .map(row_to_activity)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(group_daily_activity(activities))
    }

    /// List a program's activity, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_activity_by_program_id(
        &self,
        program_id: i64,
        pagination: &PaginationParams,
    ) -> AppResult<(i64, Vec<Activity>)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE program_id = $1")
            .bind(program_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count activities: {e}")))?;

        let query = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE program_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&query)
            .bind(program_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list activities: {e}")))?;

        let activities = rows
            .iter()
            .map(row_to_activity)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((total, activities))
    }
}

/// Seconds gained since the previous cumulative total, never negative
#[must_use]
pub fn compute_time_delta(previous_total: Option<i64>, total_time: i64) -> i64 {
    previous_total.map_or(total_time, |prev| total_time - prev).max(0)
}

/// Group activities by UTC day and rank each day against the busiest one
///
/// Input order is preserved inside each day; days come out in ascending order.
#[must_use]
pub fn group_daily_activity(activities: Vec<Activity>) -> Vec<DailyActivity> {
    let mut days: BTreeMap<NaiveDate, Vec<Activity>> = BTreeMap::new();
    for activity in activities {
        days.entry(activity.created_at.date_naive())
            .or_default()
            .push(activity);
    }

    let totals: Vec<(NaiveDate, i64, Vec<Activity>)> = days
        .into_iter()
        .map(|(date, acts)| {
            let total = acts
                .iter()
                .fold(0_i64, |sum, a| sum.saturating_add(a.time_delta));
            (date, total, acts)
        })
        .collect();
    let max_total = totals.iter().map(|(_, t, _)| *t).max().unwrap_or(0);

    totals
        .into_iter()
        .map(|(date, total_time, activities)| DailyActivity {
            date,
            total_time,
            quartile: quartile(total_time, max_total),
            activities,
        })
        .collect()
}

fn quartile(total: i64, max_total: i64) -> u8 {
    if total <= 0 || max_total <= 0 {
        return 0;
    }
    // ceil(4 * total / max) in 1..=4, widened so large totals cannot overflow
    let (total, max_total) = (i128::from(total), i128::from(max_total));
    let q = (4 * total + max_total - 1) / max_total;
    u8::try_from(q.clamp(1, 4)).unwrap_or(4)
}

fn row_to_activity(row: &SqliteRow) -> AppResult<Activity> {
    let type_str: String = row.get("type");
    let activity_type = type_str
        .parse::<ActivityType>()
        .map_err(|e| AppError::database(format!("Corrupt activity row: {e}")))?;
    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(Activity {
        id: row.get("id"),
        user_id: row.get("user_id"),
        program_id: row.get("program_id"),
        activity_type,
        total_time: row.get("total_time"),
        time_delta: row.get("time_delta"),
        external_id: row.get("external_id"),
        created_at,
    })
}
