use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::NewDoctorMeeting;
use crate::schema::{doctor_meetings, doctors};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LogMeetingRequest {
    pub doctor_id: Uuid,
    pub duration_minutes: i32,
    pub meeting_notes: Option<String>,
    pub meeting_summary: Option<String>,
    pub clinic_photo_url: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub gps_location_link: Option<String>,
}

#[derive(Serialize)]
pub struct MeetingCreatedResponse {
    pub id: Uuid,
}

pub async fn log_meeting(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<LogMeetingRequest>,
) -> AppResult<(StatusCode, Json<MeetingCreatedResponse>)> {
    if payload.duration_minutes <= 0 {
        return Err(AppError::bad_request("duration_minutes must be positive"));
    }

    let now = Utc::now().naive_utc();
    let new_meeting = NewDoctorMeeting {
        id: Uuid::new_v4(),
        doctor_id: payload.doctor_id,
        agent_id: user.user_id,
        duration_minutes: payload.duration_minutes,
        meeting_notes: payload.meeting_notes,
        meeting_summary: payload.meeting_summary,
        clinic_photo_url: payload.clinic_photo_url,
        selfie_photo_url: payload.selfie_photo_url,
        gps_location_link: payload.gps_location_link,
        created_at: now,
    };

    let mut conn = state.db()?;

    // The meeting insert and the doctor's last_meeting cache move
    // together or not at all.
    conn.transaction::<_, AppError, _>(|conn| {
        let doctor_exists = diesel::select(diesel::dsl::exists(
            doctors::table.find(payload.doctor_id),
        ))
        .get_result::<bool>(conn)?;
        if !doctor_exists {
            return Err(AppError::not_found());
        }

        diesel::insert_into(doctor_meetings::table)
            .values(&new_meeting)
            .execute(conn)?;

        diesel::update(doctors::table.find(payload.doctor_id))
            .set((
                doctors::last_meeting.eq(Some(now)),
                doctors::updated_at.eq(now),
            ))
            .execute(conn)?;

        Ok(())
    })?;

    tracing::info!(meeting_id = %new_meeting.id, doctor_id = %payload.doctor_id, "meeting logged");

    Ok((
        StatusCode::CREATED,
        Json(MeetingCreatedResponse { id: new_meeting.id }),
    ))
}
