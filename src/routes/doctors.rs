use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Doctor;
use crate::schema::doctors;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DoctorResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub locality: Option<String>,
    pub gps_location_link: Option<String>,
    pub last_meeting: Option<NaiveDateTime>,
}

/// Resolves a doctor by phone number for the meeting form. A missing
/// doctor is a 404 so the client can fall back to manual entry; store
/// faults stay 500s.
pub async fn get_doctor_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<DoctorResponse>> {
    let mut conn = state.db()?;

    let doctor: Doctor = doctors::table
        .filter(doctors::phone.eq(phone.trim()))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(DoctorResponse {
        id: doctor.id,
        name: doctor.display_name(),
        phone: doctor.phone,
        locality: doctor.locality,
        gps_location_link: doctor.gps_location_link,
        last_meeting: doctor.last_meeting,
    }))
}
