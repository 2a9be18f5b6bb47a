use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{require_role, AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{NewOpdBooking, DISPOSITION_BOOKED};
use crate::reference::generate_unique_booking_reference;
use crate::schema::opd_bookings;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub patient_name: String,
    pub patient_phone: String,
    pub age: i32,
    pub gender: String,
    pub medical_condition: Option<String>,
    pub appointment_date: NaiveDate,
    pub hospital_ids: Vec<Uuid>,
    pub referee_id: Option<Uuid>,
    pub payment_mode: Option<String>,
    pub source: Option<String>,
    pub aadhar_card_url: Option<String>,
    pub pmjay_card_url: Option<String>,
}

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub id: Uuid,
    pub booking_reference: String,
}

#[derive(Deserialize)]
pub struct UpdateDispositionRequest {
    pub current_disposition: String,
}

pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingCreatedResponse>)> {
    let patient_name = payload.patient_name.trim();
    if patient_name.is_empty() {
        return Err(AppError::bad_request("patient_name must not be empty"));
    }
    let patient_phone = payload.patient_phone.trim();
    if patient_phone.is_empty() {
        return Err(AppError::bad_request("patient_phone must not be empty"));
    }
    if !(0..=130).contains(&payload.age) {
        return Err(AppError::bad_request("age is out of range"));
    }
    if payload.hospital_ids.is_empty() {
        return Err(AppError::bad_request(
            "at least one hospital must be selected",
        ));
    }

    let mut conn = state.db()?;
    let booking_reference = generate_unique_booking_reference(&mut conn)?;

    let new_booking = NewOpdBooking {
        id: Uuid::new_v4(),
        booking_reference,
        created_by_agent_id: user.user_id,
        referee_id: payload.referee_id,
        hospital_ids: payload.hospital_ids,
        patient_name: patient_name.to_string(),
        patient_phone: patient_phone.to_string(),
        age: payload.age,
        gender: payload.gender,
        medical_condition: payload.medical_condition,
        appointment_date: payload.appointment_date,
        current_disposition: DISPOSITION_BOOKED.to_string(),
        payment_mode: payload.payment_mode,
        source: payload.source,
        aadhar_card_url: payload.aadhar_card_url,
        pmjay_card_url: payload.pmjay_card_url,
    };

    // The pre-check in the generator does not close the check-then-insert
    // race; the unique constraint does. Surface that rare case as a 409.
    match diesel::insert_into(opd_bookings::table)
        .values(&new_booking)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::conflict(
                "booking reference already taken, retry the request",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    tracing::info!(
        booking_id = %new_booking.id,
        reference = %new_booking.booking_reference,
        "booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            id: new_booking.id,
            booking_reference: new_booking.booking_reference,
        }),
    ))
}

pub async fn update_disposition(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateDispositionRequest>,
) -> AppResult<StatusCode> {
    require_role(&user, &[Role::Operations, Role::SuperAdmin])?;

    let disposition = payload.current_disposition.trim();
    if disposition.is_empty() {
        return Err(AppError::bad_request(
            "current_disposition must not be empty",
        ));
    }

    let mut conn = state.db()?;
    let updated = diesel::update(opd_bookings::table.find(booking_id))
        .set((
            opd_bookings::current_disposition.eq(disposition),
            opd_bookings::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
