use std::collections::HashMap;

use axum::{extract::State, Json};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use diesel::dsl::{count_star, max, min};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Doctor, DoctorMeeting, OpdBooking, DISPOSITION_ADMITTED};
use crate::schema::{doctor_meetings, doctors, hospitals, opd_bookings};
use crate::state::AppState;

/// Envelope shared by the four reporting endpoints.
#[derive(Serialize)]
pub struct RowsResponse<T> {
    pub rows: Vec<T>,
}

#[derive(Serialize)]
pub struct BookingRow {
    pub booking_reference: String,
    pub agent_name: String,
    pub patient_name: String,
    pub patient_phone: String,
    pub age: i32,
    pub gender: String,
    pub medical_condition: Option<String>,
    pub hospital_names: String,
    pub doctor_name: Option<String>,
    pub appointment_date: NaiveDate,
    pub current_disposition: String,
    pub aadhar_card_url: Option<String>,
    pub pmjay_card_url: Option<String>,
    pub payment_mode: Option<String>,
    pub source: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct PortfolioRow {
    pub doctor_name: String,
    pub gps_location_link: Option<String>,
    pub first_meeting: Option<NaiveDateTime>,
    pub last_meeting: Option<NaiveDateTime>,
    pub meeting_count: i64,
    pub lead_count: i64,
    pub ipd_count: i64,
}

#[derive(Serialize)]
pub struct MeetingRow {
    pub doctor_name: String,
    pub meeting_date: NaiveDateTime,
    pub gps_location_link: Option<String>,
    pub clinic_photo_url: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub duration_minutes: i32,
    pub meeting_notes: Option<String>,
    pub meeting_summary: Option<String>,
}

#[derive(Serialize)]
pub struct DashboardMatrix {
    pub meetings_this_month: i64,
    pub leads_this_month: i64,
    pub ipd_this_month: i64,
}

/// Bookings created by the calling agent, newest first, with hospital and
/// referred-doctor names resolved.
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<RowsResponse<BookingRow>>> {
    let mut conn = state.db()?;

    let bookings: Vec<OpdBooking> = opd_bookings::table
        .filter(opd_bookings::created_by_agent_id.eq(user.user_id))
        .order(opd_bookings::created_at.desc())
        .load(&mut conn)?;

    let mut hospital_ids: Vec<Uuid> = bookings
        .iter()
        .flat_map(|booking| booking.hospital_ids.iter().copied())
        .collect();
    hospital_ids.sort_unstable();
    hospital_ids.dedup();

    let hospital_names: HashMap<Uuid, String> = hospitals::table
        .filter(hospitals::id.eq_any(hospital_ids))
        .select((hospitals::id, hospitals::hospital_name))
        .load::<(Uuid, String)>(&mut conn)?
        .into_iter()
        .collect();

    let mut referee_ids: Vec<Uuid> = bookings
        .iter()
        .filter_map(|booking| booking.referee_id)
        .collect();
    referee_ids.sort_unstable();
    referee_ids.dedup();

    let doctor_names: HashMap<Uuid, String> = doctors::table
        .filter(doctors::id.eq_any(referee_ids))
        .select((doctors::id, doctors::first_name, doctors::last_name))
        .load::<(Uuid, String, String)>(&mut conn)?
        .into_iter()
        .map(|(id, first, last)| (id, format!("{first} {last}")))
        .collect();

    let rows = bookings
        .into_iter()
        .map(|booking| {
            let hospital_names = booking
                .hospital_ids
                .iter()
                .filter_map(|id| hospital_names.get(id))
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            BookingRow {
                booking_reference: booking.booking_reference,
                agent_name: user.name.clone(),
                patient_name: booking.patient_name,
                patient_phone: booking.patient_phone,
                age: booking.age,
                gender: booking.gender,
                medical_condition: booking.medical_condition,
                hospital_names,
                doctor_name: booking
                    .referee_id
                    .and_then(|id| doctor_names.get(&id).cloned()),
                appointment_date: booking.appointment_date,
                current_disposition: booking.current_disposition,
                aadhar_card_url: booking.aadhar_card_url,
                pmjay_card_url: booking.pmjay_card_url,
                payment_mode: booking.payment_mode,
                source: booking.source,
                created_at: booking.created_at,
                updated_at: booking.updated_at,
            }
        })
        .collect();

    Ok(Json(RowsResponse { rows }))
}

/// Relationship history for every doctor whose primary agent is the
/// caller. Doctors with no meetings or referred bookings still get a row;
/// their counts fall back to zero instead of dropping out of the join.
pub async fn doctor_portfolio(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<RowsResponse<PortfolioRow>>> {
    let mut conn = state.db()?;

    let assigned: Vec<Doctor> = doctors::table
        .filter(doctors::assigned_agent_id_primary.eq(user.user_id))
        .order((doctors::first_name.asc(), doctors::last_name.asc()))
        .load(&mut conn)?;

    let doctor_ids: Vec<Uuid> = assigned.iter().map(|doctor| doctor.id).collect();
    let referee_filter: Vec<Option<Uuid>> = doctor_ids.iter().copied().map(Some).collect();

    type MeetingStats = (i64, Option<NaiveDateTime>, Option<NaiveDateTime>);
    let meeting_stats: HashMap<Uuid, MeetingStats> = doctor_meetings::table
        .filter(doctor_meetings::doctor_id.eq_any(doctor_ids))
        .group_by(doctor_meetings::doctor_id)
        .select((
            doctor_meetings::doctor_id,
            count_star(),
            min(doctor_meetings::created_at),
            max(doctor_meetings::created_at),
        ))
        .load::<(Uuid, i64, Option<NaiveDateTime>, Option<NaiveDateTime>)>(&mut conn)?
        .into_iter()
        .map(|(id, count, first, last)| (id, (count, first, last)))
        .collect();

    let lead_counts: HashMap<Uuid, i64> = opd_bookings::table
        .filter(opd_bookings::referee_id.eq_any(referee_filter.clone()))
        .group_by(opd_bookings::referee_id)
        .select((opd_bookings::referee_id, count_star()))
        .load::<(Option<Uuid>, i64)>(&mut conn)?
        .into_iter()
        .filter_map(|(id, count)| id.map(|id| (id, count)))
        .collect();

    let ipd_counts: HashMap<Uuid, i64> = opd_bookings::table
        .filter(opd_bookings::referee_id.eq_any(referee_filter))
        .filter(opd_bookings::current_disposition.eq(DISPOSITION_ADMITTED))
        .group_by(opd_bookings::referee_id)
        .select((opd_bookings::referee_id, count_star()))
        .load::<(Option<Uuid>, i64)>(&mut conn)?
        .into_iter()
        .filter_map(|(id, count)| id.map(|id| (id, count)))
        .collect();

    let rows = assigned
        .into_iter()
        .map(|doctor| {
            let (meeting_count, first_meeting, last_meeting) = meeting_stats
                .get(&doctor.id)
                .copied()
                .unwrap_or((0, None, None));
            PortfolioRow {
                doctor_name: doctor.display_name(),
                gps_location_link: doctor.gps_location_link,
                first_meeting,
                last_meeting,
                meeting_count,
                lead_count: lead_counts.get(&doctor.id).copied().unwrap_or(0),
                ipd_count: ipd_counts.get(&doctor.id).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(Json(RowsResponse { rows }))
}

/// Meetings logged by the calling agent, newest first.
pub async fn list_meetings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<RowsResponse<MeetingRow>>> {
    let mut conn = state.db()?;

    let meetings: Vec<(DoctorMeeting, String, String)> = doctor_meetings::table
        .inner_join(doctors::table)
        .filter(doctor_meetings::agent_id.eq(user.user_id))
        .order(doctor_meetings::created_at.desc())
        .select((
            doctor_meetings::all_columns,
            doctors::first_name,
            doctors::last_name,
        ))
        .load(&mut conn)?;

    let rows = meetings
        .into_iter()
        .map(|(meeting, first, last)| MeetingRow {
            doctor_name: format!("{first} {last}"),
            meeting_date: meeting.created_at,
            gps_location_link: meeting.gps_location_link,
            clinic_photo_url: meeting.clinic_photo_url,
            selfie_photo_url: meeting.selfie_photo_url,
            duration_minutes: meeting.duration_minutes,
            meeting_notes: meeting.meeting_notes,
            meeting_summary: meeting.meeting_summary,
        })
        .collect();

    Ok(Json(RowsResponse { rows }))
}

/// Current-calendar-month activity counts for the calling agent.
pub async fn dashboard_matrix(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<RowsResponse<DashboardMatrix>>> {
    let (month_start, month_end) = month_window(Local::now())
        .ok_or_else(|| AppError::internal("could not resolve calendar month bounds"))?;

    let mut conn = state.db()?;

    let meetings_this_month: i64 = doctor_meetings::table
        .filter(doctor_meetings::agent_id.eq(user.user_id))
        .filter(doctor_meetings::created_at.ge(month_start))
        .filter(doctor_meetings::created_at.lt(month_end))
        .select(count_star())
        .first(&mut conn)?;

    let leads_this_month: i64 = opd_bookings::table
        .filter(opd_bookings::created_by_agent_id.eq(user.user_id))
        .filter(opd_bookings::created_at.ge(month_start))
        .filter(opd_bookings::created_at.lt(month_end))
        .select(count_star())
        .first(&mut conn)?;

    let ipd_this_month: i64 = opd_bookings::table
        .filter(opd_bookings::created_by_agent_id.eq(user.user_id))
        .filter(opd_bookings::current_disposition.eq(DISPOSITION_ADMITTED))
        .filter(opd_bookings::created_at.ge(month_start))
        .filter(opd_bookings::created_at.lt(month_end))
        .select(count_star())
        .first(&mut conn)?;

    Ok(Json(RowsResponse {
        rows: vec![DashboardMatrix {
            meetings_this_month,
            leads_this_month,
            ipd_this_month,
        }],
    }))
}

/// Half-open `[start_of_month, start_of_next_month)` window around `now`,
/// evaluated in `now`'s time zone and returned as UTC-naive bounds for
/// the timestamptz comparisons.
fn month_window<Tz: TimeZone>(now: DateTime<Tz>) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let zone = now.timezone();
    let start = zone
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .earliest()?;
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let end = zone
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .earliest()?;
    Some((start.naive_utc(), end.naive_utc()))
}
