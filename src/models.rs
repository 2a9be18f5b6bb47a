use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

/// Disposition a booking starts in.
pub const DISPOSITION_BOOKED: &str = "Booked";
/// Disposition counted as an IPD conversion by the reporting layer.
pub const DISPOSITION_ADMITTED: &str = "Admitted";

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = doctors)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub locality: Option<String>,
    pub gps_location_link: Option<String>,
    pub assigned_agent_id_primary: Uuid,
    pub assigned_agent_id_secondary: Option<Uuid>,
    pub last_meeting: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Doctor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = doctors)]
pub struct NewDoctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub locality: Option<String>,
    pub gps_location_link: Option<String>,
    pub assigned_agent_id_primary: Uuid,
    pub assigned_agent_id_secondary: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = hospitals)]
pub struct Hospital {
    pub id: Uuid,
    pub hospital_name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = hospitals)]
pub struct NewHospital {
    pub id: Uuid,
    pub hospital_name: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = doctor_meetings)]
#[diesel(belongs_to(Doctor))]
pub struct DoctorMeeting {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub agent_id: Uuid,
    pub duration_minutes: i32,
    pub meeting_notes: Option<String>,
    pub meeting_summary: Option<String>,
    pub clinic_photo_url: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub gps_location_link: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = doctor_meetings)]
pub struct NewDoctorMeeting {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub agent_id: Uuid,
    pub duration_minutes: i32,
    pub meeting_notes: Option<String>,
    pub meeting_summary: Option<String>,
    pub clinic_photo_url: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub gps_location_link: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = opd_bookings)]
pub struct OpdBooking {
    pub id: Uuid,
    pub booking_reference: String,
    pub created_by_agent_id: Uuid,
    pub referee_id: Option<Uuid>,
    pub hospital_ids: Vec<Uuid>,
    pub patient_name: String,
    pub patient_phone: String,
    pub age: i32,
    pub gender: String,
    pub medical_condition: Option<String>,
    pub appointment_date: NaiveDate,
    pub current_disposition: String,
    pub payment_mode: Option<String>,
    pub source: Option<String>,
    pub aadhar_card_url: Option<String>,
    pub pmjay_card_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = opd_bookings)]
pub struct NewOpdBooking {
    pub id: Uuid,
    pub booking_reference: String,
    pub created_by_agent_id: Uuid,
    pub referee_id: Option<Uuid>,
    pub hospital_ids: Vec<Uuid>,
    pub patient_name: String,
    pub patient_phone: String,
    pub age: i32,
    pub gender: String,
    pub medical_condition: Option<String>,
    pub appointment_date: NaiveDate,
    pub current_disposition: String,
    pub payment_mode: Option<String>,
    pub source: Option<String>,
    pub aadhar_card_url: Option<String>,
    pub pmjay_card_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
