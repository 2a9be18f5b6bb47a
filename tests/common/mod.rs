use std::env;

use anyhow::{anyhow, ensure, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use http_body_util::BodyExt;
use medcrm::auth::jwt::JwtService;
use medcrm::auth::password::hash_password;
use medcrm::config::AppConfig;
use medcrm::db::{self, PgPool};
use medcrm::models::{
    NewDoctor, NewDoctorMeeting, NewHospital, NewOpdBooking, NewRefreshToken, NewUser,
};
use medcrm::routes;
use medcrm::state::AppState;
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            refresh_token_expiry_days: 30,
            refresh_cookie_secure: false,
            refresh_cookie_domain: None,
            cors_allowed_origin: None,
            token_cleanup_interval_hours: 24,
        };

        let pool = db::init_pool(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool, config, jwt);
        let router = routes::create_router(state.clone());

        Ok(Self { state, router })
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.with_conn(|conn| truncate_all(conn)).await
    }

    #[allow(dead_code)]
    pub async fn insert_user(
        &self,
        first_name: &str,
        last_name: &str,
        phone: &str,
        password: &str,
        role: &str,
        is_active: bool,
    ) -> Result<Uuid> {
        let first_name = first_name.to_string();
        let last_name = last_name.to_string();
        let phone = phone.to_string();
        let password = password.to_string();
        let role = role.to_string();
        self.with_conn(move |conn| {
            let user = NewUser {
                id: Uuid::new_v4(),
                first_name,
                last_name,
                phone,
                password_hash: hash_password(&password)?,
                role,
                is_active,
            };
            diesel::insert_into(medcrm::schema::users::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert user")?;
            Ok(user.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> Result<()> {
        self.with_conn(move |conn| {
            use medcrm::schema::users;
            diesel::update(users::table.find(user_id))
                .set(users::is_active.eq(is_active))
                .execute(conn)
                .context("failed to update user")?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_doctor(
        &self,
        first_name: &str,
        last_name: &str,
        phone: &str,
        primary_agent_id: Uuid,
    ) -> Result<Uuid> {
        let first_name = first_name.to_string();
        let last_name = last_name.to_string();
        let phone = phone.to_string();
        self.with_conn(move |conn| {
            let doctor = NewDoctor {
                id: Uuid::new_v4(),
                first_name,
                last_name,
                phone,
                locality: Some("Andheri West".to_string()),
                gps_location_link: Some("https://maps.example.com/pin".to_string()),
                assigned_agent_id_primary: primary_agent_id,
                assigned_agent_id_secondary: None,
            };
            diesel::insert_into(medcrm::schema::doctors::table)
                .values(&doctor)
                .execute(conn)
                .context("failed to insert doctor")?;
            Ok(doctor.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_hospital(&self, name: &str) -> Result<Uuid> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let hospital = NewHospital {
                id: Uuid::new_v4(),
                hospital_name: name,
            };
            diesel::insert_into(medcrm::schema::hospitals::table)
                .values(&hospital)
                .execute(conn)
                .context("failed to insert hospital")?;
            Ok(hospital.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_meeting(&self, doctor_id: Uuid, agent_id: Uuid) -> Result<Uuid> {
        self.with_conn(move |conn| {
            let meeting = NewDoctorMeeting {
                id: Uuid::new_v4(),
                doctor_id,
                agent_id,
                duration_minutes: 20,
                meeting_notes: Some("Discussed referral flow".to_string()),
                meeting_summary: None,
                clinic_photo_url: None,
                selfie_photo_url: None,
                gps_location_link: None,
                created_at: Utc::now().naive_utc(),
            };
            diesel::insert_into(medcrm::schema::doctor_meetings::table)
                .values(&meeting)
                .execute(conn)
                .context("failed to insert meeting")?;
            Ok(meeting.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn backdate_meeting(&self, meeting_id: Uuid, created_at: NaiveDateTime) -> Result<()> {
        self.with_conn(move |conn| {
            use medcrm::schema::doctor_meetings;
            diesel::update(doctor_meetings::table.find(meeting_id))
                .set(doctor_meetings::created_at.eq(created_at))
                .execute(conn)
                .context("failed to backdate meeting")?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_booking(
        &self,
        agent_id: Uuid,
        referee_id: Option<Uuid>,
        hospital_ids: Vec<Uuid>,
        booking_reference: &str,
        disposition: &str,
    ) -> Result<Uuid> {
        let booking_reference = booking_reference.to_string();
        let disposition = disposition.to_string();
        self.with_conn(move |conn| {
            let booking = NewOpdBooking {
                id: Uuid::new_v4(),
                booking_reference,
                created_by_agent_id: agent_id,
                referee_id,
                hospital_ids,
                patient_name: "Ramesh Patil".to_string(),
                patient_phone: "9800000000".to_string(),
                age: 52,
                gender: "male".to_string(),
                medical_condition: Some("cataract".to_string()),
                appointment_date: NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date"),
                current_disposition: disposition,
                payment_mode: Some("cash".to_string()),
                source: Some("field".to_string()),
                aadhar_card_url: None,
                pmjay_card_url: None,
            };
            diesel::insert_into(medcrm::schema::opd_bookings::table)
                .values(&booking)
                .execute(conn)
                .context("failed to insert booking")?;
            Ok(booking.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn backdate_booking(&self, booking_id: Uuid, created_at: NaiveDateTime) -> Result<()> {
        self.with_conn(move |conn| {
            use medcrm::schema::opd_bookings;
            diesel::update(opd_bookings::table.find(booking_id))
                .set(opd_bookings::created_at.eq(created_at))
                .execute(conn)
                .context("failed to backdate booking")?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        expires_at: NaiveDateTime,
    ) -> Result<Uuid> {
        self.with_conn(move |conn| {
            let token = NewRefreshToken {
                id: Uuid::new_v4(),
                user_id,
                token_hash: format!("hash-{}", Uuid::new_v4()),
                issued_at: Utc::now().naive_utc(),
                expires_at,
            };
            diesel::insert_into(medcrm::schema::refresh_tokens::table)
                .values(&token)
                .execute(conn)
                .context("failed to insert refresh token")?;
            Ok(token.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn login_token(&self, phone: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            phone: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json("/api/auth/login", &LoginPayload { phone, password }, None)
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            access_token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.access_token)
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::PATCH)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

#[allow(dead_code)]
pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE doctor_meetings, opd_bookings, refresh_tokens, doctors, hospitals, users RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
