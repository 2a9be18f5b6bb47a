use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::warn;

use crate::schema::opd_bookings;

/// Length of the standard booking reference: 4 base-36 timestamp
/// characters followed by 3 random hex characters.
pub const REFERENCE_LENGTH: usize = 7;

const TIMESTAMP_CHARS: usize = 4;
const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// One candidate reference. The timestamp prefix keeps references
/// roughly chronological; the random suffix disambiguates references
/// minted within the same millisecond.
pub fn generate_booking_reference() -> String {
    let millis = Utc::now().timestamp_millis() as u64;
    let encoded = to_base36(millis);
    let tail_start = encoded.len().saturating_sub(TIMESTAMP_CHARS);
    format!("{}{}", &encoded[tail_start..], random_hex(3))
}

/// Returns a reference not currently present in `opd_bookings`. Collisions
/// are re-rolled with fresh randomness up to a small bound, after which an
/// extended-length reference is minted instead. The unique constraint on
/// `opd_bookings.booking_reference` remains the authoritative backstop for
/// the check-then-insert race.
pub fn generate_unique_booking_reference(
    conn: &mut PgConnection,
) -> Result<String, ReferenceError> {
    first_available(
        |candidate| {
            let exists = diesel::select(diesel::dsl::exists(
                opd_bookings::table.filter(opd_bookings::booking_reference.eq(candidate)),
            ))
            .get_result::<bool>(conn)?;
            Ok(exists)
        },
        generate_booking_reference,
        extended_reference,
    )
}

fn first_available<E, C, F>(
    mut exists: E,
    mut candidate: C,
    fallback: F,
) -> Result<String, ReferenceError>
where
    E: FnMut(&str) -> Result<bool, ReferenceError>,
    C: FnMut() -> String,
    F: FnOnce() -> String,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let value = candidate();
        if !exists(&value)? {
            return Ok(value);
        }
        warn!(attempt, reference = %value, "booking reference collision, retrying");
    }
    Ok(fallback())
}

/// Extended-length form used once the retries are exhausted: the full
/// base-36 millisecond timestamp plus 4 random hex characters.
fn extended_reference() -> String {
    let millis = Utc::now().timestamp_millis() as u64;
    format!("{}{}", to_base36(millis), random_hex(4))
}

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ascii")
}

fn random_hex(chars: usize) -> String {
    let mut bytes = vec![0u8; (chars + 1) / 2];
    OsRng.fill_bytes(&mut bytes);
    let mut encoded = hex::encode(bytes);
    encoded.truncate(chars);
    encoded
}
