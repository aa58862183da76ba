//! Human-facing identifiers for orders and checkout sessions.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// `ABCD-<base36 millis>-<5 random base36>`, all upper case, where `ABCD` is the
/// first four characters of the tenant id.
pub fn generate_order_number(tenant_id: &Uuid) -> String {
    let tenant = tenant_id.to_string();
    let prefix: String = tenant.chars().take(4).collect();
    format!(
        "{}-{}-{}",
        prefix.to_uppercase(),
        to_base36(now_millis()).to_uppercase(),
        random_base36(5).to_uppercase()
    )
}

/// `<millis>-<random base36>`, unique enough for client-side session keys.
pub fn generate_session_id() -> String {
    format!("{}-{}", now_millis(), random_base36(9))
}
