//! Session metrics

use crate::domain::routing::Provenance;
use metrics::{counter, gauge};

pub const ACTIVE_SESSIONS: &str = "retell_active_sessions";
pub const SESSIONS_TOTAL: &str = "retell_sessions_total";
pub const SESSIONS_FAILED: &str = "retell_sessions_failed_total";
pub const TRANSFERS_TOTAL: &str = "retell_transfers_total";

pub fn record_session_opened() {
    gauge!(ACTIVE_SESSIONS).increment(1.0);
}

pub fn record_session_ended() {
    gauge!(ACTIVE_SESSIONS).decrement(1.0);
}

pub fn record_session_routed(provenance: Provenance) {
    counter!(SESSIONS_TOTAL, "provenance" => provenance.as_str()).increment(1);
}

pub fn record_session_failed(reason: &'static str) {
    counter!(SESSIONS_FAILED, "reason" => reason).increment(1);
}

pub fn record_transfer() {
    counter!(TRANSFERS_TOTAL).increment(1);
}
