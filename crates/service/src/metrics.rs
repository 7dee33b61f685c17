use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

// Prometheus metrics (default registry)
pub static BOOKINGS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "hvac_bookings_created_total",
        "Bookings created, by initial status",
        &["status"]
    )
    .expect("register bookings_created_total")
});

pub static INVOICES_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "hvac_invoices_created_total",
        "Invoices created (manual and automatic)"
    )
    .expect("register invoices_created_total")
});

pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "hvac_notifications_total",
        "Notification dispatch attempts, by channel and outcome",
        &["channel", "outcome"]
    )
    .expect("register notifications_total")
});
