pub mod errors;
pub mod db;
pub mod schedule;
pub mod business;
pub mod user;
pub mod user_credentials;
pub mod customer;
pub mod service_template;
pub mod booking;
pub mod invoice;
pub mod refund;
pub mod communication;
pub mod service_tracking;
pub mod audit_log;
pub mod apikey;

#[cfg(test)]
mod tests;
