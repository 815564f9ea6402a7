pub mod datetime;
pub mod logging;
