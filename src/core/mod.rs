#![forbid(unsafe_code)]

pub mod datetime;
pub mod reminder;
