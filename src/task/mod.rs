#![forbid(unsafe_code)]

pub mod model;
pub mod storage;
pub mod transfer;
