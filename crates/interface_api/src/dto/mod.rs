//! Request and response bodies

pub mod levy;
