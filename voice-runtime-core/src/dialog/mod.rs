pub mod frustration;
pub mod interpreters;
pub mod retry;
