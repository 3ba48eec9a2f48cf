//! Result data models.

pub mod test_failure;
pub mod test_run;
