pub mod domain;
pub mod infra;
pub mod media;
pub mod observability;
pub mod providers;
