pub mod cadences;
pub mod proof_statuses;
pub mod seed_statuses;
