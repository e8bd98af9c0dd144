pub mod app_users;
pub mod proofs;
pub mod seeds;
