pub mod app_users;
pub mod mail_provider;
pub mod proofs;
pub mod scan_ingestion;
pub mod seeds;
pub mod storage;
