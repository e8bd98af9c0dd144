pub mod artwork_storage;
pub mod s3;
