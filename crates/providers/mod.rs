pub mod lob_client;
pub mod scan_client;
