pub mod default_routers;
pub mod error_responses;
pub mod http_serve;
pub mod multipart_file;
pub mod owner;
pub mod routers;
