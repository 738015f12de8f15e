pub mod hash;
pub mod jwt;
pub mod request_type;
