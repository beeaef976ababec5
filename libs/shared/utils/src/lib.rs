pub mod extractor;
pub mod test_utils;

pub use extractor::{client_ip_middleware, ClientIp};
