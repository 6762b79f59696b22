pub mod gateway;
pub mod http;

pub use gateway::HospitalGateway;
pub use http::HttpHospitalGateway;
