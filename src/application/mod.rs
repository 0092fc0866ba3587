pub mod realtime;
pub mod services;
