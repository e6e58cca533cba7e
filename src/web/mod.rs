// Web server modules for the Flood Detection API

pub mod logger;
pub mod multipart;
pub mod response_helpers;
pub mod routes;
