pub mod browser;
pub mod console_client;
pub mod hierarchy;
pub mod session_service;
pub mod upload_service;
