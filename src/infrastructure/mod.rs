pub mod console_notifier;
pub mod fake_client;
pub mod http_like_client;
pub mod json_store;
pub mod memory_store;
pub mod multi_notifier;
pub mod webhook_notifier;
