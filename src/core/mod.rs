pub mod connect_cache;
pub mod dispatch;
pub mod event_id;
pub mod expired_cache;
pub mod registry;
pub mod session;
