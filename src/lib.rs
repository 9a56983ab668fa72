pub mod config;
pub mod model;
pub mod notifier;
pub mod poller;
pub mod response;
pub mod tracking;
pub mod verdict;
