mod accounts;
mod bridge;
mod channel;
mod config;
mod dispatch;
mod events;
mod listeners;
mod log_store;
mod support;
mod update;
mod version;
mod wifi;
