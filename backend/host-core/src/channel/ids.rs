//! Closed enumerations of every channel identifier on the wire.
//!
//! Host code only ever names channels through these enums, so a typo is a
//! compile error rather than a silently unrouted message. The string forms
//! are the stable wire contract.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Request/response channels, one per host operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestChannel {
    AuthLogin,
    AuthLogout,

    ConfigGet,
    ConfigSet,
    ConfigReset,

    AccountList,
    AccountGetCurrent,
    AccountAdd,
    AccountUpdate,
    AccountRemove,
    AccountSwitch,

    WifiList,
    WifiAdd,
    WifiUpdate,
    WifiRemove,
    WifiCurrentSsid,
    WifiFullInfo,

    NetworkStatus,
    NetworkInfo,
    NetworkCheck,

    LogGet,
    LogClear,
    LogExport,

    SettingsGet,
    SettingsUpdate,

    AppVersion,
    AppQuit,

    AutoLaunchGet,
    AutoLaunchSet,

    NotificationShow,
    NotificationGetEnabled,
    NotificationSetEnabled,

    UpdateCheck,
    UpdateDownload,
    UpdateInstall,
    UpdateStatus,
}

impl RequestChannel {
    pub const ALL: [RequestChannel; 36] = [
        RequestChannel::AuthLogin,
        RequestChannel::AuthLogout,
        RequestChannel::ConfigGet,
        RequestChannel::ConfigSet,
        RequestChannel::ConfigReset,
        RequestChannel::AccountList,
        RequestChannel::AccountGetCurrent,
        RequestChannel::AccountAdd,
        RequestChannel::AccountUpdate,
        RequestChannel::AccountRemove,
        RequestChannel::AccountSwitch,
        RequestChannel::WifiList,
        RequestChannel::WifiAdd,
        RequestChannel::WifiUpdate,
        RequestChannel::WifiRemove,
        RequestChannel::WifiCurrentSsid,
        RequestChannel::WifiFullInfo,
        RequestChannel::NetworkStatus,
        RequestChannel::NetworkInfo,
        RequestChannel::NetworkCheck,
        RequestChannel::LogGet,
        RequestChannel::LogClear,
        RequestChannel::LogExport,
        RequestChannel::SettingsGet,
        RequestChannel::SettingsUpdate,
        RequestChannel::AppVersion,
        RequestChannel::AppQuit,
        RequestChannel::AutoLaunchGet,
        RequestChannel::AutoLaunchSet,
        RequestChannel::NotificationShow,
        RequestChannel::NotificationGetEnabled,
        RequestChannel::NotificationSetEnabled,
        RequestChannel::UpdateCheck,
        RequestChannel::UpdateDownload,
        RequestChannel::UpdateInstall,
        RequestChannel::UpdateStatus,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RequestChannel::AuthLogin => "auth:login",
            RequestChannel::AuthLogout => "auth:logout",
            RequestChannel::ConfigGet => "config:get",
            RequestChannel::ConfigSet => "config:set",
            RequestChannel::ConfigReset => "config:reset",
            RequestChannel::AccountList => "account:list",
            RequestChannel::AccountGetCurrent => "account:getCurrent",
            RequestChannel::AccountAdd => "account:add",
            RequestChannel::AccountUpdate => "account:update",
            RequestChannel::AccountRemove => "account:remove",
            RequestChannel::AccountSwitch => "account:switch",
            RequestChannel::WifiList => "wifi:list",
            RequestChannel::WifiAdd => "wifi:add",
            RequestChannel::WifiUpdate => "wifi:update",
            RequestChannel::WifiRemove => "wifi:remove",
            RequestChannel::WifiCurrentSsid => "wifi:currentSsid",
            RequestChannel::WifiFullInfo => "wifi:fullInfo",
            RequestChannel::NetworkStatus => "network:status",
            RequestChannel::NetworkInfo => "network:info",
            RequestChannel::NetworkCheck => "network:check",
            RequestChannel::LogGet => "log:get",
            RequestChannel::LogClear => "log:clear",
            RequestChannel::LogExport => "log:export",
            RequestChannel::SettingsGet => "settings:get",
            RequestChannel::SettingsUpdate => "settings:update",
            RequestChannel::AppVersion => "app:version",
            RequestChannel::AppQuit => "app:quit",
            RequestChannel::AutoLaunchGet => "autoLaunch:get",
            RequestChannel::AutoLaunchSet => "autoLaunch:set",
            RequestChannel::NotificationShow => "notification:show",
            RequestChannel::NotificationGetEnabled => "notification:getEnabled",
            RequestChannel::NotificationSetEnabled => "notification:setEnabled",
            RequestChannel::UpdateCheck => "update:check",
            RequestChannel::UpdateDownload => "update:download",
            RequestChannel::UpdateInstall => "update:install",
            RequestChannel::UpdateStatus => "update:status",
        }
    }
}

impl Display for RequestChannel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// Host-to-UI broadcast channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventChannel {
    NetworkStatusChanged,
    LogAdded,
    AuthStatusChanged,
    UpdateStatusChanged,
}

impl EventChannel {
    pub const ALL: [EventChannel; 4] = [
        EventChannel::NetworkStatusChanged,
        EventChannel::LogAdded,
        EventChannel::AuthStatusChanged,
        EventChannel::UpdateStatusChanged,
    ];

    /// Position in [`EventChannel::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the latest payload alone describes the current state, so a
    /// subscriber that missed earlier payloads only needs the newest one.
    pub const fn carries_state(self) -> bool {
        !matches!(self, EventChannel::LogAdded)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EventChannel::NetworkStatusChanged => "event:network:statusChanged",
            EventChannel::LogAdded => "event:log:added",
            EventChannel::AuthStatusChanged => "event:auth:statusChanged",
            EventChannel::UpdateStatusChanged => "event:update:statusChanged",
        }
    }
}

impl Display for EventChannel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
