use crate::channel::RequestChannel;

use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Wiring mistakes detected while building the dispatcher.
///
/// These are fatal at startup: a host with two handlers for one channel, or
/// with a registered channel nobody serves, must not start.
#[derive(Debug, ThisError)]
pub enum DispatchError {
    #[error("Duplicate Handler Error: {channel} already has a handler {location}")]
    DuplicateHandler {
        channel: RequestChannel,
        location: ErrorLocation,
    },

    #[error("Missing Handler Error: {channels:?} have no handler {location}")]
    MissingHandlers {
        channels: Vec<RequestChannel>,
        location: ErrorLocation,
    },
}
