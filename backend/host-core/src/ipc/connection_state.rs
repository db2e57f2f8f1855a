//! Per-connection authentication state.

use std::net::SocketAddr;

/// Tracks whether a connection has presented the run's auth token.
pub(crate) struct ConnectionState {
    peer: SocketAddr,
    authenticated: bool,
    expected_token: String,
}

impl ConnectionState {
    pub(crate) fn new(peer: SocketAddr, token: String) -> Self {
        Self {
            peer,
            authenticated: false,
            expected_token: token,
        }
    }

    /// Mark the connection authenticated if `token` matches.
    ///
    /// Compares every byte regardless of where the first mismatch is.
    pub(crate) fn validate_token(&mut self, token: &str) -> bool {
        let expected = self.expected_token.as_bytes();
        let presented = token.as_bytes();

        let matches = expected.len() == presented.len()
            && expected
                .iter()
                .zip(presented)
                .fold(0u8, |diff, (a, b)| diff | (a ^ b))
                == 0;

        self.authenticated = matches;
        matches
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }
}
