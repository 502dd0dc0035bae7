//! ZeroMQ subscriber endpoints
//!
//! Both feeds are PUB/SUB. The acquisition stream dials out to the detector's
//! publisher; the reconstruction stream binds so the reconstruction process
//! can connect and publish into it. A connecting stream never waits for its
//! publisher at startup; it dials from inside its source.
//!
//! Uses the pure Rust `zeromq` crate, whose socket I/O runs on the tokio
//! runtime.

use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use zeromq::{Endpoint, Socket, SocketRecv, SubSocket, ZmqMessage};

use crate::config::{ConnectionRole, StreamConfig};
use crate::multiplexer::MessageStream;
use crate::{Result, ViewerError};

/// Consecutive receive failures after which a source is considered gone.
pub const MAX_RECV_ERRORS: u32 = 10;

/// Delay between attempts to reach a publisher that is not up yet.
pub const CONNECT_RETRY: Duration = Duration::from_millis(500);

/// Open a SUB socket for `config` and adapt it into a message source.
///
/// Binding happens here and a failure is returned. Connecting does not wait
/// for the publisher: the endpoint is checked, then the returned source dials
/// it when first polled and keeps retrying until the publisher appears.
pub async fn open_subscriber(config: &StreamConfig) -> Result<MessageStream> {
    let endpoint = normalize_endpoint(&config.endpoint);
    let mut socket = SubSocket::new();

    socket.subscribe(&config.topic).await.map_err(|e| {
        ViewerError::transport_failed_with_source(&config.endpoint, "subscribe failed", Box::new(e))
    })?;

    let dial = match config.role {
        ConnectionRole::Connect => {
            endpoint.parse::<Endpoint>().map_err(|e| {
                ViewerError::transport_failed(&config.endpoint, format!("invalid endpoint: {e}"))
            })?;
            debug!(stream = %config.tag, endpoint = %endpoint, "SUB socket connects on first poll");
            Some(endpoint)
        }
        ConnectionRole::Bind => {
            let bound = socket.bind(&endpoint).await.map_err(|e| {
                ViewerError::transport_failed_with_source(
                    &config.endpoint,
                    "SUB bind failed",
                    Box::new(e),
                )
            })?;
            info!(stream = %config.tag, endpoint = %bound, "SUB socket bound");
            None
        }
    };

    Ok(into_source(socket, config.endpoint.clone(), dial))
}

/// Replace a `*` wildcard host with the IPv4 any-address.
pub fn normalize_endpoint(endpoint: &str) -> String {
    match endpoint.strip_prefix("tcp://*:") {
        Some(port) => format!("tcp://0.0.0.0:{port}"),
        None => endpoint.to_string(),
    }
}

/// First part of a possibly multipart message.
fn message_body(message: ZmqMessage, endpoint: &str) -> Bytes {
    let mut parts = message.into_vec().into_iter();
    let body = parts.next().unwrap_or_default();
    let extra = parts.count();
    if extra > 0 {
        debug!(endpoint, extra, "Ignoring extra message parts");
    }
    body
}

struct RecvState {
    socket: SubSocket,
    endpoint: String,
    /// Address still to connect to before receiving.
    dial: Option<String>,
    errors: u32,
}

fn into_source(socket: SubSocket, endpoint: String, dial: Option<String>) -> MessageStream {
    let state = RecvState { socket, endpoint, dial, errors: 0 };

    stream::unfold(state, |mut state| async move {
        if state.errors >= MAX_RECV_ERRORS {
            warn!(endpoint = %state.endpoint, "Too many receive errors, closing source");
            return None;
        }

        if let Some(address) = state.dial.take() {
            while let Err(e) = state.socket.connect(&address).await {
                warn!(
                    endpoint = %state.endpoint,
                    "Connect failed, retrying in {:?}: {}",
                    CONNECT_RETRY, e
                );
                tokio::time::sleep(CONNECT_RETRY).await;
            }
            info!(endpoint = %address, "SUB socket connected");
        }

        let item = match state.socket.recv().await {
            Ok(message) => {
                state.errors = 0;
                Ok(message_body(message, &state.endpoint))
            }
            Err(e) => {
                state.errors += 1;
                warn!(
                    endpoint = %state.endpoint,
                    "Receive error ({}/{}): {}",
                    state.errors, MAX_RECV_ERRORS, e
                );
                Err(ViewerError::transport_failed(&state.endpoint, format!("receive error: {e}")))
            }
        };
        Some((item, state))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_host_normalized() {
        assert_eq!(normalize_endpoint("tcp://*:9999"), "tcp://0.0.0.0:9999");
        assert_eq!(normalize_endpoint("tcp://127.0.0.1:5560"), "tcp://127.0.0.1:5560");
        assert_eq!(normalize_endpoint("ipc:///tmp/recon"), "ipc:///tmp/recon");
    }

    #[test]
    fn multipart_uses_first_part() {
        let mut message = ZmqMessage::from(Bytes::from_static(b"body"));
        message.push_back(Bytes::from_static(b"trailer"));
        assert_eq!(message_body(message, "tcp://a:1"), Bytes::from_static(b"body"));
    }

    fn acquisition(endpoint: &str) -> StreamConfig {
        StreamConfig::new(crate::StreamTag::Acquisition, endpoint, ConnectionRole::Connect)
    }

    #[tokio::test]
    async fn connect_returns_without_a_publisher() {
        let free_port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .unwrap()
            .port();
        let config = acquisition(&format!("tcp://127.0.0.1:{free_port}"));

        let opened = tokio::time::timeout(Duration::from_secs(2), open_subscriber(&config)).await;
        let mut source = opened.expect("open must not wait for a publisher").unwrap();

        let first = tokio::time::timeout(Duration::from_millis(100), source.next()).await;
        assert!(first.is_err(), "nothing can arrive before a publisher exists");
    }

    #[tokio::test]
    async fn malformed_connect_endpoint_is_fatal() {
        let config = acquisition("tcp://127.0.0.1:not-a-port");
        let result = open_subscriber(&config).await;
        assert!(matches!(result, Err(ViewerError::Transport { .. })));
    }
}
