//! Development live-reload.
//!
//! Pages served from a loopback host talk to the dev server on the next port
//! up. The server pushes `{type: "reload", tree}` frames, each of which
//! replaces the whole tree.

use std::time::Duration;

use dreamweb_io::WsChannel;
use dreamweb_ir::{InboundMessage, Node};
use tracing::{debug, warn};
use url::Url;

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// Where the dev server listens for a given page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevEndpoint {
    url: String,
}

impl DevEndpoint {
    /// `ws://<host>:<port + 1>` for loopback pages with an explicit port,
    /// `None` for everything else.
    pub fn detect(page_url: &Url) -> Option<Self> {
        let host = page_url.host_str()?;
        if !LOOPBACK_HOSTS.contains(&host) {
            return None;
        }
        let Some(port) = page_url.port() else {
            debug!(%page_url, "loopback page without explicit port, live reload off");
            return None;
        };
        let dev_port = port.checked_add(1)?;
        Some(Self {
            url: format!("ws://{host}:{dev_port}"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connect(&self, reconnect_delay: Duration) -> WsChannel {
        WsChannel::connect(self.url.clone(), reconnect_delay)
    }
}

/// Extract the replacement tree from an inbound frame. Other message types
/// and malformed frames yield `None`.
pub fn reload_tree(frame: &str) -> Option<Node> {
    match InboundMessage::parse(frame) {
        Ok(InboundMessage::Reload { tree }) => Some(tree),
        Ok(InboundMessage::Unknown) => {
            debug!("ignoring dev message");
            None
        }
        Err(err) => {
            warn!(%err, "malformed dev message");
            None
        }
    }
}
