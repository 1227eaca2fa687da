//! IO boundaries for the renderer: outbound HTTP and the dev channel.
//!
//! Both run their blocking work on worker threads and hand results back to
//! the UI context through channels that the caller polls, so nothing here
//! ever blocks a render pass.

pub mod cancel;
pub mod http;
pub mod ws;

pub use cancel::CancellationToken;
pub use http::{
    Credentials, HttpRequest, HttpResponse, HttpResult, HttpService, HttpTransport,
    ReqwestTransport, TransportError,
};
pub use ws::{ChannelError, WsChannel};
