use dreamweb_dom::DomError;
use dreamweb_io::TransportError;
use dreamweb_ir::IrError;
use thiserror::Error;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors surfaced by the runtime.
///
/// Most failures in the render path are fail-soft and only logged; these are
/// the ones a host has to see.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("document error: {0}")]
    Dom(#[from] DomError),

    #[error("component tree error: {0}")]
    Ir(#[from] IrError),

    #[error("http transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid page url: {0}")]
    PageUrl(#[from] url::ParseError),
}
