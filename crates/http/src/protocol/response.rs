//! Response head handling.

use http::Response;

/// The status line and header block of a response, without its body.
///
/// Uses `http::Response<()>` as the placeholder; the assembled body is
/// attached by the connection layer once the payload completes.
pub type ResponseHead = Response<()>;
