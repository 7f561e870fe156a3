//! File transfer over the `wire-http` framing engine.
//!
//! Two sides of the same protocol subset:
//!
//! - [`server`]: accepts connections, bounds them with a worker pool whose
//!   load shortens the receive timeout of newly accepted connections, and
//!   serves fetch/store requests against a directory root
//! - [`client`]: executes an ordered command script against a server,
//!   reusing one kept-alive connection for consecutive commands
//!
//! The collaborators both sides share live in [`storage`] (resource
//! resolution under a fixed root) and [`content_type`] (extension to MIME
//! label classification).

pub mod client;
pub mod content_type;
pub mod server;
pub mod storage;
