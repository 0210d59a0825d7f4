// Library root
// -----------
// The encrypted request transport and its collaborators. The binary
// (`main.rs`) wires these into the interactive runner.
//
// Module responsibilities:
// - `crypto`: AES-GCM payload encryption in the server's wire layout.
// - `session`: the application token and cookie session id carried between
//   calls, plus the cookie header helpers.
// - `api`: the encrypted transport client, the multipart upload client,
//   their blocking forms, and the request/response types.
// - `config`: settings file and environment overrides.
// - `error`: the error taxonomy shared by all of the above.
// - `ui`: terminal menus that turn user choices into API calls.
pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod session;
pub mod ui;

pub use error::{Error, Result};
