//! Minimal HTTP/1.1 responder for a device status page.
//!
//! The responder answers one request per connection: `GET /` (or the page's
//! name) returns the configured HTML page, anything else gets a short error
//! response, and the connection is closed afterwards. Query parameters on
//! the page request are handed to an application callback, so a browser can
//! trigger actions such as `GET /?action=1`.
//!
//! ```rust,no_run
//! use libw5500::network::application::http::{HttpOptions, HttpResponder};
//! use libw5500::network::socket::{SessionConfig, SocketSession};
//! # use libw5500::network::prelude::*;
//! # use libw5500::time::SysTick;
//! # fn demo<T: SocketTransport>(chip: &mut T) -> Result<(), libw5500::network::error::Error> {
//! static SYSTICK: SysTick = SysTick::new();
//!
//! let mut web: SocketSession = SocketSession::new(SessionConfig::tcp_server(2, 80))?;
//! let mut responder = HttpResponder::new(
//!     HttpOptions::new("<html><body>W5500</body></html>"),
//!     &SYSTICK,
//!     |key: &str, value: &str| {
//!         if key == "action" {
//!             let _ = value; // switch the LED
//!         }
//!     },
//! );
//!
//! loop {
//!     let _ = web.poll_with(chip, &mut responder);
//! }
//! # }
//! ```

/// The request parser and the session handler.
pub mod server;

pub use server::{HttpOptions, HttpResponder, RequestLine, Status, parse_request_line, query_pairs};
