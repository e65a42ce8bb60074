use core::fmt::Write;

use heapless::String;

use crate::network::SocketTransport;
use crate::network::error::Error;
use crate::network::socket::{DataHandler, Disposition, Link};
use crate::time::{Clock, Deadline};

const MAX_RESPONSE_HEAD_LEN: usize = 192;

/// What the responder serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions<'a> {
    /// Name the page is also reachable under, as in `GET /index.html`.
    pub content_name: &'a str,
    /// The page body.
    pub content: &'a str,
    /// Close a connection that sent nothing for this long.
    pub idle_timeout_ms: u32,
}

impl<'a> HttpOptions<'a> {
    /// Serve `content` as `index.html`.
    pub fn new(content: &'a str) -> Self {
        Self {
            content_name: "index.html",
            content,
            idle_timeout_ms: 10_000,
        }
    }
}

/// Response status codes the responder uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The page was served.
    Ok = 200,
    /// The request line could not be parsed.
    BadRequest = 400,
    /// No such page.
    NotFound = 404,
    /// Only GET is served.
    MethodNotAllowed = 405,
}

impl Status {
    /// Numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

/// The parts of a request line the responder looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine<'a> {
    /// Request method, e.g. `GET`.
    pub method: &'a str,
    /// Target path without the query string.
    pub path: &'a str,
    /// Everything after `?`, if present.
    pub query: Option<&'a str>,
}

/// Parse the first line of an HTTP request.
///
/// ```rust
/// use libw5500::network::application::http::parse_request_line;
///
/// let line = parse_request_line(b"GET /index.html?action=1 HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
/// assert_eq!(line.method, "GET");
/// assert_eq!(line.path, "/index.html");
/// assert_eq!(line.query, Some("action=1"));
/// ```
pub fn parse_request_line(data: &[u8]) -> Result<RequestLine<'_>, Error> {
    let end = find_slice(data, b"\r\n").unwrap_or(data.len());
    let line = core::str::from_utf8(&data[..end]).map_err(|_| Error::ProtocolError)?;

    let mut parts = line.split(' ').filter(|part| !part.is_empty());
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::ProtocolError);
    };
    if !version.starts_with("HTTP/") || !target.starts_with('/') {
        return Err(Error::ProtocolError);
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    Ok(RequestLine {
        method,
        path,
        query,
    })
}

/// Split a query string into `key=value` pairs. A pair without `=` yields
/// an empty value.
pub fn query_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

/// Serves one static page on a TCP-server session.
///
/// Each connection gets exactly one response and is then closed. Query
/// parameters of a page request are passed to `on_query` one pair at a time
/// before the page is sent, which is how the device takes simple commands
/// such as `GET /?action=1`.
#[derive(Debug)]
pub struct HttpResponder<'a, C: Clock, F: FnMut(&str, &str)> {
    options: HttpOptions<'a>,
    clock: C,
    on_query: F,
    idle: Option<Deadline>,
}

impl<'a, C: Clock, F: FnMut(&str, &str)> HttpResponder<'a, C, F> {
    /// A responder for `options`; `on_query` receives every query pair.
    pub fn new(options: HttpOptions<'a>, clock: C, on_query: F) -> Self {
        Self {
            options,
            clock,
            on_query,
            idle: None,
        }
    }

    /// Build the response for one request and report its status.
    fn respond<T: SocketTransport>(&mut self, link: &mut Link<'_, T>, request: &[u8]) -> Result<Status, Error> {
        let status = match parse_request_line(request) {
            Err(_) => Status::BadRequest,
            Ok(line) if line.method != "GET" => Status::MethodNotAllowed,
            Ok(line) if self.is_page(line.path) => {
                for (key, value) in query_pairs(line.query.unwrap_or("")) {
                    debug!("http: query {:?}={:?}", key, value);
                    (self.on_query)(key, value);
                }
                Status::Ok
            }
            Ok(_) => Status::NotFound,
        };

        let body = match status {
            Status::Ok => self.options.content,
            other => other.reason(),
        };
        let content_type = match status {
            Status::Ok => "text/html",
            _ => "text/plain",
        };

        let mut head: String<MAX_RESPONSE_HEAD_LEN> = String::new();
        write!(
            head,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n",
            status.code(),
            status.reason(),
            content_type,
            body.len()
        )
        .map_err(|_| Error::BufferTooSmall)?;
        if status == Status::MethodNotAllowed {
            head.push_str("Allow: GET\r\n").map_err(|_| Error::BufferTooSmall)?;
        }
        head.push_str("Connection: close\r\n\r\n")
            .map_err(|_| Error::BufferTooSmall)?;

        link.send(head.as_bytes())?;
        link.send(body.as_bytes())?;
        Ok(status)
    }

    fn is_page(&self, path: &str) -> bool {
        path == "/" || path.strip_prefix('/') == Some(self.options.content_name)
    }
}

impl<C: Clock, F: FnMut(&str, &str)> DataHandler for HttpResponder<'_, C, F> {
    fn on_established<T: SocketTransport>(
        &mut self,
        _link: &mut Link<'_, T>,
        _scratch: &mut [u8],
    ) -> Result<Disposition, Error> {
        self.idle = Some(Deadline::start(&self.clock, self.options.idle_timeout_ms));
        Ok(Disposition::Keep)
    }

    fn on_data<T: SocketTransport>(&mut self, link: &mut Link<'_, T>, data: &[u8]) -> Result<Disposition, Error> {
        let status = self.respond(link, data)?;
        info!("http: {} for {:?}:{}", status.code(), link.peer().ip().octets(), link.peer().port());
        self.idle = None;
        Ok(Disposition::Close)
    }

    fn on_idle<T: SocketTransport>(&mut self, link: &mut Link<'_, T>) -> Result<Disposition, Error> {
        match self.idle {
            Some(deadline) if deadline.expired(&self.clock) => {
                debug!("http: closing idle connection on socket {}", link.socket());
                self.idle = None;
                Ok(Disposition::Close)
            }
            _ => Ok(Disposition::Keep),
        }
    }
}

/// Finds the first occurrence of a slice in another slice and returns its starting position.
fn find_slice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
