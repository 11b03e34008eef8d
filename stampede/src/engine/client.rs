use bytes::Bytes;
use http::{header::HOST, Request, Uri};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use tokio::net::TcpStream;

use self::io::TokioIo;
use super::{Transport, TransportError};

mod io;

const DEFAULT_PORT: u16 = 80;

/// Plain HTTP/1.1 transport.
///
/// Every attempt opens its own TCP connection, sends a single `GET` and
/// drains the response body before reporting the status code.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl HttpTransport {
    #[inline]
    pub const fn new() -> Self {
        Self
    }

    #[inline]
    async fn connect(&self, uri: &Uri) -> Result<TcpStream, TransportError> {
        let host = uri.host().ok_or(TransportError::InvalidTarget("missing host"))?;
        // IPv6 literals come bracketed.
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let port = uri.port_u16().unwrap_or(DEFAULT_PORT);

        let stream = TcpStream::connect((host, port)).await.map_err(TransportError::Connect)?;
        stream.set_nodelay(true)?;

        Ok(stream)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, uri: &Uri) -> Result<u16, TransportError> {
        let authority = uri.authority().ok_or(TransportError::InvalidTarget("missing authority"))?;
        let path = uri.path_and_query().map_or("/", |v| v.as_str());

        let req = Request::get(path)
            .header(HOST, authority.as_str())
            .body(Empty::<Bytes>::new())?;

        let stream = self.connect(uri).await?;
        let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(err) = conn.await {
                log::trace!("connection failed: {err}");
            }
        });

        let mut resp = sender.send_request(req).await?;
        let code = resp.status().as_u16();
        while let Some(next) = resp.frame().await {
            next?;
        }

        Ok(code)
    }
}
