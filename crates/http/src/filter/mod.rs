//! Header filters run against a response's header table right before it is sent.
//!
//! A filter sees the table after the writer has filled in its defaults, and may
//! add, change or remove any field. Returning an error aborts the response
//! before anything reaches the sink.

use crate::protocol::{HeaderTable, SendError};

pub trait HeaderFilter {
    fn filter(&mut self, headers: &mut HeaderTable) -> Result<(), SendError>;
}

#[derive(Debug)]
pub struct FilterFn<F> {
    f: F,
}

impl<F> HeaderFilter for FilterFn<F>
where
    F: FnMut(&mut HeaderTable) -> Result<(), SendError>,
{
    fn filter(&mut self, headers: &mut HeaderTable) -> Result<(), SendError> {
        (self.f)(headers)
    }
}

/// Wraps a closure as a [`HeaderFilter`].
///
/// ```
/// use media_http::filter::{filter_fn, HeaderFilter};
/// use media_http::protocol::HeaderTable;
///
/// let mut strip_server = filter_fn(|headers: &mut HeaderTable| {
///     headers.del("Server");
///     Ok(())
/// });
///
/// let mut headers = HeaderTable::new();
/// headers.set("Server", "SRS");
/// strip_server.filter(&mut headers).unwrap();
/// assert!(headers.is_empty());
/// ```
pub fn filter_fn<F>(f: F) -> FilterFn<F>
where
    F: FnMut(&mut HeaderTable) -> Result<(), SendError>,
{
    FilterFn { f }
}

impl<T: HeaderFilter + ?Sized> HeaderFilter for Box<T> {
    fn filter(&mut self, headers: &mut HeaderTable) -> Result<(), SendError> {
        (**self).filter(headers)
    }
}
