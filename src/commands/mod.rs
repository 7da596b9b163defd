//! Operations exposed by the client.
//!
//! Each operation is a unit struct implementing [`Operation`]; the
//! dispatcher supplies prompting, credentials and output handling.

pub mod auth;
pub mod bounds;
pub mod clone;
pub mod register;
pub mod webhooks;

pub use auth::FetchAuthRules;
pub use bounds::{BoundsGet, BoundsList};
pub use clone::CloneGet;
pub use register::Register;
pub use webhooks::{WebhookCreate, WebhookDelete, WebhookGet, WebhookList, WebhookUpdate};

use std::io::{self, Read, Write};

use crate::api::CancelToken;
use crate::dispatch::Operation;
use crate::error::{HecateError, Result};

/// Copy a response body to the sink unchanged, stopping if cancelled.
pub(crate) fn copy_body<R, W>(mut body: R, sink: &mut W, cancel: &CancelToken) -> Result<u64>
where
    R: Read,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; crate::eot::CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(HecateError::Cancelled);
        }
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        sink.write_all(&buf[..n])?;
        total += n as u64;
    }
    sink.flush()?;
    Ok(total)
}

/// Every operation, for help listings.
pub fn all() -> Vec<Box<dyn Operation>> {
    vec![
        Box::new(FetchAuthRules),
        Box::new(BoundsList),
        Box::new(BoundsGet),
        Box::new(CloneGet),
        Box::new(Register),
        Box::new(WebhookList),
        Box::new(WebhookGet),
        Box::new(WebhookCreate),
        Box::new(WebhookUpdate),
        Box::new(WebhookDelete),
    ]
}
