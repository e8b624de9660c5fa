use crate::domain::context::SessionContext;
use crate::error::Result;
use std::io::Read;

/// Reads the payment session context from a JSON document.
///
/// The document uses the same field names the embedded page expects
/// (`tracker`, `clientSecret`, `deviceDataCollectionJWT`, ...), with the
/// billing address fields at the top level.
pub struct ContextReader<R: Read> {
    source: R,
}

impl<R: Read> ContextReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn read(self) -> Result<SessionContext> {
        Ok(serde_json::from_reader(self.source)?)
    }
}
