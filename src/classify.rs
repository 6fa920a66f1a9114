use crate::models::domain::ServiceKey;
use crate::services::ServiceDirectory;

/// Service label used for flows the directory does not know.
pub const UNRECOGNIZED: &str = "Unrecognized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Service(&'a str),
    Unrecognized,
}

impl<'a> Classification<'a> {
    pub fn label(&self) -> &'a str {
        match *self {
            Classification::Service(name) => name,
            Classification::Unrecognized => UNRECOGNIZED,
        }
    }
}

/// Builds the lookup key for a flow. Servers sit on the lower port, so the
/// smaller of the two identifies the service whichever side opened the flow.
/// Whitespace is stripped from the protocol; case is kept as given.
pub fn canonical_key(protocol: &str, src_port: u16, dst_port: u16) -> ServiceKey {
    let protocol: String = protocol.chars().filter(|c| !c.is_whitespace()).collect();
    ServiceKey::new(protocol, src_port.min(dst_port))
}

pub struct Classifier<'a> {
    directory: &'a ServiceDirectory,
}

impl<'a> Classifier<'a> {
    pub fn new(directory: &'a ServiceDirectory) -> Self {
        Classifier { directory }
    }

    pub fn classify(&self, protocol: &str, src_port: u16, dst_port: u16) -> (ServiceKey, Classification<'a>) {
        let key = canonical_key(protocol, src_port, dst_port);
        let class = self.resolve(&key);
        (key, class)
    }

    pub fn resolve(&self, key: &ServiceKey) -> Classification<'a> {
        match self.directory.lookup(key) {
            Some(name) => Classification::Service(name),
            None => Classification::Unrecognized,
        }
    }
}
