use crate::directory::Directory;
use crate::intent::RecipientRef;
use crate::payment::{is_valid_address, Failure};
use std::sync::Arc;
use tracing::{debug, warn};

/// Address a transfer will go to, plus the name it was requested under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    pub address: String,
    pub label: Option<String>,
}

/// Resolves literal addresses and directory names. One lookup per call, no cache.
pub struct RecipientResolver {
    directory: Arc<dyn Directory>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(&self, reference: &RecipientRef) -> Result<ResolvedRecipient, Failure> {
        match reference {
            RecipientRef::Address(address) => {
                if is_valid_address(address) {
                    Ok(ResolvedRecipient {
                        address: address.clone(),
                        label: None,
                    })
                } else {
                    Err(Failure::InvalidRecipient {
                        recipient: address.clone(),
                    })
                }
            }
            RecipientRef::Name(name) => {
                let address = self.directory.lookup(name).await.map_err(|e| {
                    warn!(name = %name, error = %e, "Directory lookup failed");
                    Failure::UpstreamError {
                        message: e.to_string(),
                    }
                })?;

                match address {
                    Some(address) if is_valid_address(&address) => {
                        debug!(name = %name, address = %address, "Resolved recipient");
                        Ok(ResolvedRecipient {
                            address,
                            label: Some(name.clone()),
                        })
                    }
                    Some(address) => {
                        warn!(name = %name, address = %address, "Directory returned malformed address");
                        Err(Failure::InvalidRecipient {
                            recipient: name.clone(),
                        })
                    }
                    None => Err(Failure::InvalidRecipient {
                        recipient: name.clone(),
                    }),
                }
            }
        }
    }
}
