use std::{path::PathBuf, time::Duration};

mod actor;
pub use actor::Actor;
mod ingress;
pub use ingress::{Mailbox, MailboxError, Message};

/// Opaque state of an in-flight multi-step game, owned by the game that created it.
pub type SessionState = Vec<u8>;

/// Configuration for the ledger.
pub struct Config {
    /// Path of the JSON document holding the ledger.
    pub store_path: PathBuf,

    /// Number of requests to hold in our backlog before blocking callers.
    pub mailbox_size: usize,

    /// How long a session may sit untouched before it is expired.
    pub session_timeout: Duration,

    /// How often idle sessions are swept.
    pub sweep_interval: Duration,
}
