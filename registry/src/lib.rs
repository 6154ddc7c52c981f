//! Energy certificate registry.
//!
//! A certificate is minted exactly once per renewable-energy transaction,
//! carries a carbon offset fixed at issuance, and can be retired by its
//! holder. Retirement is one-way: the certificate stays in the registry and
//! stays transferable, but no longer counts toward any holder's active
//! offset total.
//!
//! [`CertificateRegistry`] is the single-writer core. Every operation checks
//! all of its preconditions before touching state, so a failed call has no
//! observable effect. [`SharedRegistry`] wraps it in a mutex for callers that
//! need to share one store across threads.

pub mod certificate;
pub mod error;
pub mod event;
pub mod guard;
pub mod registry;
pub mod shared;
pub mod snapshot;

pub use certificate::{Certificate, IssueRequest};
pub use error::RegistryError;
pub use event::{CertificateEvent, EventBus};
pub use guard::{LifecycleGuard, LifecycleState};
pub use registry::{CertificateRegistry, DEFAULT_COLLECTION_NAME, DEFAULT_COLLECTION_SYMBOL};
pub use shared::SharedRegistry;
pub use snapshot::RegistrySnapshot;
