//! Application services: identity pool, executor, queue, bootstrap and views.

pub mod bootstrap;
pub mod executor;
pub mod pool;
pub mod queue;
pub mod scoreboard;

pub use bootstrap::{BootstrapAuthorizer, BootstrapError, BootstrapReport};
pub use executor::TransactionExecutor;
pub use pool::{IdentityLease, IdentityPool};
pub use queue::{CompletionHandle, RelayFailure, RelayOutcome, RelayQueue, RelayReceipt};
pub use scoreboard::Scoreboard;
