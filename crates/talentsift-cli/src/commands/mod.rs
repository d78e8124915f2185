//! Subcommand handlers for the talentsift CLI.

pub mod enqueue;
pub mod init_config;
pub mod reconcile;
pub mod retry;
pub mod run;
pub mod score;
pub mod status;

pub use enqueue::EnqueueArgs;
pub use init_config::InitConfigArgs;
pub use reconcile::ReconcileArgs;
pub use retry::RetryArgs;
pub use run::RunArgs;
pub use score::ScoreArgs;
pub use status::StatusArgs;
