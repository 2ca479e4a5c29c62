pub mod block_surface;
pub mod classifier_gateway;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod ipc;
pub mod navigation_guard;
pub mod notifier;
pub mod scheduler;
pub mod session_store;

pub use block_surface::{BlockPage, BlockSurface};
pub use classifier_gateway::ClassifierGateway;
pub use config::Settings;
pub use daemon::Daemon;
pub use engine::{EngineStatus, FocusEngine, SessionExpiry, VideoCheck};
pub use error::{ErrorKind, FocusError};
pub use navigation_guard::{NavigationDecision, NavigationEvent, NavigationGuard, NavigationKind};
pub use scheduler::{DeadlineScheduler, SchedulerState};
pub use session_store::SessionStore;
