pub mod gateway;
pub mod ports;
pub mod scheduler;
pub mod usecases;

pub use gateway::MutationGateway;
pub use ports::*;
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
