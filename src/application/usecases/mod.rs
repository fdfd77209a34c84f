pub mod sweep_once;

pub use sweep_once::{SweepOnceUseCase, SweepSummary};
