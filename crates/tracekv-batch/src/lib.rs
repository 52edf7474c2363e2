//! Intake queue and drain loop.
//!
//! Producers [`IntakeQueue::submit`] batches from any thread. A single
//! [`BatchProcessor`] pops up to a fixed budget of batches per tick, writes
//! every valid record through the [`StorageRouter`](tracekv_storage::StorageRouter)
//! and fans its sub-events out to the
//! [`StatsDispatcher`](tracekv_stats::StatsDispatcher). [`DrainScheduler`]
//! drives the processor on a fixed period without ever overlapping ticks.

mod processor;
mod queue;
mod scheduler;

pub use processor::{BatchProcessor, DrainReport, DEFAULT_MAX_BATCHES_PER_TICK};
pub use queue::IntakeQueue;
pub use scheduler::{DrainScheduler, SchedulerHandle, DEFAULT_TICK_INTERVAL};
