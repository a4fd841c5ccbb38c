//! Waypoint motion
//!
//! Joint-space poses, the closed-loop arrival executor, the fixed
//! pick/place/rest sequences and the job runner a worker executes.

pub mod executor;
pub mod job;
pub mod joints;

pub use executor::{
    MotionExecutor, MotionOutcome, SequenceError, SequenceReport, SpeedClass, UnconfirmedArrival,
    Waypoint,
};
pub use job::{run_job, Job, JobOutcome, StorePurpose, WorkerReport};
pub use joints::{JointAngles, JOINTS};
