//! Hardware abstraction traits
//!
//! These traits define the interface between the supervision logic
//! and the collaborators that talk to real (or simulated) hardware.

pub mod arm;
pub mod clock;
pub mod plc;
pub mod vision;

pub use arm::{ArmDriver, ArmError};
pub use clock::Clock;
pub use plc::PlcLink;
pub use vision::{ColorName, Detection, VisionSource, MAX_COLOR_LEN};
