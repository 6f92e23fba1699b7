mod detector;
mod monitor;

pub use detector::{ActivityConfig, ActivityDetector};
pub use monitor::{ActivityMonitor, InputKind, RawInputEvent, RawInputStream};
