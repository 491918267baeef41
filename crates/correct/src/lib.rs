pub mod corrector;
pub mod replacer;

pub use corrector::{CorrectionError, CorrectionRecord, Corrector};
pub use replacer::replace;
