pub mod classifier;
pub mod events;
pub mod scanner;

pub use classifier::PhaseClassifier;
pub use events::StreamEvent;
pub use scanner::{Fragment, TagScanner};
