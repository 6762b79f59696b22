pub mod classifier;
pub mod heuristic;
pub mod keyword;
pub mod remote;

pub use classifier::IntentClassifier;
pub use remote::RemoteClassifier;
