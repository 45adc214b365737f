pub mod adb;
pub mod agent;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod display;
pub mod fetch;
pub mod filtering;
pub mod language;
pub mod message;
pub mod monitor;
pub mod otp;
pub mod parser;

pub use agent::ClassifierAgent;
pub use classifier::{Category, Classification};
pub use config::Config;
pub use dedup::DedupTracker;
pub use filtering::SourceFilter;
pub use language::LanguageDetector;
pub use message::{Direction, SmsMessage};
pub use monitor::{MessageReport, SmsMonitor};
pub use otp::{OtpCandidate, OtpExtractor};
