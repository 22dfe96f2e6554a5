pub mod submitter;

pub use submitter::{parse_stake, PredictionSubmitter, SubmissionState};
