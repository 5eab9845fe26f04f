pub mod distractor;
pub mod mastery;
pub mod notebook;
pub mod stats;
