pub mod run;
pub mod stage;
