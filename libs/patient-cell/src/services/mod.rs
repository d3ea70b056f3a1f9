pub mod patient;
