pub mod oracle;
pub mod prompts;
pub mod worker;
