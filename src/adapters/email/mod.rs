//! Mailer adapters.

mod in_memory;
mod smtp;

pub use in_memory::InMemoryMailer;
pub use smtp::SmtpMailer;
