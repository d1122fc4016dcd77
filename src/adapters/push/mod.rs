//! Push notifier adapters.

mod fcm;
mod in_memory;

pub use fcm::FcmNotifier;
pub use in_memory::InMemoryPushNotifier;
