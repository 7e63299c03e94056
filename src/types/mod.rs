// Public modules
pub mod channel;
pub mod identity;
pub mod member;
pub mod message;
pub mod page;
pub mod result;

// Re-exports
pub use channel::{Channel, ChannelType};
pub use identity::Identity;
pub use member::Member;
pub use message::Message;
pub use page::PageConfig;
pub use result::{ApiList, ApiResult};
