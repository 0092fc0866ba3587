pub mod notification_hub;
pub mod protocol;
pub mod transport;

pub use notification_hub::{HubConfig, NotificationHub};
pub use protocol::{ClientMessage, ServerMessage};
pub use transport::{ChannelTransport, Outbound, SessionTransport, TransportError};
