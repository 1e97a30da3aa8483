pub mod codec;
pub mod dongle;
pub mod packet;
pub mod packet_decoder;
