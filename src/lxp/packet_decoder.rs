use crate::lxp::packet::{HEADER_LEN, PREFIX};

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

// smallest frame is a heartbeat; nothing the dongle sends comes near the upper bound
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;
pub const MAX_FRAME_LEN: usize = 512;

/// Splits the dongle's byte stream into whole frames.
///
/// Frames are returned raw; validation (checksum, serials, lengths inside the
/// payload) is left to `Parser::parse`. Garbage before a frame prefix is dropped,
/// and an implausible length field causes a resync on the next prefix.
#[derive(Default)]
pub struct PacketDecoder {
    skipped: usize,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes thrown away while hunting for a frame prefix.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn discard(&mut self, src: &mut BytesMut, n: usize) {
        src.advance(n);
        self.skipped += n;
    }
}

impl Decoder for PacketDecoder {
    type Item = BytesMut;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match src.windows(2).position(|w| w == PREFIX) {
                Some(0) => {}
                Some(pos) => {
                    log::debug!("discarding {} bytes before frame prefix", pos);
                    self.discard(src, pos);
                }
                None => {
                    // keep a trailing 0xA1 in case the rest of the prefix is still in flight
                    let keep = usize::from(src.last() == Some(&PREFIX[0]));
                    let n = src.len() - keep;
                    if n > 0 {
                        self.discard(src, n);
                    }
                    return Ok(None);
                }
            }

            if src.len() < 6 {
                return Ok(None);
            }

            let frame_len = u16::from_le_bytes([src[4], src[5]]) as usize + 6;
            if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&frame_len) {
                log::warn!("implausible frame length {}, resyncing", frame_len);
                self.discard(src, 2);
                continue;
            }

            if src.len() < frame_len {
                src.reserve(frame_len - src.len());
                return Ok(None);
            }

            return Ok(Some(src.split_to(frame_len)));
        }
    }
}
