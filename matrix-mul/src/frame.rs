//! Fixed-size frames carried on a producer's pipe.
//!
//! Each frame holds one result element as decimal ASCII, padded with NUL
//! bytes to `FRAME_SIZE`. The reader always consumes whole frames, so the
//! stream needs no delimiters.
//!
//! A producer that cannot represent an element sends [`encode_overflow`] in
//! its place and stops; the reader knows which element that was from the
//! frame's position.

use crate::Error;

/// Wide enough for any `i64` in decimal, sign included.
pub const FRAME_SIZE: usize = 32;

const OVERFLOW: &[u8] = b"overflow";

pub fn encode(value: i64) -> [u8; FRAME_SIZE] {
    let mut frame = [0u8; FRAME_SIZE];
    let text = value.to_string();
    frame[..text.len()].copy_from_slice(text.as_bytes());
    frame
}

/// Frame sent instead of an element whose value overflows `i64`.
pub fn encode_overflow() -> [u8; FRAME_SIZE] {
    let mut frame = [0u8; FRAME_SIZE];
    frame[..OVERFLOW.len()].copy_from_slice(OVERFLOW);
    frame
}

pub fn is_overflow(frame: &[u8]) -> bool {
    frame.len() > OVERFLOW.len()
        && frame.starts_with(OVERFLOW)
        && frame[OVERFLOW.len()..].iter().all(|&b| b == 0)
}

pub fn decode(frame: &[u8]) -> Result<i64, Error> {
    let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
    let text = std::str::from_utf8(&frame[..end])
        .map_err(|_| Error::Frame(String::from_utf8_lossy(&frame[..end]).into_owned()))?;
    text.parse().map_err(|_| Error::Frame(text.to_string()))
}
