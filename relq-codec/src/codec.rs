use crate::frame::Frame;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

const SIMPLE_STRING: u8 = b'+';
const ERROR: u8 = b'-';
const INTEGER: u8 = b':';
const BULK_STRING: u8 = b'$';
const ARRAY: u8 = b'*';

/// RESP encoder and decoder. The decoder remembers how far the buffered bytes have been checked,
/// so a large reply arriving in many chunks is scanned only once.
#[derive(Debug, Default)]
pub struct RespCodec {
    scan: Scan,
}

impl RespCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Progress of checking whether the buffer holds a complete frame.
#[derive(Debug, Default)]
struct Scan {
    /// Offset of the first element header which hasn't been checked yet.
    checked: usize,
    /// Number of elements still missing from the arrays opened so far, innermost last.
    open_arrays: Vec<i64>,
}

impl Scan {
    /// Continue checking `src`. Returns the length of the first frame if it is complete.
    fn frame_len(&mut self, src: &[u8]) -> io::Result<Option<usize>> {
        while self.checked < src.len() {
            let mut pos = self.checked + 1;

            let line = match read_line(src, &mut pos) {
                Some(line) => line,
                None => return Ok(None),
            };

            match src[self.checked] {
                SIMPLE_STRING | ERROR | INTEGER => {}
                BULK_STRING => {
                    let len = parse_int(line)?;

                    if len >= 0 {
                        let end = pos + len as usize + 2;

                        if src.len() < end {
                            return Ok(None);
                        }

                        pos = end;
                    }
                }
                ARRAY => {
                    let len = parse_int(line)?;

                    if len > 0 {
                        self.checked = pos;
                        self.open_arrays.push(len);

                        continue;
                    }
                }
                t => return Err(invalid_data(format!("Unknown frame type {t:#04X}"))),
            }

            self.checked = pos;

            // one element is complete, close the arrays which got their last element
            loop {
                match self.open_arrays.last_mut() {
                    Some(missing) => {
                        *missing -= 1;

                        if *missing > 0 {
                            break;
                        }

                        self.open_arrays.pop();
                    }
                    None => return Ok(Some(self.checked)),
                }
            }
        }

        Ok(None)
    }
}

impl Encoder<Frame> for RespCodec {
    type Error = io::Error;

    fn encode(&mut self, frame: Frame, buf: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(buf, &frame);

        Ok(())
    }
}

impl Decoder for RespCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let frame_len = match self.scan.frame_len(&src[..]) {
            Ok(Some(len)) => len,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.scan = Scan::default();
                return Err(e);
            }
        };

        self.scan = Scan::default();

        let mut pos = 0usize;
        let frame = decode_frame(&src[..frame_len], &mut pos)?;

        src.advance(frame_len);

        match frame {
            Some(frame) => Ok(Some(frame)),
            None => Err(invalid_data("Frame is shorter than its header says".to_string())),
        }
    }
}

fn invalid_data(text: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, text)
}

/// Read a line terminated by CRLF starting at `pos`. Returns `None` if the line is not complete
/// yet, in that case `pos` is left untouched.
fn read_line<'a>(src: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let rest = &src[*pos..];
    let end = rest.windows(2).position(|w| w == b"\r\n")?;

    *pos += end + 2;

    Some(&rest[..end])
}

fn parse_int(line: &[u8]) -> io::Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| invalid_data(format!("Invalid integer {:?}", String::from_utf8_lossy(line))))
}

fn decode_frame(src: &[u8], pos: &mut usize) -> io::Result<Option<Frame>> {
    if *pos >= src.len() {
        return Ok(None);
    }

    let start = *pos;
    let tag = src[*pos];
    *pos += 1;

    let line = match read_line(src, pos) {
        Some(line) => line,
        None => {
            *pos = start;
            return Ok(None);
        }
    };

    match tag {
        SIMPLE_STRING => Ok(Some(Frame::Simple(String::from_utf8_lossy(line).to_string()))),
        ERROR => Ok(Some(Frame::Error(String::from_utf8_lossy(line).to_string()))),
        INTEGER => Ok(Some(Frame::Integer(parse_int(line)?))),
        BULK_STRING => {
            let len = parse_int(line)?;

            if len == -1 {
                return Ok(Some(Frame::Bulk(None)));
            }
            if len < 0 {
                return Err(invalid_data(format!("Invalid bulk length {len}")));
            }

            let len = len as usize;

            if src.len() < *pos + len + 2 {
                *pos = start;
                return Ok(None);
            }

            let body = Bytes::copy_from_slice(&src[*pos..*pos + len]);

            if &src[*pos + len..*pos + len + 2] != b"\r\n" {
                return Err(invalid_data("Bulk string is not terminated by CRLF".to_string()));
            }

            *pos += len + 2;

            Ok(Some(Frame::Bulk(Some(body))))
        }
        ARRAY => {
            let len = parse_int(line)?;

            if len == -1 {
                return Ok(Some(Frame::Array(None)));
            }
            if len < 0 {
                return Err(invalid_data(format!("Invalid array length {len}")));
            }

            let mut items = Vec::with_capacity(std::cmp::min(len as usize, 1024));

            for _ in 0..len {
                match decode_frame(src, pos)? {
                    Some(item) => items.push(item),
                    None => {
                        *pos = start;
                        return Ok(None);
                    }
                }
            }

            Ok(Some(Frame::Array(Some(items))))
        }
        t => Err(invalid_data(format!("Unknown frame type {t:#04X}"))),
    }
}

fn encode_frame(buf: &mut BytesMut, frame: &Frame) {
    match frame {
        Frame::Simple(s) => {
            buf.put_u8(SIMPLE_STRING);
            buf.put(s.as_bytes());
            buf.put(&b"\r\n"[..]);
        }
        Frame::Error(e) => {
            buf.put_u8(ERROR);
            buf.put(e.as_bytes());
            buf.put(&b"\r\n"[..]);
        }
        Frame::Integer(i) => {
            buf.put_u8(INTEGER);
            buf.put(i.to_string().as_bytes());
            buf.put(&b"\r\n"[..]);
        }
        Frame::Bulk(None) => buf.put(&b"$-1\r\n"[..]),
        Frame::Bulk(Some(body)) => {
            buf.put_u8(BULK_STRING);
            buf.put(body.len().to_string().as_bytes());
            buf.put(&b"\r\n"[..]);
            buf.put(&body[..]);
            buf.put(&b"\r\n"[..]);
        }
        Frame::Array(None) => buf.put(&b"*-1\r\n"[..]),
        Frame::Array(Some(items)) => {
            buf.put_u8(ARRAY);
            buf.put(items.len().to_string().as_bytes());
            buf.put(&b"\r\n"[..]);

            for item in items {
                encode_frame(buf, item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn chunked_reply_is_checked_once() {
        let items: Vec<Frame> = (0..100)
            .map(|i| Frame::Bulk(Some(Bytes::from(format!("\"item-{i}\"")))))
            .collect();
        let reply = Frame::Array(Some(items));

        let mut encoded = BytesMut::new();
        encode_frame(&mut encoded, &reply);

        let mut codec = RespCodec::new();
        let mut buf = BytesMut::new();
        let mut checked = 0;

        for chunk in encoded[..encoded.len() - 1].chunks(7) {
            buf.put(chunk);

            assert_eq!(None, codec.decode(&mut buf).unwrap());
            // the checked offset never goes back
            assert!(codec.scan.checked >= checked);
            checked = codec.scan.checked;
        }

        assert_eq!(vec![1], codec.scan.open_arrays);

        buf.put(&encoded[encoded.len() - 1..]);

        assert_eq!(Some(reply), codec.decode(&mut buf).unwrap());
        assert!(buf.is_empty());
        assert_eq!(0, codec.scan.checked);
    }

    #[test]
    fn nested_arrays_are_complete_after_the_last_element() {
        let mut codec = RespCodec::new();
        let mut buf = BytesMut::from(&b"*2\r\n*1\r\n:1\r\n*0\r\n+OK\r\n"[..]);

        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(
            Some(Frame::Array(Some(vec![
                Frame::Array(Some(vec![Frame::Integer(1)])),
                Frame::Array(Some(vec![])),
            ]))),
            frame
        );
        assert_eq!(Some(Frame::Simple("OK".into())), codec.decode(&mut buf).unwrap());
    }
}
