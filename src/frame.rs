// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::str;

use bytes::Bytes;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("invalid frame length: {0}")]
    InvalidLength(String),
    #[error("invalid {data_type} frame: {value}")]
    InvalidValue {
        data_type: &'static str,
        value: String,
    },
    #[error("bulk frame payload is not terminated by CRLF")]
    MissingTerminator,
    #[error("invalid UTF-8 string")]
    InvalidUtf8(#[from] str::Utf8Error),
    #[error("aggregates nested deeper than {0} levels")]
    TooDeep(usize),
}

/// How many aggregates may be nested inside each other before decoding gives up. Every level
/// is one recursive call, so this bounds the stack used by a single message.
pub const MAX_NESTING_DEPTH: usize = 512;

/// A single RESP value, either received from a client or about to be sent to one.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    /// Decimal digits, optionally signed. Kept as text so that integers of any size survive.
    BigNumber(String),
    Double(f64),
    Boolean(bool),
    Null,
    Bulk(Bytes),
    Array(Vec<Frame>),
    /// Unique members, in the order they were first seen.
    Set(Vec<Frame>),
    /// Unique keys, in the order they were first seen.
    Map(Vec<(Frame, Frame)>),
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    /// Decodes the frame starting at `pos`, returning it together with the position right after
    /// its last byte. Nested frames are decoded by recursing with the position returned by the
    /// previous element, so nothing but the returned position is carried between calls.
    pub fn decode(src: &[u8], pos: usize) -> Result<(Frame, usize), Error> {
        Self::decode_nested(src, pos, 0)
    }

    fn decode_nested(src: &[u8], pos: usize, depth: usize) -> Result<(Frame, usize), Error> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::TooDeep(MAX_NESTING_DEPTH));
        }

        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = *src.get(pos).ok_or(Error::Incomplete)?;
        let data_type = DataType::try_from(first_byte)?;
        let pos = pos + 1;

        match data_type {
            DataType::SimpleString => {
                let (line, pos) = read_line(src, pos)?;
                let string = str::from_utf8(line)?.to_string();
                Ok((Frame::Simple(string), pos))
            }
            DataType::SimpleError => {
                let (line, pos) = read_line(src, pos)?;
                let string = str::from_utf8(line)?.to_string();
                Ok((Frame::Error(string), pos))
            }
            DataType::Integer => {
                let (line, pos) = read_line(src, pos)?;
                let integer = parse::<i64>(line, "integer")?;
                Ok((Frame::Integer(integer), pos))
            }
            DataType::BigNumber => {
                let (line, pos) = read_line(src, pos)?;
                let digits = str::from_utf8(line)?;
                if !is_big_number(digits) {
                    return Err(invalid("big number", line));
                }
                Ok((Frame::BigNumber(digits.to_string()), pos))
            }
            DataType::Double => {
                let (line, pos) = read_line(src, pos)?;
                let double = parse::<f64>(line, "double")?;
                Ok((Frame::Double(double), pos))
            }
            DataType::Boolean => {
                let (line, pos) = read_line(src, pos)?;
                match line {
                    b"t" => Ok((Frame::Boolean(true), pos)),
                    b"f" => Ok((Frame::Boolean(false), pos)),
                    line => Err(invalid("boolean", line)),
                }
            }
            DataType::Null => {
                let (line, pos) = read_line(src, pos)?;
                if !line.is_empty() {
                    return Err(invalid("null", line));
                }
                Ok((Frame::Null, pos))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match read_bulk(src, pos)? {
                (Some(data), pos) => Ok((Frame::Bulk(Bytes::copy_from_slice(data)), pos)),
                (None, pos) => Ok((Frame::Null, pos)),
            },
            // !<length>\r\n<error>\r\n
            DataType::BulkError => match read_bulk(src, pos)? {
                (Some(msg), pos) => Ok((Frame::Error(str::from_utf8(msg)?.to_string()), pos)),
                // NOTE: the protocol does not specify a way to represent a null bulk error
                (None, pos) => Ok((Frame::Null, pos)),
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let (length, pos) = read_length(src, pos)?;
                let Some(length) = length else {
                    return Ok((Frame::Null, pos));
                };

                let (frames, pos) = decode_elements(src, pos, length, depth + 1)?;
                Ok((Frame::Array(frames), pos))
            }
            // ~<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Set => {
                let (length, pos) = read_length(src, pos)?;
                let Some(length) = length else {
                    return Ok((Frame::Null, pos));
                };

                let (frames, pos) = decode_elements(src, pos, length, depth + 1)?;
                let mut members = Vec::with_capacity(frames.len());
                for frame in frames {
                    if !members.contains(&frame) {
                        members.push(frame);
                    }
                }

                Ok((Frame::Set(members), pos))
            }
            // %<number-of-entries>\r\n<key-1><value-1>...<key-n><value-n>
            DataType::Map => {
                let (length, pos) = read_length(src, pos)?;
                let Some(length) = length else {
                    return Ok((Frame::Null, pos));
                };

                let mut entries: Vec<(Frame, Frame)> =
                    Vec::with_capacity(length.min(src.len() - pos));
                let mut pos = pos;
                for _ in 0..length {
                    let (key, next) = Self::decode_nested(src, pos, depth + 1)?;
                    let (value, next) = Self::decode_nested(src, next, depth + 1)?;
                    pos = next;

                    // A repeated key keeps its first position and takes the latest value.
                    match entries.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }

                Ok((Frame::Map(entries), pos))
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write(&mut bytes);
        bytes
    }

    fn write(&self, dst: &mut Vec<u8>) {
        match self {
            // A simple string can't carry CRLF, so each line goes out as its own bulk string.
            Frame::Simple(s) if s.contains("\r\n") => {
                for segment in s.split("\r\n") {
                    write_bulk(dst, segment.as_bytes());
                }
            }
            Frame::Simple(s) => write_line(dst, DataType::SimpleString, s.as_bytes()),
            Frame::Error(s) => write_line(dst, DataType::SimpleError, s.as_bytes()),
            Frame::Integer(i) => write_line(dst, DataType::Integer, i.to_string().as_bytes()),
            Frame::BigNumber(digits) => write_line(dst, DataType::BigNumber, digits.as_bytes()),
            Frame::Double(d) => write_line(dst, DataType::Double, format_double(*d).as_bytes()),
            Frame::Boolean(b) => {
                let value: &[u8] = if *b { b"t" } else { b"f" };
                write_line(dst, DataType::Boolean, value);
            }
            // Replies use the RESP2 null bulk string, which every client understands.
            Frame::Null => dst.extend_from_slice(b"$-1\r\n"),
            Frame::Bulk(bytes) => write_bulk(dst, bytes),
            Frame::Array(frames) => {
                write_line(dst, DataType::Array, frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.write(dst);
                }
            }
            Frame::Set(frames) => {
                write_line(dst, DataType::Set, frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.write(dst);
                }
            }
            Frame::Map(entries) => {
                write_line(dst, DataType::Map, entries.len().to_string().as_bytes());
                for (key, value) in entries {
                    key.write(dst);
                    value.write(dst);
                }
            }
        }
    }
}

/// Encodes a reply. With an `error_tag` the output is always an error, `-<TAG>\r\n<text>\r\n`,
/// whatever kind of frame is passed in.
pub fn encode(frame: &Frame, error_tag: Option<&str>) -> Vec<u8> {
    let Some(tag) = error_tag else {
        return frame.serialize();
    };

    let text = match frame {
        Frame::Simple(s) | Frame::Error(s) => s.clone(),
        Frame::Bulk(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        frame => frame.to_string(),
    };

    // The text takes exactly one line.
    let mut bytes = Frame::Error(tag.to_uppercase()).serialize();
    bytes.extend_from_slice(text.replace("\r\n", " ").as_bytes());
    bytes.extend_from_slice(CRLF);
    bytes
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::BigNumber(digits) => write!(f, "({}", digits),
            Frame::Double(d) => write!(f, ",{}", format_double(*d)),
            Frame::Boolean(b) => write!(f, "#{}", if *b { "t" } else { "f" }),
            Frame::Null => write!(f, "$-1"),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Array(frames) => write_elements(f, '*', frames),
            Frame::Set(frames) => write_elements(f, '~', frames),
            Frame::Map(entries) => {
                write!(f, "%{}", entries.len())?;
                for (key, value) in entries {
                    write!(f, " {} {}", key, value)?;
                }
                Ok(())
            }
        }
    }
}

fn write_elements(f: &mut fmt::Formatter<'_>, prefix: char, frames: &[Frame]) -> fmt::Result {
    write!(f, "{}{}", prefix, frames.len())?;
    for frame in frames {
        write!(f, " {}", frame)?;
    }
    Ok(())
}

fn decode_elements(
    src: &[u8],
    pos: usize,
    length: usize,
    depth: usize,
) -> Result<(Vec<Frame>, usize), Error> {
    // Every element takes at least three bytes, don't trust the declared length any further.
    let mut frames = Vec::with_capacity(length.min(src.len() - pos));
    let mut pos = pos;
    for _ in 0..length {
        let (frame, next) = Frame::decode_nested(src, pos, depth)?;
        frames.push(frame);
        pos = next;
    }

    Ok((frames, pos))
}

/// Returns the bytes between `pos` and the next CRLF, and the position after that CRLF.
fn read_line(src: &[u8], pos: usize) -> Result<(&[u8], usize), Error> {
    let rest = src.get(pos..).ok_or(Error::Incomplete)?;
    let end = rest
        .windows(2)
        .position(|window| window == CRLF)
        .ok_or(Error::Incomplete)?;

    Ok((&rest[..end], pos + end + CRLF.len()))
}

/// Reads a length header. `-1` is the null marker and yields `None`.
fn read_length(src: &[u8], pos: usize) -> Result<(Option<usize>, usize), Error> {
    let (line, pos) = read_line(src, pos)?;
    let text = String::from_utf8_lossy(line);
    let length = text
        .parse::<isize>()
        .map_err(|_| Error::InvalidLength(text.to_string()))?;

    match length {
        -1 => Ok((None, pos)),
        length if length < 0 => Err(Error::InvalidLength(text.to_string())),
        length => Ok((Some(length as usize), pos)),
    }
}

fn read_bulk(src: &[u8], pos: usize) -> Result<(Option<&[u8]>, usize), Error> {
    let (length, pos) = read_length(src, pos)?;
    let Some(length) = length else {
        return Ok((None, pos));
    };

    let end = pos
        .checked_add(length)
        .ok_or_else(|| Error::InvalidLength(length.to_string()))?;
    if src.len() < end + CRLF.len() {
        return Err(Error::Incomplete);
    }
    if &src[end..end + CRLF.len()] != CRLF {
        return Err(Error::MissingTerminator);
    }

    Ok((Some(&src[pos..end]), end + CRLF.len()))
}

fn parse<T: str::FromStr>(line: &[u8], data_type: &'static str) -> Result<T, Error> {
    str::from_utf8(line)?
        .parse::<T>()
        .map_err(|_| invalid(data_type, line))
}

fn invalid(data_type: &'static str, line: &[u8]) -> Error {
    Error::InvalidValue {
        data_type,
        value: String::from_utf8_lossy(line).into_owned(),
    }
}

fn is_big_number(text: &str) -> bool {
    let digits = text.strip_prefix(|c| c == '-' || c == '+').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn format_double(d: f64) -> String {
    if d.is_nan() {
        "nan".to_string()
    } else if d.is_infinite() {
        let sign = if d > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else {
        d.to_string()
    }
}

fn write_line(dst: &mut Vec<u8>, data_type: DataType, payload: &[u8]) {
    dst.push(u8::from(data_type));
    dst.extend_from_slice(payload);
    dst.extend_from_slice(CRLF);
}

fn write_bulk(dst: &mut Vec<u8>, payload: &[u8]) {
    write_line(dst, DataType::BulkString, payload.len().to_string().as_bytes());
    dst.extend_from_slice(payload);
    dst.extend_from_slice(CRLF);
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    BulkString,   // '$'
    SimpleError,  // '-'
    BulkError,    // '!'
    Boolean,      // '#'
    Integer,      // ':'
    Double,       // ','
    BigNumber,    // '('
    Array,        // '*'
    Map,          // '%'
    Set,          // '~'
    // Due to historical reasons, RESP2 features two specially crafted values for representing null
    // values of bulk strings and arrays. This duality has always been a redundancy that added zero
    // semantical value to the protocol itself. The null type, introduced in RESP3, aims to fix
    // this wrong.
    Null, // '_'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'!' => Ok(Self::BulkError),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            b'#' => Ok(Self::Boolean),
            b',' => Ok(Self::Double),
            b'(' => Ok(Self::BigNumber),
            b'%' => Ok(Self::Map),
            b'~' => Ok(Self::Set),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::BulkError => b'!',
            DataType::Array => b'*',
            DataType::Null => b'_',
            DataType::Boolean => b'#',
            DataType::Double => b',',
            DataType::BigNumber => b'(',
            DataType::Map => b'%',
            DataType::Set => b'~',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data: &[u8]) -> Result<Frame, Error> {
        Frame::decode(data, 0).map(|(frame, _)| frame)
    }

    #[test]
    fn parse_simple_string_frame() {
        let frame = decode(b"+OK\r\n");

        assert!(matches!(frame, Ok(Frame::Simple(ref s)) if s == "OK"));
    }

    #[test]
    fn parse_simple_error_frame() {
        let frame = decode(b"-Error message\r\n");

        assert!(matches!(
            frame,
            Ok(Frame::Error(ref s)) if s == "Error message"
        ));
    }

    fn parse_integer_frame(data: &[u8], expected: i64) {
        let frame = decode(data);

        assert!(matches!(frame, Ok(Frame::Integer(i)) if i == expected));
    }

    #[test]
    fn parse_integer_frame_positive() {
        parse_integer_frame(b":1000\r\n", 1000);
    }

    #[test]
    fn parse_integer_frame_negative() {
        parse_integer_frame(b":-1000\r\n", -1000);
    }

    #[test]
    fn parse_integer_frame_zero() {
        parse_integer_frame(b":0\r\n", 0);
    }

    #[test]
    fn parse_integer_frame_positive_singned() {
        parse_integer_frame(b":+1000\r\n", 1000);
    }

    #[test]
    fn parse_integer_frame_invalid() {
        assert_eq!(
            decode(b":12a\r\n"),
            Err(Error::InvalidValue {
                data_type: "integer",
                value: "12a".to_string()
            })
        );
    }

    #[test]
    fn parse_big_number_frame() {
        let frame = decode(b"(3492890328409238509324850943850943825024385\r\n");

        assert_eq!(
            frame,
            Ok(Frame::BigNumber(
                "3492890328409238509324850943850943825024385".to_string()
            ))
        );
        assert!(decode(b"(12.5\r\n").is_err());
    }

    #[test]
    fn parse_double_frame() {
        assert_eq!(decode(b",1.23\r\n"), Ok(Frame::Double(1.23)));
        assert_eq!(decode(b",-10\r\n"), Ok(Frame::Double(-10.0)));
        assert_eq!(decode(b",inf\r\n"), Ok(Frame::Double(f64::INFINITY)));
        assert!(matches!(decode(b",nan\r\n"), Ok(Frame::Double(d)) if d.is_nan()));
    }

    #[test]
    fn parse_boolean_frame() {
        assert_eq!(decode(b"#t\r\n"), Ok(Frame::Boolean(true)));
        assert_eq!(decode(b"#f\r\n"), Ok(Frame::Boolean(false)));
        assert!(matches!(
            decode(b"#x\r\n"),
            Err(Error::InvalidValue { data_type: "boolean", .. })
        ));
    }

    #[test]
    fn parse_null_frame() {
        assert_eq!(decode(b"_\r\n"), Ok(Frame::Null));
    }

    #[test]
    fn parse_bulk_string_frame() {
        let frame = decode(b"$6\r\nfoobar\r\n");

        assert!(matches!(
            frame,
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("foobar")
        ));
    }

    #[test]
    fn parse_bulk_string_frame_with_crlf_inside() {
        let frame = decode(b"$8\r\nfoo\r\nbar\r\n");

        assert_eq!(frame, Ok(Frame::Bulk(Bytes::from("foo\r\nbar"))));
    }

    #[test]
    fn parse_bulk_string_frame_empty() {
        let frame = decode(b"$0\r\n\r\n");

        assert!(matches!(
            frame,
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("")
        ));
    }

    #[test]
    fn parse_bulk_string_frame_null() {
        let frame = decode(b"$-1\r\n");

        assert!(matches!(frame, Ok(Frame::Null)));
    }

    #[test]
    fn parse_bulk_string_frame_wrong_length() {
        assert_eq!(decode(b"$2\r\nfoo\r\n"), Err(Error::MissingTerminator));
        assert_eq!(
            decode(b"$x\r\nfoo\r\n"),
            Err(Error::InvalidLength("x".to_string()))
        );
        assert_eq!(
            decode(b"$-2\r\n"),
            Err(Error::InvalidLength("-2".to_string()))
        );
    }

    #[test]
    fn parse_bulk_error_frame() {
        let frame = decode(b"!6\r\nfoobar\r\n");

        assert!(matches!(
            frame,
            Ok(Frame::Error(ref s)) if s == "foobar"
        ));
    }

    #[test]
    fn parse_bulk_error_frame_null() {
        let frame = decode(b"!-1\r\n");

        assert!(matches!(frame, Ok(Frame::Null)));
    }

    #[test]
    fn parse_array_frame_empty() {
        let frame = decode(b"*0\r\n");

        assert!(matches!(frame, Ok(Frame::Array(ref a)) if a.is_empty()));
    }

    #[test]
    fn parse_array_frame() {
        let data = b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n";

        let frame = Frame::decode(data, 0);

        assert_eq!(
            frame,
            Ok((
                Frame::Array(vec![
                    Frame::Bulk(Bytes::from("hello")),
                    Frame::Bulk(Bytes::from("world")),
                ]),
                data.len()
            ))
        );
    }

    #[test]
    fn parse_array_frame_nested() {
        let frame = decode(b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Hello\r\n-World\r\n");

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a.len() == 2
        ));

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a[0] == Frame::Array(vec![
                Frame::Integer(1),
                Frame::Integer(2),
                Frame::Integer(3)
            ])
        ));

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a[1] == Frame::Array(vec![
                Frame::Simple("Hello".to_string()),
                Frame::Error("World".to_string())
            ])
        ));
    }

    #[test]
    fn parse_array_frame_null() {
        let frame = decode(b"*-1\r\n");

        assert!(matches!(frame, Ok(Frame::Null)));
    }

    #[test]
    fn parse_array_frame_null_in_the_middle() {
        let frame = decode(b"*3\r\n$5\r\nhello\r\n$-1\r\n$5\r\nworld\r\n");

        assert_eq!(
            frame,
            Ok(Frame::Array(vec![
                Frame::Bulk(Bytes::from("hello")),
                Frame::Null,
                Frame::Bulk(Bytes::from("world")),
            ]))
        );
    }

    #[test]
    fn parse_set_frame_drops_duplicates() {
        let frame = decode(b"~3\r\n+a\r\n+b\r\n+a\r\n");

        assert_eq!(
            frame,
            Ok(Frame::Set(vec![
                Frame::Simple("a".to_string()),
                Frame::Simple("b".to_string()),
            ]))
        );
    }

    #[test]
    fn parse_map_frame() {
        let frame = decode(b"%2\r\n+first\r\n:1\r\n+second\r\n#t\r\n");

        assert_eq!(
            frame,
            Ok(Frame::Map(vec![
                (Frame::Simple("first".to_string()), Frame::Integer(1)),
                (Frame::Simple("second".to_string()), Frame::Boolean(true)),
            ]))
        );
    }

    #[test]
    fn parse_map_frame_repeated_key() {
        let frame = decode(b"%2\r\n+k\r\n:1\r\n+k\r\n:2\r\n");

        assert_eq!(
            frame,
            Ok(Frame::Map(vec![(
                Frame::Simple("k".to_string()),
                Frame::Integer(2)
            )]))
        );
    }

    #[test]
    fn parse_from_position() {
        let data = b"+first\r\n:42\r\n";

        let (first, pos) = Frame::decode(data, 0).unwrap();
        let (second, end) = Frame::decode(data, pos).unwrap();

        assert_eq!(first, Frame::Simple("first".to_string()));
        assert_eq!(second, Frame::Integer(42));
        assert_eq!(end, data.len());
    }

    #[test]
    fn parse_incomplete_frames() {
        assert_eq!(decode(b""), Err(Error::Incomplete));
        assert_eq!(decode(b"+OK"), Err(Error::Incomplete));
        assert_eq!(decode(b"$5\r\nhel"), Err(Error::Incomplete));
        assert_eq!(decode(b"*2\r\n$3\r\nGET\r\n"), Err(Error::Incomplete));
    }

    #[test]
    fn parse_nesting_limit() {
        let nested = |levels: usize| {
            let mut data = b"*1\r\n".repeat(levels);
            data.extend_from_slice(b"$4\r\nPING\r\n");
            data
        };

        let data = nested(MAX_NESTING_DEPTH);
        assert_eq!(Frame::decode(&data, 0).map(|(_, end)| end), Ok(data.len()));

        assert_eq!(
            decode(&nested(MAX_NESTING_DEPTH + 1)),
            Err(Error::TooDeep(MAX_NESTING_DEPTH))
        );
        assert_eq!(
            decode(&nested(200_000)),
            Err(Error::TooDeep(MAX_NESTING_DEPTH))
        );
        // Sets and maps count towards the same limit.
        let mut data = b"%1\r\n+k\r\n".repeat(MAX_NESTING_DEPTH + 1);
        data.extend_from_slice(b"_\r\n");
        assert_eq!(decode(&data), Err(Error::TooDeep(MAX_NESTING_DEPTH)));
    }

    #[test]
    fn parse_unknown_data_type() {
        assert_eq!(decode(b"?oops\r\n"), Err(Error::InvalidDataType(b'?')));
    }

    #[test]
    fn serialize_scalars() {
        assert_eq!(Frame::Simple("OK".to_string()).serialize(), b"+OK\r\n");
        assert_eq!(Frame::Error("ERR boom".to_string()).serialize(), b"-ERR boom\r\n");
        assert_eq!(Frame::Integer(-7).serialize(), b":-7\r\n");
        assert_eq!(
            Frame::BigNumber("18446744073709551616".to_string()).serialize(),
            b"(18446744073709551616\r\n"
        );
        assert_eq!(Frame::Double(1.5).serialize(), b",1.5\r\n");
        assert_eq!(Frame::Double(f64::NEG_INFINITY).serialize(), b",-inf\r\n");
        assert_eq!(Frame::Boolean(true).serialize(), b"#t\r\n");
        assert_eq!(Frame::Boolean(false).serialize(), b"#f\r\n");
        assert_eq!(Frame::Null.serialize(), b"$-1\r\n");
        assert_eq!(Frame::Bulk(Bytes::from("bar")).serialize(), b"$3\r\nbar\r\n");
    }

    #[test]
    fn serialize_multiline_simple_string_as_bulk_segments() {
        let frame = Frame::Simple("first\r\nsecond".to_string());

        assert_eq!(frame.serialize(), b"$5\r\nfirst\r\n$6\r\nsecond\r\n");
    }

    #[test]
    fn serialize_aggregates() {
        let frame = Frame::Map(vec![(
            Frame::Simple("members".to_string()),
            Frame::Set(vec![Frame::Integer(1), Frame::Array(vec![])]),
        )]);

        assert_eq!(frame.serialize(), b"%1\r\n+members\r\n~2\r\n:1\r\n*0\r\n");
    }

    #[test]
    fn encode_with_error_tag() {
        let frame = Frame::Simple("key: foo not found".to_string());

        assert_eq!(
            encode(&frame, Some("keyerror")),
            b"-KEYERROR\r\nkey: foo not found\r\n"
        );
        assert_eq!(encode(&Frame::Integer(3), Some("ERR")), b"-ERR\r\n:3\r\n");
        assert_eq!(
            encode(&Frame::Simple("two\r\nlines".to_string()), Some("ERR")),
            b"-ERR\r\ntwo lines\r\n"
        );
        assert_eq!(encode(&frame, None), frame.serialize());
    }

    #[test]
    fn round_trip() {
        let frame = Frame::Array(vec![
            Frame::Simple("OK".to_string()),
            Frame::Bulk(Bytes::from("binary\r\n\0data")),
            Frame::Integer(i64::MIN),
            Frame::BigNumber("-99999999999999999999999".to_string()),
            Frame::Double(-0.25),
            Frame::Boolean(false),
            Frame::Null,
            Frame::Set(vec![Frame::Simple("a".to_string())]),
            Frame::Map(vec![(Frame::Integer(1), Frame::Array(vec![]))]),
        ]);

        let bytes = frame.serialize();

        assert_eq!(Frame::decode(&bytes, 0), Ok((frame, bytes.len())));
    }
}
