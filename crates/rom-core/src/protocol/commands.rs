//! Protocol commands
//!
//! The ROM station speaks a bracketed-tag ASCII protocol, one command and one
//! reply per `\n`-terminated line:
//!
//! ```text
//! -> [IA]            <- [IA]ROM V1
//! -> [SET]DEBUG:OFF  (no reply)
//! -> [GET]T          <- [GET]T:21.26
//! ```

/// Line terminator for commands and replies
pub const LINE_TERMINATOR: u8 = b'\n';

/// Prefix a liveness probe reply must start with (case-insensitive)
pub const PROBE_ACK: &str = "[IA]ROM V1";

/// Prefix of every value reply
pub const GET_TAG: &str = "[GET]";

/// Offset of the numeric payload in a value reply (`[GET]T:` is 7 bytes)
pub const VALUE_OFFSET: usize = 7;

/// Commands understood by the ROM station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Identify ("IA"), used as the liveness probe
    Identify,

    /// Switch verbose diagnostic output on or off
    SetDebug(bool),

    /// Query one sensor value by its code (e.g. "T")
    Get(&'a str),
}

impl<'a> Command<'a> {
    /// Encode the command as it goes on the wire, terminator included
    pub fn to_wire(&self) -> String {
        match self {
            Command::Identify => "[IA]\n".to_string(),
            Command::SetDebug(true) => "[SET]DEBUG:ON\n".to_string(),
            Command::SetDebug(false) => "[SET]DEBUG:OFF\n".to_string(),
            Command::Get(code) => format!("{}{}\n", GET_TAG, code),
        }
    }

    /// Decode one received command line (device side).
    ///
    /// Tags match case-insensitively; the terminator may or may not be present.
    pub fn parse(line: &'a str) -> Option<Command<'a>> {
        let line = line.trim();
        if line.eq_ignore_ascii_case("[IA]") {
            return Some(Command::Identify);
        }
        if line.eq_ignore_ascii_case("[SET]DEBUG:ON") {
            return Some(Command::SetDebug(true));
        }
        if line.eq_ignore_ascii_case("[SET]DEBUG:OFF") {
            return Some(Command::SetDebug(false));
        }
        match line.get(..GET_TAG.len()) {
            Some(tag) if tag.eq_ignore_ascii_case(GET_TAG) && line.len() > GET_TAG.len() => {
                Some(Command::Get(&line[GET_TAG.len()..]))
            }
            _ => None,
        }
    }
}

/// Check a probe reply for the station banner
pub fn is_probe_ack(reply: &str) -> bool {
    reply
        .get(..PROBE_ACK.len())
        .map(|head| head.eq_ignore_ascii_case(PROBE_ACK))
        .unwrap_or(false)
}

/// Extract the value from a `[GET]` reply.
///
/// Returns `None` for anything that is not a well-formed value reply; the
/// caller decides whether that is an error.
pub fn parse_value_reply(reply: &str) -> Option<f64> {
    if reply.len() <= VALUE_OFFSET {
        return None;
    }
    let tag = reply.get(..GET_TAG.len())?;
    if !tag.eq_ignore_ascii_case(GET_TAG) {
        return None;
    }
    parse_invariant_decimal(reply.get(VALUE_OFFSET..)?)
}

/// Parse a culture-invariant decimal number.
///
/// Accepts surrounding whitespace, one leading sign, `,` group separators in
/// the integer part and a `.` decimal point. Exponents, `nan` and `inf` are
/// rejected: the station prints `nan` for a failed sensor read.
pub fn parse_invariant_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let int_ok = int_part.chars().all(|c| c.is_ascii_digit() || c == ',')
        && !int_part.starts_with(',')
        && !int_part.ends_with(',');
    let frac_ok = frac_part.map_or(true, |f| f.chars().all(|c| c.is_ascii_digit()));
    let digits = int_part.chars().filter(char::is_ascii_digit).count()
        + frac_part.map_or(0, str::len);
    if !int_ok || !frac_ok || digits == 0 {
        return None;
    }

    text.replace(',', "").parse::<f64>().ok()
}
