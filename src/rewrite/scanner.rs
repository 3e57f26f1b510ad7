//! Streaming scan for the banner injection point.
//!
//! # Responsibilities
//! - Tokenize an HTML byte stream chunk by chunk, without buffering the body
//! - Find the first `<body>` start tag and splice the banner right after it
//! - Reproduce every input byte verbatim; the banner is the only addition
//!
//! # Design Decisions
//! - Two phases: SCANNING tokenizes until the body tag, COPYING forwards the
//!   rest raw with no per-token cost
//! - Tokens split across chunk boundaries are carried in a small pending
//!   buffer; text runs are emitted eagerly
//! - A `<body>` inside a comment or a raw-text element (script, style, ...)
//!   never matches; a self-closing `<body/>` is not a start tag token
//! - End of input mid-token is not an error: the tail flushes verbatim

use bytes::{Bytes, BytesMut};

/// Scan phase. `Copying` is terminal: remaining input passes through raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Tokenizing markup, looking for the body start tag.
    Scanning,
    /// Inside a raw-text element; markup is inert until the given close tag.
    RawText(&'static [u8]),
    /// Remaining input is copied through verbatim.
    Copying,
}

/// Outcome of examining the front of the pending buffer.
enum Step {
    /// The buffer does not yet hold a complete token.
    NeedMore,
    /// A complete token of `len` bytes; continue in `next` mode.
    Token { len: usize, next: Mode },
    /// A complete `<body>` start tag of `len` bytes.
    BodyTag { len: usize },
}

/// Streaming scanner that injects a banner after the first `<body>` tag.
///
/// Feed chunks with [`push`](Self::push); each call returns the output bytes
/// that are safe to emit so far. [`finish`](Self::finish) flushes whatever
/// is still pending when the input ends.
#[derive(Debug)]
pub struct BodyScanner {
    banner: Bytes,
    pending: BytesMut,
    mode: Mode,
    injected: bool,
}

impl BodyScanner {
    pub fn new(banner: Bytes) -> Self {
        Self {
            banner,
            pending: BytesMut::new(),
            mode: Mode::Scanning,
            injected: false,
        }
    }

    /// Feed the next input chunk; returns output ready to emit.
    pub fn push(&mut self, chunk: &[u8]) -> Bytes {
        if self.mode == Mode::Copying && self.pending.is_empty() {
            return Bytes::copy_from_slice(chunk);
        }
        self.pending.extend_from_slice(chunk);
        self.drain()
    }

    /// Signal end of input. Whatever is still buffered — including an
    /// incomplete trailing token — flushes verbatim.
    pub fn finish(&mut self) -> Bytes {
        self.pending.split().freeze()
    }

    /// Whether the banner has been spliced into the output.
    pub fn injected(&self) -> bool {
        self.injected
    }

    /// True once every future chunk passes through unchanged, so callers
    /// can stop routing input through the scanner.
    pub fn pass_through(&self) -> bool {
        self.mode == Mode::Copying && self.pending.is_empty()
    }

    fn drain(&mut self) -> Bytes {
        let mut out = BytesMut::new();
        while !self.pending.is_empty() {
            match self.mode {
                Mode::Copying => {
                    out.extend_from_slice(&self.pending);
                    self.pending.clear();
                    break;
                }
                Mode::RawText(close) => match scan_rawtext(&self.pending, close) {
                    RawScan::Found { at } => {
                        let text = self.pending.split_to(at);
                        out.extend_from_slice(&text);
                        self.mode = Mode::Scanning;
                    }
                    RawScan::NeedMore { keep } => {
                        let emit = self.pending.len() - keep;
                        let text = self.pending.split_to(emit);
                        out.extend_from_slice(&text);
                        break;
                    }
                },
                Mode::Scanning => match next_token(&self.pending) {
                    Step::NeedMore => break,
                    Step::Token { len, next } => {
                        let token = self.pending.split_to(len);
                        out.extend_from_slice(&token);
                        self.mode = next;
                    }
                    Step::BodyTag { len } => {
                        let tag = self.pending.split_to(len);
                        out.extend_from_slice(&tag);
                        out.extend_from_slice(&self.banner);
                        self.injected = true;
                        // The rest of the document needs no tokenization;
                        // the loop flushes anything already buffered.
                        self.mode = Mode::Copying;
                    }
                },
            }
        }
        out.freeze()
    }
}

/// Classify the token at the front of `buf`. `buf` is non-empty.
fn next_token(buf: &[u8]) -> Step {
    if buf[0] != b'<' {
        // Text runs carry no structure; emit up to the next '<'. Splitting
        // a text run across chunks cannot change the output.
        let len = buf
            .iter()
            .position(|&b| b == b'<')
            .unwrap_or(buf.len());
        return Step::Token {
            len,
            next: Mode::Scanning,
        };
    }
    let Some(&kind) = buf.get(1) else {
        return Step::NeedMore;
    };
    match kind {
        b'!' => markup_declaration(buf),
        b'/' => end_tag(buf),
        b'?' => until_gt(buf),
        c if c.is_ascii_alphabetic() => start_tag(buf),
        // A '<' followed by anything else is plain text.
        _ => Step::Token {
            len: 1,
            next: Mode::Scanning,
        },
    }
}

/// `<!...`: a comment ends at the first `-->` (covering the short forms
/// `<!-->` and `<!--->`); everything else (doctype, CDATA) is a single
/// token ending at the first `>`.
fn markup_declaration(buf: &[u8]) -> Step {
    if b"<!--".starts_with(&buf[..buf.len().min(4)]) && buf.len() < 4 {
        return Step::NeedMore;
    }
    if buf.starts_with(b"<!--") {
        match find(buf, 2, b"-->") {
            Some(pos) => Step::Token {
                len: pos + 3,
                next: Mode::Scanning,
            },
            None => Step::NeedMore,
        }
    } else {
        until_gt(buf)
    }
}

/// `</...`: a named end tag parses like a tag; `</` followed by anything
/// else is bogus markup ending at the first `>`.
fn end_tag(buf: &[u8]) -> Step {
    let Some(&first) = buf.get(2) else {
        return Step::NeedMore;
    };
    if !first.is_ascii_alphabetic() {
        return until_gt(buf);
    }
    match scan_tag(buf, 2) {
        Some((len, _, _)) => Step::Token {
            len,
            next: Mode::Scanning,
        },
        None => Step::NeedMore,
    }
}

fn start_tag(buf: &[u8]) -> Step {
    let Some((len, name, self_closing)) = scan_tag(buf, 1) else {
        return Step::NeedMore;
    };
    if !self_closing && name.eq_ignore_ascii_case(b"body") {
        return Step::BodyTag { len };
    }
    if name.eq_ignore_ascii_case(b"plaintext") {
        // No end tag exists; everything after is raw text forever, so no
        // injection point can follow.
        return Step::Token {
            len,
            next: Mode::Copying,
        };
    }
    let next = match rawtext_close(name) {
        Some(close) => Mode::RawText(close),
        None => Mode::Scanning,
    };
    Step::Token { len, next }
}

/// Scan a tag starting at `buf[0] == '<'` with the name at `name_start`.
/// Returns (token length, name, self-closing flag), or None if the tag is
/// not complete in `buf` yet. Quoted attribute values may contain `>`.
fn scan_tag(buf: &[u8], name_start: usize) -> Option<(usize, &[u8], bool)> {
    let mut i = name_start;
    while i < buf.len() && !is_ws(buf[i]) && buf[i] != b'/' && buf[i] != b'>' {
        i += 1;
    }
    if i >= buf.len() {
        return None;
    }
    let name = &buf[name_start..i];

    loop {
        while i < buf.len() && is_ws(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            return None;
        }
        match buf[i] {
            b'>' => return Some((i + 1, name, false)),
            b'/' => match buf.get(i + 1) {
                Some(b'>') => return Some((i + 2, name, true)),
                Some(_) => i += 1,
                None => return None,
            },
            _ => {
                // Attribute name, optional "= value".
                while i < buf.len()
                    && !is_ws(buf[i])
                    && buf[i] != b'='
                    && buf[i] != b'/'
                    && buf[i] != b'>'
                {
                    i += 1;
                }
                while i < buf.len() && is_ws(buf[i]) {
                    i += 1;
                }
                if i >= buf.len() {
                    return None;
                }
                if buf[i] == b'=' {
                    i += 1;
                    while i < buf.len() && is_ws(buf[i]) {
                        i += 1;
                    }
                    if i >= buf.len() {
                        return None;
                    }
                    match buf[i] {
                        quote @ (b'"' | b'\'') => {
                            i += 1;
                            while i < buf.len() && buf[i] != quote {
                                i += 1;
                            }
                            if i >= buf.len() {
                                return None;
                            }
                            i += 1;
                        }
                        _ => {
                            // Unquoted value: runs to whitespace or '>',
                            // '/' is an ordinary value byte here.
                            while i < buf.len() && !is_ws(buf[i]) && buf[i] != b'>' {
                                i += 1;
                            }
                            if i >= buf.len() {
                                return None;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Single token ending at the first `>`, inclusive.
fn until_gt(buf: &[u8]) -> Step {
    match buf.iter().position(|&b| b == b'>') {
        Some(pos) => Step::Token {
            len: pos + 1,
            next: Mode::Scanning,
        },
        None => Step::NeedMore,
    }
}

/// Progress of a raw-text scan.
enum RawScan {
    /// The close tag starts at `at`.
    Found { at: usize },
    /// No close tag yet; the last `keep` bytes could still become one and
    /// must be held back.
    NeedMore { keep: usize },
}

/// Case-insensitive search for `close` (e.g. `</script`) followed by a tag
/// delimiter. `</scripty` must not close `script`.
fn scan_rawtext(buf: &[u8], close: &'static [u8]) -> RawScan {
    let mut i = 0;
    while i < buf.len() {
        if buf[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &buf[i..];
        if rest.len() < close.len() {
            if close[..rest.len()].eq_ignore_ascii_case(rest) {
                return RawScan::NeedMore { keep: rest.len() };
            }
            i += 1;
            continue;
        }
        if rest[..close.len()].eq_ignore_ascii_case(close) {
            match rest.get(close.len()) {
                Some(&b) if is_ws(b) || b == b'/' || b == b'>' => {
                    return RawScan::Found { at: i };
                }
                None => return RawScan::NeedMore { keep: rest.len() },
                Some(_) => {}
            }
        }
        i += 1;
    }
    RawScan::NeedMore { keep: 0 }
}

/// Elements whose content the HTML tokenizer treats as raw text.
fn rawtext_close(name: &[u8]) -> Option<&'static [u8]> {
    const CLOSERS: &[&[u8]] = &[
        b"</iframe",
        b"</noembed",
        b"</noframes",
        b"</noscript",
        b"</script",
        b"</style",
        b"</textarea",
        b"</title",
        b"</xmp",
    ];
    CLOSERS
        .iter()
        .copied()
        .find(|close| close[2..].eq_ignore_ascii_case(name))
}

fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
