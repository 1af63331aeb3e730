//! Line assembly for consoles that deliver one byte at a time.

extern crate alloc;
use alloc::string::{String, ToString};

/// What a completed line turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// A whole line, without its terminator.
    Line(String),
    /// The line did not fit and was discarded.
    TooLong,
}

/// Collects bytes into lines of at most `N` characters.
///
/// `\r` is dropped so `\n` and `\r\n` terminals both work. Non-ASCII bytes
/// are kept as U+FFFD so validation rejects them. A line longer than `N`
/// is never returned shortened: it is reported as [`LineEvent::TooLong`].
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::line::{LineBuffer, LineEvent};
///
/// let mut buffer = LineBuffer::<4>::new();
/// let events: Vec<_> = b"12\r\n12345\n".iter().filter_map(|&b| buffer.push(b)).collect();
/// assert_eq!(events, [LineEvent::Line("12".into()), LineEvent::TooLong]);
/// ```
#[derive(Debug, Default)]
pub struct LineBuffer<const N: usize> {
    buffer: heapless::String<N>,
    overflowed: bool,
}

impl<const N: usize> LineBuffer<N> {
    /// Empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: heapless::String::new(),
            overflowed: false,
        }
    }

    /// Feed one byte; returns an event when it ends a line.
    pub fn push(&mut self, byte: u8) -> Option<LineEvent> {
        match byte {
            b'\n' => {
                let event = if self.overflowed {
                    LineEvent::TooLong
                } else {
                    LineEvent::Line(self.buffer.as_str().to_string())
                };
                self.buffer.clear();
                self.overflowed = false;
                Some(event)
            }
            b'\r' => None,
            b => {
                let c = if b.is_ascii() { b as char } else { '\u{fffd}' };
                if self.buffer.push(c).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn feed<const N: usize>(buffer: &mut LineBuffer<N>, bytes: &[u8]) -> Vec<LineEvent> {
        bytes.iter().filter_map(|&b| buffer.push(b)).collect()
    }

    #[test]
    fn splits_on_newline() {
        let mut buffer = LineBuffer::<64>::new();
        assert_eq!(
            feed(&mut buffer, b"128\n0\r\n"),
            [LineEvent::Line("128".into()), LineEvent::Line("0".into())]
        );
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let mut buffer = LineBuffer::<64>::new();
        assert!(feed(&mut buffer, b"25").is_empty());
        assert_eq!(feed(&mut buffer, b"5\n"), [LineEvent::Line("255".into())]);
    }

    #[test]
    fn overlong_digits_with_bad_tail_are_not_shortened() {
        let mut buffer = LineBuffer::<64>::new();
        let mut input = [b'0'; 64].to_vec();
        input.extend_from_slice(b"abc\n");
        assert_eq!(feed(&mut buffer, &input), [LineEvent::TooLong]);
    }

    #[test]
    fn line_of_exact_capacity_is_kept() {
        let mut buffer = LineBuffer::<4>::new();
        assert_eq!(feed(&mut buffer, b"0255\n"), [LineEvent::Line("0255".into())]);
    }

    #[test]
    fn recovers_after_overflow() {
        let mut buffer = LineBuffer::<4>::new();
        assert_eq!(
            feed(&mut buffer, b"123456\n42\n"),
            [LineEvent::TooLong, LineEvent::Line("42".into())]
        );
    }

    #[test]
    fn non_ascii_becomes_replacement_char() {
        let mut buffer = LineBuffer::<8>::new();
        assert_eq!(
            feed(&mut buffer, &[b'1', 0xC3, b'\n']),
            [LineEvent::Line("1\u{fffd}".into())]
        );
    }
}
