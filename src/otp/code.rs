use std::{fmt, time::Duration};

use tokio::time::Instant;

pub const OTP_LENGTH: usize = 6;

/// Six single-digit boxes with a focus cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpCode {
    digits: [Option<u8>; OTP_LENGTH],
    focus: usize,
}

impl OtpCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts one digit at `position` and moves focus forward. Anything else is ignored.
    pub fn input(&mut self, position: usize, ch: char) -> bool {
        let Some(digit) = ch.to_digit(10) else {
            return false;
        };
        let Some(slot) = self.digits.get_mut(position) else {
            return false;
        };
        *slot = Some(digit as u8);
        self.focus = (position + 1).min(OTP_LENGTH - 1);
        true
    }

    /// Types at the focused position.
    pub fn type_char(&mut self, ch: char) -> bool {
        self.input(self.focus, ch)
    }

    /// Clears a filled position, or moves focus back from an empty one.
    pub fn backspace(&mut self, position: usize) {
        let Some(slot) = self.digits.get_mut(position) else {
            return;
        };
        if slot.take().is_some() {
            self.focus = position;
        } else if position > 0 {
            self.focus = position - 1;
        }
    }

    /// Accepts exactly six digits, filling every position and focusing the last.
    pub fn paste(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.len() != OTP_LENGTH || !text.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        for (slot, ch) in self.digits.iter_mut().zip(text.chars()) {
            *slot = ch.to_digit(10).map(|d| d as u8);
        }
        self.focus = OTP_LENGTH - 1;
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn filled(&self) -> usize {
        self.digits.iter().flatten().count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == OTP_LENGTH
    }

    /// The code, once every position holds a digit.
    pub fn value(&self) -> Option<String> {
        self.digits
            .iter()
            .map(|d| d.map(|d| char::from(b'0' + d)))
            .collect()
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in &self.digits {
            match digit {
                Some(d) => write!(f, "{d}")?,
                None => f.write_str("_")?,
            }
        }
        Ok(())
    }
}

/// Resend lockout, read as whole seconds counting down to zero.
#[derive(Debug, Clone)]
pub struct Cooldown {
    period: Duration,
    until: Option<Instant>,
}

impl Cooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            until: None,
        }
    }

    pub fn start(&mut self) {
        self.until = Some(Instant::now() + self.period);
    }

    pub fn remaining_secs(&self) -> u64 {
        self.until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .map(|left| left.as_millis().div_ceil(1000) as u64)
            .unwrap_or(0)
    }

    pub fn is_ready(&self) -> bool {
        self.remaining_secs() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_advances_focus() {
        let mut code = OtpCode::new();
        for ch in "1234".chars() {
            assert!(code.type_char(ch));
        }
        assert_eq!(code.focus(), 4);
        assert_eq!(code.filled(), 4);
        assert_eq!(code.value(), None);
        assert_eq!(code.to_string(), "1234__");
    }

    #[test]
    fn rejects_non_digits_and_out_of_range() {
        let mut code = OtpCode::new();
        assert!(!code.input(0, 'a'));
        assert!(!code.input(0, ' '));
        assert!(!code.input(6, '1'));
        assert_eq!(code, OtpCode::new());
    }

    #[test]
    fn last_box_keeps_focus() {
        let mut code = OtpCode::new();
        assert!(code.input(5, '9'));
        assert_eq!(code.focus(), 5);
    }

    #[test]
    fn backspace_on_empty_moves_back() {
        let mut code = OtpCode::new();
        code.type_char('4');
        code.type_char('2');
        assert_eq!(code.focus(), 2);
        code.backspace(2);
        assert_eq!(code.focus(), 1);
        code.backspace(1);
        assert_eq!(code.focus(), 1);
        assert_eq!(code.filled(), 1);
        code.backspace(0);
        assert_eq!(code.focus(), 0);
        assert_eq!(code.filled(), 0);
        code.backspace(0);
        assert_eq!(code.focus(), 0);
    }

    #[test]
    fn full_paste_fills_everything() {
        let mut code = OtpCode::new();
        assert!(code.paste(" 482913\n"));
        assert_eq!(code.value().as_deref(), Some("482913"));
        assert_eq!(code.focus(), OTP_LENGTH - 1);
    }

    #[test]
    fn partial_or_dirty_paste_is_ignored() {
        let mut code = OtpCode::new();
        assert!(!code.paste("12345"));
        assert!(!code.paste("1234567"));
        assert!(!code.paste("12a456"));
        assert_eq!(code.filled(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_counts_down_whole_seconds() {
        let mut cooldown = Cooldown::new(Duration::from_secs(30));
        assert!(cooldown.is_ready());
        cooldown.start();
        assert_eq!(cooldown.remaining_secs(), 30);
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(cooldown.remaining_secs(), 30);
        tokio::time::advance(Duration::from_millis(600)).await;
        assert_eq!(cooldown.remaining_secs(), 29);
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cooldown.is_ready());
    }
}
