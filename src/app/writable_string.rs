use std::{fmt::Display, io::Write};

/// A buffer collecting the text clap writes, so that it can be sent to the logger.
#[derive(Default)]
pub(crate) struct WritableString(Vec<u8>);

impl Write for WritableString {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Display for WritableString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut s = WritableString::default();
        write!(s, "solve").unwrap();
        write!(s, " -f day.json").unwrap();
        assert_eq!("solve -f day.json", s.to_string())
    }
}
