use std::io::{self, Write};

/// Fire-and-forget signal that an attempt was completed
pub trait Notifier {
    fn notify(&mut self) -> io::Result<()>;
}

/// Rings the terminal bell
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn notify(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()
    }
}

#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Counts notifications, optionally failing each one
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub calls: usize,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            calls: 0,
            fail: true,
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self) -> io::Result<()> {
        self.calls += 1;
        if self.fail {
            Err(io::Error::new(io::ErrorKind::Unsupported, "no audio device"))
        } else {
            Ok(())
        }
    }
}
