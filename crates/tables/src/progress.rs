//! A fixed-width terminal progress bar.
//!
//! ```text
//! building: [#########           ]
//! ```
//!
//! `tick()` advances incrementally, `complete()` sets an absolute position,
//! and `finish()` fills the bar early.  Redrawing is cheap: a `#` is
//! written only when enough ticks accumulate to grow the bar by one cell.

use std::io::{self, Write};

/// A progress bar over any writer (usually stderr).
pub struct ProgressBar<W: Write> {
    out: W,
    message: String,
    /// Total ticks expected for a full bar.
    total: u64,
    /// Ticks received so far.
    ticks: u64,
    /// Tick count at which the next cell is drawn.
    next: u64,
    /// Bar width in cells.
    width: u64,
    /// Cells drawn so far.
    drawn: u64,
    finished: bool,
}

impl ProgressBar<io::Stderr> {
    /// A bar on standard error.
    pub fn stderr(width: usize, message: &str) -> Self {
        Self::new(io::stderr(), width, message)
    }
}

impl<W: Write> ProgressBar<W> {
    /// Create a bar of `width` cells prefixed by `message`.
    pub fn new(out: W, width: usize, message: &str) -> Self {
        ProgressBar {
            out,
            message: message.to_string(),
            total: 0,
            ticks: 0,
            next: 0,
            width: width.max(1) as u64,
            drawn: 0,
            finished: false,
        }
    }

    /// Start the bar, expecting `total` ticks in all.
    pub fn start(&mut self, total: u64) -> io::Result<()> {
        self.total = total;
        self.ticks = 0;
        self.drawn = 0;
        self.finished = false;

        // Reserve the bar area, then return to the line start and draw the
        // opening bracket after the message.
        let span = self.width as usize + 1 + self.message.len();
        write!(self.out, "{}]\r{}[", " ".repeat(span), self.message)?;
        self.out.flush()?;

        self.next = self.next_target();
        if self.total == 0 {
            return self.finish();
        }
        self.tick(0)
    }

    /// Advance by `ticks`.
    pub fn tick(&mut self, ticks: u64) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.ticks += ticks;
        if self.ticks >= self.next {
            self.redraw()?;
        }
        Ok(())
    }

    /// Advance to the absolute position `ticks` if that is further along.
    pub fn complete(&mut self, ticks: u64) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        if ticks > self.next && ticks > self.ticks {
            self.tick(ticks - self.ticks)?;
        }
        Ok(())
    }

    /// Fill the bar now, possibly early.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.ticks < self.total {
            return self.tick(self.total - self.ticks);
        }
        // Degenerate zero-total bar: draw everything at once.
        while self.drawn < self.width {
            self.drawn += 1;
            self.out.write_all(b"#")?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Tick count at which cell `drawn + 1` is due.
    fn next_target(&self) -> u64 {
        (self.total * (self.drawn + 1) + self.width - 1) / self.width
    }

    fn redraw(&mut self) -> io::Result<()> {
        if self.ticks > self.total {
            self.ticks = self.total;
        }
        while self.ticks >= self.next && self.drawn < self.width {
            self.drawn += 1;
            self.next = self.next_target();
            self.out.write_all(b"#")?;
        }
        self.out.flush()?;
        if self.drawn == self.width {
            writeln!(self.out)?;
            self.out.flush()?;
            self.finished = true;
        }
        Ok(())
    }
}
