#![forbid(unsafe_code)]

//! Real-time front end.
//!
//! [`Driver`] maps wall-clock time ([`web_time::Instant`]) onto the hero's
//! virtual clock and renders the terminal as plain text: boot lines are typed
//! out as they are revealed, then each input line is answered below a `> `
//! prompt. Input is only consumed once boot completes; lines typed earlier
//! wait in the channel.
//!
//! Input arrives over an `mpsc` channel fed by [`spawn_line_reader`], which
//! stops forwarding once the hero is torn down.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cyberterm_core::MountGuard;
use cyberterm_shell::{Outcome, SessionView};
use web_time::Instant;

use crate::host::HeroMount;

/// Prompt printed when input is enabled.
pub const PROMPT: &str = "> ";

/// Longest sleep between ticks when nothing is scheduled.
pub const IDLE_WAIT: Duration = Duration::from_millis(250);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Forward lines from `reader` until EOF, a read error, a dropped receiver,
/// or teardown of the hero observed through `guard`.
pub fn spawn_line_reader<R>(reader: R, guard: MountGuard) -> (Receiver<String>, JoinHandle<()>)
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        for line in reader.lines() {
            if guard.is_torn_down() {
                break;
            }
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
        tracing::debug!(target: "cyberterm.host", "input reader finished");
    });
    (rx, handle)
}

/// Incremental text renderer.
#[derive(Debug, Default)]
struct Echo {
    boot_done: usize,
    partial: usize,
    prompted: bool,
}

impl Echo {
    fn render<W: Write>(&mut self, view: &SessionView<'_>, out: &mut W) -> io::Result<()> {
        while let Some(line) = view.boot_lines.get(self.boot_done) {
            out.write_all(line.get(self.partial..).unwrap_or_default().as_bytes())?;
            out.write_all(b"\n")?;
            self.boot_done += 1;
            self.partial = 0;
        }
        if let Some(current) = view.current_line
            && let Some(rest) = current.get(self.partial..)
            && !rest.is_empty()
        {
            out.write_all(rest.as_bytes())?;
            self.partial = current.len();
        }
        if view.input_enabled && !self.prompted {
            out.write_all(PROMPT.as_bytes())?;
            self.prompted = true;
        }
        out.flush()
    }

    fn respond<W: Write>(&mut self, outcome: &Outcome, out: &mut W) -> io::Result<()> {
        match outcome {
            Outcome::Responded(lines) => {
                for line in lines {
                    writeln!(out, "{line}")?;
                }
            }
            Outcome::Cleared => out.write_all(CLEAR_SCREEN.as_bytes())?,
            Outcome::Ignored | Outcome::Rejected => {}
        }
        self.prompted = false;
        Ok(())
    }
}

/// Wall-clock loop around a [`HeroMount`].
#[derive(Debug)]
pub struct Driver {
    hero: HeroMount,
    origin: Instant,
    echo: Echo,
}

impl Driver {
    /// Start driving `hero`; its virtual zero is now.
    #[must_use]
    pub fn new(hero: HeroMount) -> Self {
        Self {
            hero,
            origin: Instant::now(),
            echo: Echo::default(),
        }
    }

    /// The driven hero.
    #[must_use]
    pub fn hero(&self) -> &HeroMount {
        &self.hero
    }

    /// Give the hero back.
    #[must_use]
    pub fn into_hero(self) -> HeroMount {
        self.hero
    }

    /// Wall-clock time since the driver started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Bring the hero up to the current wall-clock time.
    pub fn tick(&mut self) -> Duration {
        let now = self.elapsed();
        self.hero.advance_to(now);
        now
    }

    /// How long to wait before the next tick.
    #[must_use]
    pub fn wait_budget(&self) -> Duration {
        let now = self.elapsed();
        self.hero
            .next_deadline()
            .map_or(IDLE_WAIT, |deadline| deadline.saturating_sub(now))
            .min(IDLE_WAIT)
    }

    /// Run until `input` disconnects, then unmount the hero.
    ///
    /// # Errors
    ///
    /// Returns the first write error on `out`.
    pub fn run<W: Write>(&mut self, input: &Receiver<String>, out: &mut W) -> io::Result<()> {
        while self.hero.is_mounted() {
            self.tick();
            self.echo.render(&self.hero.session().view(), out)?;
            let wait = self.wait_budget();
            if !self.hero.session().input_enabled() {
                thread::sleep(wait);
                continue;
            }
            match input.recv_timeout(wait) {
                Ok(line) => {
                    self.tick();
                    let outcome = self.hero.submit(&line);
                    self.echo.respond(&outcome, out)?;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        let stats = self.hero.stats();
        self.hero.unmount();
        tracing::debug!(
            target: "cyberterm.host",
            elapsed_ms = self.elapsed().as_millis() as u64,
            triggers = stats.ambient.triggers_fired,
            particles = stats.particles.spawned,
            "driver stopped"
        );
        out.write_all(b"\n")?;
        out.flush()
    }
}
