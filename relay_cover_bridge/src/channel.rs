//! Line-oriented relay channel.
//!
//! Each publish becomes one `<topic> <payload>` line on the underlying
//! writer, flushed immediately. Pipe stdout into an MQTT client to reach
//! the relays.

use parking_lot::Mutex;
use relay_cover_common::channel::{ChannelError, RelayChannel};
use std::io::{self, Stdout, Write};

pub struct LineChannel<W: Write + Send> {
    out: Mutex<W>,
}

impl LineChannel<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> LineChannel<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> RelayChannel for LineChannel<W> {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError> {
        if topic.is_empty() || topic.contains(char::is_whitespace) || payload.contains('\n') {
            return Err(ChannelError::Io(format!(
                "cannot frame publish to {topic:?} as a single line"
            )));
        }
        let mut out = self.out.lock();
        writeln!(out, "{topic} {payload}")
            .and_then(|()| out.flush())
            .map_err(|e| ChannelError::Io(e.to_string()))
    }
}
