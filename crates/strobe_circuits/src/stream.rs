//! Synthetic stream source and sink.
//!
//! The source drives a circuit's request handshake and the sink drains its
//! response handshake, once per tick. Both advance in a tick-boundary
//! (`Commit`-kind) step: they sample `val` and `rdy` as settled at the end
//! of the previous tick, which is exactly the tick on which a transfer is
//! defined to occur. A scripted source therefore never drops or duplicates
//! a payload, and a sink records a payload if and only if the conjunction
//! held.

use strobe_prim::ValRdy;

/// How a stream source produces payloads.
pub enum SourcePattern<T> {
    /// A fixed payload list. Each item is presented with `val` asserted
    /// and held until its transfer completes; `val` drops when the list is
    /// exhausted.
    Script(Vec<T>),
    /// Free-running: a fresh payload derived from the source's tick
    /// counter every tick, `val` always asserted, back-pressure ignored
    /// for payload generation. Matches the synthetic load generators used
    /// to soak the validation circuits.
    Generator(fn(u64) -> T),
}

/// Drives a request handshake from a [`SourcePattern`].
pub struct StreamSource<T> {
    pattern: SourcePattern<T>,
    index: usize,
    ticks: u64,
    /// The request-side handshake bundle. `rdy` is driven by a fanout from
    /// the circuit under test.
    pub out: ValRdy<T>,
}

impl<T: Copy + Default> StreamSource<T> {
    /// Creates a source; nothing is presented until the first pulse.
    pub fn new(pattern: SourcePattern<T>) -> Self {
        Self {
            pattern,
            index: 0,
            ticks: 0,
            out: ValRdy::new(),
        }
    }

    /// Tick-boundary update: advances past a completed transfer and
    /// presents the next payload.
    pub fn pulse(&mut self) {
        match &self.pattern {
            SourcePattern::Script(items) => {
                if self.out.is_transfer() {
                    self.index += 1;
                }
                if let Some(&item) = items.get(self.index) {
                    self.out.msg = item;
                    self.out.val = true;
                } else {
                    self.out.val = false;
                }
            }
            SourcePattern::Generator(gen) => {
                self.out.msg = gen(self.ticks);
                self.out.val = true;
            }
        }
        self.ticks += 1;
    }

    /// True once every scripted payload has been transferred. A generator
    /// source is never done.
    pub fn done(&self) -> bool {
        match &self.pattern {
            SourcePattern::Script(items) => self.index >= items.len(),
            SourcePattern::Generator(_) => false,
        }
    }
}

/// Drains a response handshake, recording every transferred payload.
pub struct StreamSink<T> {
    /// The response-side handshake bundle. `val` and `msg` are driven by
    /// fanouts from the circuit under test.
    pub in_: ValRdy<T>,
    /// Readiness knob, copied onto `in_.rdy` by the sink's combinational
    /// step each tick. Deassert between ticks to apply back-pressure.
    pub ready: bool,
    /// Every payload transferred, in order.
    pub received: Vec<T>,
}

impl<T: Copy + Default> StreamSink<T> {
    /// Creates a sink that is ready from the first tick.
    pub fn new() -> Self {
        Self {
            in_: ValRdy::new(),
            ready: true,
            received: Vec::new(),
        }
    }

    /// Tick-boundary update: records the payload if the previous tick
    /// completed a transfer.
    pub fn pulse(&mut self) {
        if self.in_.is_transfer() {
            self.received.push(self.in_.msg);
        }
    }

    /// Combinational step: drives the readiness knob onto the bundle.
    pub fn set_ready(&mut self) {
        self.in_.rdy = self.ready;
    }
}

impl<T: Copy + Default> Default for StreamSink<T> {
    fn default() -> Self {
        Self::new()
    }
}
