//! Flat named-signal table.
//!
//! Every port in a circuit — a register's pending input, its committed
//! output, a mux select, a handshake flag — is registered here under a
//! hierarchical dotted name (`"gcd.dpath.a_reg.out"`). The table exists for
//! schedule validation and diagnostics only; the tick loop never consults
//! it. Signal values themselves live in the circuit struct's fields.

use serde::{Deserialize, Serialize};

/// Opaque ID for a signal in the flat table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SigId(u32);

impl SigId {
    /// Creates a `SigId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Metadata for one signal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Hierarchical dotted name, unique within a circuit.
    pub name: String,
    /// Bit width of the modeled signal.
    pub width: u32,
}

/// A dense, append-only table of signals.
///
/// IDs are stable for the lifetime of the table; signals are never removed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SignalDb {
    signals: Vec<SignalInfo>,
}

impl SignalDb {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signal and returns its ID.
    pub fn signal(&mut self, name: impl Into<String>, width: u32) -> SigId {
        let id = SigId(self.signals.len() as u32);
        self.signals.push(SignalInfo {
            name: name.into(),
            width,
        });
        id
    }

    /// Returns the metadata for a signal.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: SigId) -> &SignalInfo {
        &self.signals[id.0 as usize]
    }

    /// Returns the name of a signal, or `"<unknown>"` for an ID outside
    /// the table (used when rendering validation errors).
    pub fn name(&self, id: SigId) -> &str {
        self.signals
            .get(id.0 as usize)
            .map(|s| s.name.as_str())
            .unwrap_or("<unknown>")
    }

    /// Returns whether the ID is within the table.
    pub fn contains(&self, id: SigId) -> bool {
        (id.0 as usize) < self.signals.len()
    }

    /// Finds a signal by name.
    pub fn find(&self, name: &str) -> Option<SigId> {
        self.signals
            .iter()
            .position(|s| s.name == name)
            .map(|i| SigId(i as u32))
    }

    /// Returns the number of signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterates over `(id, info)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SigId, &SignalInfo)> {
        self.signals
            .iter()
            .enumerate()
            .map(|(i, s)| (SigId(i as u32), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_stable() {
        let mut db = SignalDb::new();
        let a = db.signal("top.a", 32);
        let b = db.signal("top.b", 1);
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(db.get(a).name, "top.a");
        assert_eq!(db.get(b).width, 1);
    }

    #[test]
    fn find_by_name() {
        let mut db = SignalDb::new();
        db.signal("x", 8);
        let y = db.signal("y", 8);
        assert_eq!(db.find("y"), Some(y));
        assert_eq!(db.find("z"), None);
    }

    #[test]
    fn name_of_unknown_id() {
        let db = SignalDb::new();
        assert_eq!(db.name(SigId::from_raw(3)), "<unknown>");
    }

    #[test]
    fn serde_roundtrip() {
        let mut db = SignalDb::new();
        db.signal("top.sig", 16);
        let json = serde_json::to_string(&db).unwrap();
        let back: SignalDb = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.name(SigId::from_raw(0)), "top.sig");
    }
}
