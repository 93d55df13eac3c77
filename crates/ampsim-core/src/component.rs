//! The component stamp protocol.
//!
//! Every device participates in two build passes and one run-time pass:
//!
//! 1. `register` - announce node names, matrix positions and any shared
//!    control/input signals;
//! 2. `bind` - resolve those names to cached handles into the sparse
//!    system (ground references resolve to the dummy sentinel);
//! 3. `fill` - accumulate the device's stamp through the cached handles
//!    into whichever value layer is currently active.
//!
//! `fill` must not allocate and must not zero anything: the driver owns
//! zeroing and prefilling, stamps only ever add.

use crate::signal::SignalBank;
use crate::system::SparseSystem;
use crate::table::EntryTable;
use crate::Result;

/// Which contribution layers a component writes.
///
/// The driver partitions components into three ordered lists by these
/// flags; a component may set more than one only if its contribution is
/// genuinely additive across layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_static: bool,
    pub is_dynamic: bool,
    pub is_nonlinear: bool,
}

impl Classification {
    pub const STATIC: Self = Self {
        is_static: true,
        is_dynamic: false,
        is_nonlinear: false,
    };
    pub const DYNAMIC: Self = Self {
        is_static: false,
        is_dynamic: true,
        is_nonlinear: false,
    };
    pub const NONLINEAR: Self = Self {
        is_static: false,
        is_dynamic: false,
        is_nonlinear: true,
    };
}

/// A device that stamps into the MNA system.
pub trait Component: Send {
    /// Device instance name, e.g. `"R1"`.
    fn name(&self) -> &str;

    /// Layer membership flags.
    fn classification(&self) -> Classification;

    /// Announce nodes, matrix entries and shared signals.
    fn register(&mut self, table: &mut EntryTable, signals: &mut SignalBank);

    /// Cache handles against the frozen, allocated system.
    fn bind(&mut self, system: &SparseSystem) -> Result<()>;

    /// Accumulate this device's stamp into the active layer.
    fn fill(&self, system: &mut SparseSystem);
}
