#![forbid(unsafe_code)]

//! Keeps two properties in sync.
//!
//! A [`Binding`] wires a source and a target [`Property`] together in one of
//! four [`BindingMode`]s, re-propagating through the tracking engine
//! whenever the driving side's observables change. A [`ValueConverter`] may
//! transform values in flight.
//!
//! # Invariants
//!
//! 1. Propagation machinery is rooted in the observables the driving side
//!    reads, not in the [`Binding`] handle; dropping the handle does not
//!    stop propagation.
//! 2. The binding never extends the driven side's model lifetime in the
//!    one-way modes: the undriven endpoint is held weakly.
//! 3. Two-way bindings cannot echo forever: writes happen outside any
//!    tracking frame, and a write-back of an equal value does not notify.
//!
//! # Failure Modes
//!
//! - Structurally impossible bindings (a mode that needs an accessor the
//!   property lacks) fail construction.
//! - A write that fails during the initial sync for any reason other than a
//!   vanished late-bound object fails construction, and every tracker the
//!   attempt armed is disarmed; a failed `new` leaves nothing propagating.
//! - After construction, failed writes are logged and the binding stays
//!   armed; a late-bound endpoint may resolve again later.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use tether_reactive::track;

use crate::converter::ValueConverter;
use crate::error::PropertyError;
use crate::property::{Property, WeakProperty};

/// The direction(s) in which a binding propagates values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// Source drives target.
    OneWay,
    /// Target drives source.
    OneWayToSource,
    /// Each side drives the other.
    TwoWay,
    /// Source is copied to target once at construction; nothing is tracked.
    OneTime,
}

impl BindingMode {
    fn propagates_forward(self) -> bool {
        matches!(self, Self::OneWay | Self::TwoWay | Self::OneTime)
    }

    fn propagates_backward(self) -> bool {
        matches!(self, Self::OneWayToSource | Self::TwoWay)
    }
}

/// How a binding holds one of its properties.
enum Endpoint<T> {
    Strong(Property<T>),
    Weak(WeakProperty<T>),
}

impl<T: 'static> Endpoint<T> {
    fn property(&self) -> Option<Property<T>> {
        match self {
            Self::Strong(property) => Some(property.clone()),
            Self::Weak(weak) => weak.upgrade(),
        }
    }
}

struct BindingCore<S, T> {
    converter: ValueConverter<S, T>,
    target: Endpoint<T>,
    source: Endpoint<S>,
}

/// A live synchronization between a source and a target property.
///
/// The handle is inert: propagation continues after it is dropped, for as
/// long as the driving side's observables live. It exists so callers can
/// inspect the mode and so the driven endpoint stays reachable at least as
/// long as the handle does.
pub struct Binding {
    mode: BindingMode,
    // Keeps the endpoints rooted through the handle. Unused directly;
    // propagation closures hold their own reference.
    _core: Option<Rc<dyn Any>>,
}

impl Binding {
    /// Wires `source` to `target` in the given mode, applying `converter`
    /// to every value that crosses.
    ///
    /// The initial sync runs source-to-target first, then target-to-source,
    /// in whichever directions the mode propagates.
    pub fn new<S, T>(
        target: &Property<T>,
        source: &Property<S>,
        mode: BindingMode,
        converter: ValueConverter<S, T>,
    ) -> Result<Self, PropertyError>
    where
        S: Clone + 'static,
        T: Clone + 'static,
    {
        precheck(mode, target, source)?;

        if mode == BindingMode::OneTime {
            let value = source.get()?;
            if let Some(converted) = converter.convert_to_target(value) {
                target.set(converted)?;
            }
            return Ok(Self {
                mode,
                _core: None,
            });
        }

        // The undriven side is weakened so the binding never roots it; the
        // driving side's tracker pins its property strongly instead, which
        // reverses the reference so the tracked model points at the binding.
        let (source_endpoint, target_endpoint) = match mode {
            BindingMode::OneWay => (
                Endpoint::Weak(source.downgrade()),
                Endpoint::Strong(target.clone()),
            ),
            BindingMode::OneWayToSource => (
                Endpoint::Strong(source.clone()),
                Endpoint::Weak(target.downgrade()),
            ),
            BindingMode::TwoWay => (
                Endpoint::Strong(source.clone()),
                Endpoint::Strong(target.clone()),
            ),
            BindingMode::OneTime => unreachable!("handled above"),
        };
        let core = Rc::new(BindingCore {
            converter,
            target: target_endpoint,
            source: source_endpoint,
        });

        let init_error = Rc::new(RefCell::new(None));
        let revoked = Rc::new(Cell::new(false));
        if mode.propagates_forward() {
            spawn_source_to_target(
                source.clone(),
                Rc::clone(&core),
                Rc::downgrade(&init_error),
                Rc::clone(&revoked),
            );
        }
        if mode.propagates_backward() && init_error.borrow().is_none() {
            spawn_target_to_source(
                target.clone(),
                Rc::clone(&core),
                Rc::downgrade(&init_error),
                Rc::clone(&revoked),
            );
        }
        if let Some(err) = init_error.borrow_mut().take() {
            // A direction that armed before the failure (two-way) must not
            // outlive the failed construction; it stops on its next fire.
            revoked.set(true);
            return Err(err);
        }

        Ok(Self {
            mode,
            _core: Some(core),
        })
    }

    #[must_use]
    pub fn mode(&self) -> BindingMode {
        self.mode
    }
}

/// Binds two same-typed properties with the identity converter.
pub fn bind<T: Clone + 'static>(
    target: &Property<T>,
    source: &Property<T>,
    mode: BindingMode,
) -> Result<Binding, PropertyError> {
    Binding::new(target, source, mode, ValueConverter::identity())
}

fn precheck<S: 'static, T: 'static>(
    mode: BindingMode,
    target: &Property<T>,
    source: &Property<S>,
) -> Result<(), PropertyError> {
    if mode.propagates_forward() {
        if !source.has_getter() {
            return Err(PropertyError::NoGetter);
        }
        if !target.has_setter() {
            return Err(PropertyError::NoSetter);
        }
    }
    if mode.propagates_backward() {
        if !target.has_getter() {
            return Err(PropertyError::NoGetter);
        }
        if !source.has_setter() {
            return Err(PropertyError::NoSetter);
        }
    }
    Ok(())
}

fn spawn_source_to_target<S, T>(
    source: Property<S>,
    core: Rc<BindingCore<S, T>>,
    init_error: Weak<RefCell<Option<PropertyError>>>,
    revoked: Rc<Cell<bool>>,
) where
    S: Clone + 'static,
    T: Clone + 'static,
{
    track(
        move || source.get(),
        move |scope, rerun| {
            if revoked.get() {
                return;
            }
            scope.keep_tracking();
            match rerun() {
                Ok(value) => {
                    let Some(converted) = core.converter.convert_to_target(value) else {
                        return;
                    };
                    let Some(target) = core.target.property() else {
                        trace!("binding target gone; skipping source-to-target");
                        return;
                    };
                    if let Err(err) = target.set(converted)
                        && report_write_failure("source-to-target", err, &init_error)
                    {
                        scope.stop_tracking();
                    }
                }
                Err(err) => trace!(%err, "binding source read failed"),
            }
        },
    );
}

fn spawn_target_to_source<S, T>(
    target: Property<T>,
    core: Rc<BindingCore<S, T>>,
    init_error: Weak<RefCell<Option<PropertyError>>>,
    revoked: Rc<Cell<bool>>,
) where
    S: Clone + 'static,
    T: Clone + 'static,
{
    track(
        move || target.get(),
        move |scope, rerun| {
            if revoked.get() {
                return;
            }
            scope.keep_tracking();
            match rerun() {
                Ok(value) => {
                    let Some(converted) = core.converter.convert_to_source(value) else {
                        return;
                    };
                    let Some(source) = core.source.property() else {
                        trace!("binding source gone; skipping target-to-source");
                        return;
                    };
                    if let Err(err) = source.set(converted)
                        && report_write_failure("target-to-source", err, &init_error)
                    {
                        scope.stop_tracking();
                    }
                }
                Err(err) => trace!(%err, "binding target read failed"),
            }
        },
    );
}

/// During the initial sync the error slot is still alive, the failure is
/// recorded for `Binding::new` to surface, and the caller must stop its
/// tracking scope (returns `true`). Afterwards failures are logged and the
/// binding stays armed.
fn report_write_failure(
    direction: &'static str,
    err: PropertyError,
    init_error: &Weak<RefCell<Option<PropertyError>>>,
) -> bool {
    if err.is_transient() {
        trace!(direction, "binding write skipped: object is gone");
        return false;
    }
    match init_error.upgrade() {
        Some(slot) => {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                *slot = Some(err);
            }
            true
        }
        None => {
            warn!(direction, %err, "binding write failed");
            false
        }
    }
}
