#![forbid(unsafe_code)]

//! Uniform read/write access to a single value.
//!
//! A [`Property`] wraps a pair of optional accessor closures. It is the
//! currency of the binding layer: both ends of a binding are properties,
//! whether they sit over an [`Observable`], over hand-written accessors on
//! some widget, or over a late-bound path that resolves its object on every
//! access.
//!
//! # Invariants
//!
//! 1. A property never grows or loses accessors after construction;
//!    [`has_getter`](Property::has_getter) and
//!    [`has_setter`](Property::has_setter) are stable.
//! 2. Reads through a getter over observable state register with the
//!    ambient tracking frame exactly like a direct observable read.
//! 3. Clones share the same accessors; a [`WeakProperty`] shares them
//!    without keeping them alive.

use std::rc::{Rc, Weak};

use tether_reactive::Observable;

use crate::error::PropertyError;

type Getter<T> = Box<dyn Fn() -> Result<T, PropertyError>>;
type Setter<T> = Box<dyn Fn(T) -> Result<(), PropertyError>>;

struct PropertyCore<T> {
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
}

/// A readable and/or writable slot over some value of type `T`.
pub struct Property<T> {
    core: Rc<PropertyCore<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("has_getter", &self.core.getter.is_some())
            .field("has_setter", &self.core.setter.is_some())
            .finish()
    }
}

impl<T: 'static> Property<T> {
    /// A property backed by both accessors.
    pub fn from_accessors(
        getter: impl Fn() -> Result<T, PropertyError> + 'static,
        setter: impl Fn(T) -> Result<(), PropertyError> + 'static,
    ) -> Self {
        Self {
            core: Rc::new(PropertyCore {
                getter: Some(Box::new(getter)),
                setter: Some(Box::new(setter)),
            }),
        }
    }

    /// A property that can only be read.
    pub fn read_only(getter: impl Fn() -> Result<T, PropertyError> + 'static) -> Self {
        Self {
            core: Rc::new(PropertyCore {
                getter: Some(Box::new(getter)),
                setter: None,
            }),
        }
    }

    /// A property that can only be written.
    pub fn write_only(setter: impl Fn(T) -> Result<(), PropertyError> + 'static) -> Self {
        Self {
            core: Rc::new(PropertyCore {
                getter: None,
                setter: Some(Box::new(setter)),
            }),
        }
    }

    /// A read/write property over an observable cell.
    ///
    /// The property holds the cell weakly; once every strong handle to the
    /// cell is gone, accesses fail with [`PropertyError::TargetGone`]. Reads
    /// register with the ambient tracking frame through the cell itself.
    pub fn from_observable(cell: &Observable<T>) -> Self
    where
        T: Clone,
    {
        let for_get = cell.downgrade();
        let for_set = cell.downgrade();
        Self::from_accessors(
            move || for_get.upgrade().map(|cell| cell.get()).ok_or(PropertyError::TargetGone),
            move |value| {
                let cell = for_set.upgrade().ok_or(PropertyError::TargetGone)?;
                cell.set(value);
                Ok(())
            },
        )
    }

    /// A property that re-resolves its backing property on every access.
    ///
    /// `resolver` is consulted per read and per write, so the object behind
    /// the property may appear, change, or disappear between accesses. While
    /// it is unresolved, accesses fail with [`PropertyError::TargetGone`]; a
    /// resolved but unwritable target turns a write into
    /// [`PropertyError::ReadOnly`] carrying `name`.
    pub fn late_bound(
        name: impl Into<String>,
        resolver: impl Fn() -> Option<Property<T>> + 'static,
    ) -> Self {
        let name = name.into();
        let resolver = Rc::new(resolver);
        let for_get = Rc::clone(&resolver);
        let for_set = Rc::clone(&resolver);
        Self::from_accessors(
            move || for_get().ok_or(PropertyError::TargetGone)?.get(),
            move |value| {
                let resolved = for_set().ok_or(PropertyError::TargetGone)?;
                resolved.set(value).map_err(|err| match err {
                    PropertyError::NoSetter => PropertyError::ReadOnly {
                        target: name.clone(),
                    },
                    other => other,
                })
            },
        )
    }

    /// Reads the current value.
    pub fn get(&self) -> Result<T, PropertyError> {
        match &self.core.getter {
            Some(getter) => getter(),
            None => Err(PropertyError::NoGetter),
        }
    }

    /// Writes a new value.
    pub fn set(&self, value: T) -> Result<(), PropertyError> {
        match &self.core.setter {
            Some(setter) => setter(value),
            None => Err(PropertyError::NoSetter),
        }
    }

    #[must_use]
    pub fn has_getter(&self) -> bool {
        self.core.getter.is_some()
    }

    #[must_use]
    pub fn has_setter(&self) -> bool {
        self.core.setter.is_some()
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakProperty<T> {
        WeakProperty {
            core: Rc::downgrade(&self.core),
        }
    }
}

/// A non-owning handle to a [`Property`].
pub struct WeakProperty<T> {
    core: Weak<PropertyCore<T>>,
}

impl<T> Clone for WeakProperty<T> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<T> WeakProperty<T> {
    #[must_use]
    pub fn upgrade(&self) -> Option<Property<T>> {
        self.core.upgrade().map(|core| Property { core })
    }
}
