//! Lifecycle of pluggable hardware modules.
//!
//! A module sits in a socket on the module bus. Before use, the socket is bound (optionally
//! checking the module's capability identifier) and powered; after use it is powered down and
//! unbound. [BoundModule] owns the socket exclusively for that whole period.

use core::fmt::{Debug, Display, Formatter};

#[cfg(feature = "defmt")]
use defmt::{debug, warn};

/// Identifies what kind of module is plugged into a socket.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapabilityId(pub [u8; 16]);

/// A socket on the module bus.
pub trait Socket {
    type Error;

    /// Read the capability identifier of the module in the socket.
    fn identify(&mut self) -> Result<CapabilityId, Self::Error>;

    /// Claim the socket. Returns `false` if it is already bound by someone else.
    fn bind(&mut self) -> Result<bool, Self::Error>;

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error>;

    fn unbind(&mut self) -> Result<(), Self::Error>;
}

pub enum ModuleError<E> {
    /// The module in the socket is not the one that was asked for.
    IdentityMismatch {
        expected: CapabilityId,
        found: CapabilityId,
    },
    /// The socket was already bound.
    AlreadyBound,
    Socket(E),
}

impl<E> From<E> for ModuleError<E> {
    fn from(value: E) -> Self {
        Self::Socket(value)
    }
}

impl<E: Debug> Debug for ModuleError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IdentityMismatch { expected, found } => {
                write!(f, "IdentityMismatch {{ expected: {expected:?}, found: {found:?} }}")
            }
            Self::AlreadyBound => write!(f, "AlreadyBound"),
            Self::Socket(e) => write!(f, "Socket({e:?})"),
        }
    }
}

impl<E: Display> Display for ModuleError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IdentityMismatch { .. } => write!(f, "module identity does not match the requested capability"),
            Self::AlreadyBound => write!(f, "socket already bound"),
            Self::Socket(e) => write!(f, "socket error: {e}"),
        }
    }
}

impl<E: Debug + Display> core::error::Error for ModuleError<E> {}

/// A socket that has been bound and powered.
pub struct BoundModule<S: Socket> {
    socket: S,
    open: bool,
}

impl<S: Socket> BoundModule<S> {
    /// Bind and power the module in `socket`.
    ///
    /// If `expected` is given, the module's capability identifier must match it. Failure here is
    /// a fatal configuration error for this module; the socket is left unbound and unpowered.
    pub fn open(mut socket: S, expected: Option<CapabilityId>) -> Result<Self, ModuleError<S::Error>> {
        if let Some(expected) = expected {
            let found = socket.identify()?;
            if found != expected {
                #[cfg(feature = "defmt")]
                warn!("module: expected capability {}, found {}", expected, found);
                return Err(ModuleError::IdentityMismatch { expected, found });
            }
        }

        if !socket.bind()? {
            return Err(ModuleError::AlreadyBound);
        }

        if let Err(e) = socket.set_power(true) {
            let _ = socket.unbind();
            return Err(e.into());
        }

        #[cfg(feature = "defmt")]
        debug!("module: socket bound and powered");

        Ok(Self { socket, open: true })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    /// Power down and unbind. Calling this more than once is a no-op.
    pub fn close(&mut self) -> Result<(), ModuleError<S::Error>> {
        if !self.open {
            return Ok(());
        }

        self.socket.set_power(false)?;
        self.socket.unbind()?;
        self.open = false;

        #[cfg(feature = "defmt")]
        debug!("module: socket released");

        Ok(())
    }

    /// Close the module and hand back the socket.
    pub fn release(mut self) -> Result<S, ModuleError<S::Error>> {
        self.close()?;
        Ok(self.socket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELAY: CapabilityId = CapabilityId([3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    const SD: CapabilityId = CapabilityId([9; 16]);

    #[derive(Default)]
    struct FakeSocket {
        id: Option<CapabilityId>,
        taken: bool,
        bound: bool,
        powered: bool,
        unbinds: u32,
    }

    impl Socket for FakeSocket {
        type Error = ();

        fn identify(&mut self) -> Result<CapabilityId, ()> {
            self.id.ok_or(())
        }

        fn bind(&mut self) -> Result<bool, ()> {
            if self.taken {
                return Ok(false);
            }
            self.bound = true;
            Ok(true)
        }

        fn set_power(&mut self, on: bool) -> Result<(), ()> {
            self.powered = on;
            Ok(())
        }

        fn unbind(&mut self) -> Result<(), ()> {
            self.bound = false;
            self.unbinds += 1;
            Ok(())
        }
    }

    #[test]
    fn open_binds_and_powers() {
        let socket = FakeSocket { id: Some(RELAY), ..Default::default() };
        let mut module = BoundModule::open(socket, Some(RELAY)).unwrap();
        assert!(module.is_open());
        assert!(module.socket_mut().bound);
        assert!(module.socket_mut().powered);
    }

    #[test]
    fn identity_mismatch_is_reported() {
        let socket = FakeSocket { id: Some(SD), ..Default::default() };
        match BoundModule::open(socket, Some(RELAY)) {
            Err(ModuleError::IdentityMismatch { expected, found }) => {
                assert_eq!(expected, RELAY);
                assert_eq!(found, SD);
            }
            _ => panic!("expected identity mismatch"),
        }
    }

    #[test]
    fn bound_socket_is_refused() {
        let socket = FakeSocket { taken: true, ..Default::default() };
        assert!(matches!(BoundModule::open(socket, None), Err(ModuleError::AlreadyBound)));
    }

    #[test]
    fn close_is_idempotent() {
        let mut module = BoundModule::open(FakeSocket::default(), None).unwrap();
        module.close().unwrap();
        module.close().unwrap();
        assert!(!module.is_open());

        let socket = module.release().unwrap();
        assert!(!socket.powered);
        assert!(!socket.bound);
        assert_eq!(socket.unbinds, 1);
    }
}
