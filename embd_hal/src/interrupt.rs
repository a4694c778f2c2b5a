//! Edge-triggered interrupt dispatch over `epoll(7)`.
//!
//! One background thread waits on a shared epoll instance and invokes the
//! callback registered for each ready descriptor. sysfs GPIO value files
//! report readiness once right after registration even though no edge
//! occurred, so the first event per registration is swallowed.
//!
//! Callbacks run on the dispatcher thread. The registry lock is released
//! before a callback is called, so a callback may register or unregister
//! descriptors (including its own). Unregistering from any other thread waits
//! for a callback already running for that descriptor, so none runs after
//! `unregister` returns.

use embd_common::consts::EPOLL_MAX_EVENTS;
use embd_common::{Error, Result};
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, error, trace};

/// Callback invoked when a registered descriptor becomes ready.
pub type InterruptCallback = Arc<dyn Fn() + Send + Sync>;

struct Registration {
    callback: InterruptCallback,
    primed: bool,
}

#[derive(Default)]
struct Table {
    entries: HashMap<RawFd, Registration>,
    /// Descriptor whose callback is running right now.
    in_flight: Option<RawFd>,
}

struct Shared {
    epoll: Epoll,
    table: Mutex<Table>,
    idle: Condvar,
}

/// epoll-backed interrupt dispatcher.
pub struct Dispatcher {
    shared: Arc<Shared>,
    worker: ThreadId,
}

impl Dispatcher {
    /// Create an epoll instance and start its dispatch thread.
    ///
    /// The thread lives for the rest of the process.
    pub fn new() -> Result<Arc<Self>> {
        let epoll = Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC)
            .map_err(|errno| Error::sys("epoll_create1", errno))?;
        let shared = Arc::new(Shared {
            epoll,
            table: Mutex::new(Table::default()),
            idle: Condvar::new(),
        });

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("embd-interrupts".into())
            .spawn(move || worker.run())
            .map_err(|e| Error::io("spawn", "embd-interrupts", e))?;

        debug!("interrupt dispatcher started");
        Ok(Arc::new(Self {
            shared,
            worker: handle.thread().id(),
        }))
    }

    /// Register `fd` for edge-triggered readiness and call `callback` on every
    /// edge after the first.
    ///
    /// The descriptor is switched to non-blocking mode for the duration of the
    /// registration.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyRegistered`] if `fd` is already registered, or
    /// [`Error::Sys`] if `fcntl`/`epoll_ctl` fails.
    pub fn register(
        &self,
        fd: BorrowedFd<'_>,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Result<()> {
        let raw = fd.as_raw_fd();
        let mut table = self.shared.table.lock();
        if table.entries.contains_key(&raw) {
            return Err(Error::AlreadyRegistered(raw));
        }

        set_nonblocking(fd, true)?;
        let event = EpollEvent::new(
            EpollFlags::EPOLLIN | EpollFlags::EPOLLET | EpollFlags::EPOLLPRI,
            raw as u64,
        );
        if let Err(errno) = self.shared.epoll.add(fd, event) {
            // Leave the descriptor the way we found it.
            let _ = set_nonblocking(fd, false);
            return Err(Error::sys("epoll_ctl(ADD)", errno));
        }

        table.entries.insert(
            raw,
            Registration {
                callback: Arc::new(callback),
                primed: false,
            },
        );
        debug!(fd = raw, "interrupt registered");
        Ok(())
    }

    /// Stop watching `fd` and restore blocking mode. Unknown descriptors are
    /// ignored.
    ///
    /// Called from outside the dispatcher thread, this waits for a callback
    /// already running for `fd` to return.
    pub fn unregister(&self, fd: BorrowedFd<'_>) -> Result<()> {
        let raw = fd.as_raw_fd();
        let mut table = self.shared.table.lock();
        if !table.entries.contains_key(&raw) {
            return Ok(());
        }

        // ENOENT: the kernel already dropped the descriptor from the set,
        // e.g. because the fd number now refers to another file.
        let deleted = match self.shared.epoll.delete(fd) {
            Ok(()) | Err(Errno::ENOENT) => {
                table.entries.remove(&raw);
                Ok(())
            }
            Err(errno) => Err(Error::sys("epoll_ctl(DEL)", errno)),
        };
        let restored = set_nonblocking(fd, false);
        if deleted.is_ok() && thread::current().id() != self.worker {
            while table.in_flight == Some(raw) {
                self.shared.idle.wait(&mut table);
            }
        }
        deleted?;
        restored?;
        debug!(fd = raw, "interrupt unregistered");
        Ok(())
    }

    /// True if `fd` currently has a registration.
    pub fn is_registered(&self, fd: RawFd) -> bool {
        self.shared.table.lock().entries.contains_key(&fd)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.shared.table.lock().entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Shared {
    fn run(self: Arc<Self>) {
        let mut events = [EpollEvent::empty(); EPOLL_MAX_EVENTS];
        loop {
            let ready = match self.epoll.wait(&mut events, EpollTimeout::NONE) {
                Ok(ready) => ready,
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    error!(%errno, "epoll_wait failed, interrupt dispatch stopped");
                    return;
                }
            };
            for event in &events[..ready] {
                self.dispatch(event.data() as RawFd);
            }
        }
    }

    fn dispatch(&self, fd: RawFd) {
        let callback = {
            let mut table = self.table.lock();
            let Some(registration) = table.entries.get_mut(&fd) else {
                // Unregistered while the event was in flight.
                return;
            };
            if !registration.primed {
                registration.primed = true;
                trace!(fd, "initial trigger suppressed");
                return;
            }
            let callback = Arc::clone(&registration.callback);
            table.in_flight = Some(fd);
            callback
        };
        callback();
        self.table.lock().in_flight = None;
        self.idle.notify_all();
    }
}

fn set_nonblocking(fd: BorrowedFd<'_>, enabled: bool) -> Result<()> {
    let bits = fcntl(fd, FcntlArg::F_GETFL).map_err(|errno| Error::sys("fcntl(F_GETFL)", errno))?;
    let mut flags = OFlag::from_bits_truncate(bits);
    flags.set(OFlag::O_NONBLOCK, enabled);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|errno| Error::sys("fcntl(F_SETFL)", errno))?;
    Ok(())
}

// ─── Process-wide Instance ──────────────────────────────────────────

static GLOBAL: Mutex<Option<Arc<Dispatcher>>> = parking_lot::const_mutex(None);

/// The process-wide dispatcher, started on first use.
pub fn global() -> Result<Arc<Dispatcher>> {
    let mut slot = GLOBAL.lock();
    if let Some(dispatcher) = slot.as_ref() {
        return Ok(Arc::clone(dispatcher));
    }
    let dispatcher = Dispatcher::new()?;
    *slot = Some(Arc::clone(&dispatcher));
    Ok(dispatcher)
}
