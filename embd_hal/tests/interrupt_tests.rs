//! Interrupt dispatcher tests over real epoll and `pipe(2)` descriptors.

use embd_common::Error;
use embd_hal::interrupt::Dispatcher;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn pipe() -> (File, File) {
    let (read, write) = nix::unistd::pipe().unwrap();
    (File::from(read), File::from(write))
}

fn is_nonblocking(file: &File) -> bool {
    let bits = fcntl(file.as_fd(), FcntlArg::F_GETFL).unwrap();
    OFlag::from_bits_truncate(bits).contains(OFlag::O_NONBLOCK)
}

/// Read everything currently buffered from a non-blocking pipe.
fn drain(file: &mut File) {
    let mut buf = [0u8; 64];
    loop {
        match file.read(&mut buf) {
            Ok(0) => return,
            Ok(_) => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return,
            Err(e) => panic!("drain failed: {e}"),
        }
    }
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

fn counting(counter: &Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn first_event_is_suppressed_then_callbacks_fire() {
    let dispatcher = Dispatcher::new().unwrap();
    let (mut rx, mut tx) = pipe();
    let hits = Arc::new(AtomicUsize::new(0));

    dispatcher.register(rx.as_fd(), counting(&hits)).unwrap();

    tx.write_all(b"x").unwrap();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    drain(&mut rx);

    tx.write_all(b"y").unwrap();
    assert!(wait_until(Duration::from_secs(2), || hits.load(Ordering::SeqCst) == 1));
    drain(&mut rx);

    tx.write_all(b"z").unwrap();
    assert!(wait_until(Duration::from_secs(2), || hits.load(Ordering::SeqCst) == 2));

    dispatcher.unregister(rx.as_fd()).unwrap();
}

#[test]
fn duplicate_registration_is_rejected() {
    let dispatcher = Dispatcher::new().unwrap();
    let (rx, _tx) = pipe();

    dispatcher.register(rx.as_fd(), || {}).unwrap();
    let err = dispatcher.register(rx.as_fd(), || {}).unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered(fd) if fd == rx.as_raw_fd()));
    assert_eq!(dispatcher.len(), 1);

    dispatcher.unregister(rx.as_fd()).unwrap();
}

#[test]
fn registration_toggles_nonblocking_mode() {
    let dispatcher = Dispatcher::new().unwrap();
    let (rx, _tx) = pipe();
    assert!(!is_nonblocking(&rx));

    dispatcher.register(rx.as_fd(), || {}).unwrap();
    assert!(is_nonblocking(&rx));
    assert!(dispatcher.is_registered(rx.as_raw_fd()));

    dispatcher.unregister(rx.as_fd()).unwrap();
    assert!(!is_nonblocking(&rx));
    assert!(!dispatcher.is_registered(rx.as_raw_fd()));
    assert!(dispatcher.is_empty());
}

#[test]
fn unregister_unknown_descriptor_is_ok() {
    let dispatcher = Dispatcher::new().unwrap();
    let (rx, _tx) = pipe();
    dispatcher.unregister(rx.as_fd()).unwrap();
}

#[test]
fn no_callbacks_after_unregister() {
    let dispatcher = Dispatcher::new().unwrap();
    let (mut rx, mut tx) = pipe();
    let hits = Arc::new(AtomicUsize::new(0));

    dispatcher.register(rx.as_fd(), counting(&hits)).unwrap();
    tx.write_all(b"a").unwrap();
    thread::sleep(Duration::from_millis(100));
    drain(&mut rx);
    tx.write_all(b"b").unwrap();
    assert!(wait_until(Duration::from_secs(2), || hits.load(Ordering::SeqCst) == 1));

    dispatcher.unregister(rx.as_fd()).unwrap();
    tx.write_all(b"c").unwrap();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn independent_descriptors_dispatch_separately() {
    let dispatcher = Dispatcher::new().unwrap();
    let (mut rx_a, mut tx_a) = pipe();
    let (mut rx_b, mut tx_b) = pipe();
    let hits_a = Arc::new(AtomicUsize::new(0));
    let hits_b = Arc::new(AtomicUsize::new(0));

    dispatcher.register(rx_a.as_fd(), counting(&hits_a)).unwrap();
    dispatcher.register(rx_b.as_fd(), counting(&hits_b)).unwrap();
    assert_eq!(dispatcher.len(), 2);

    // Prime both.
    tx_a.write_all(b"1").unwrap();
    tx_b.write_all(b"1").unwrap();
    thread::sleep(Duration::from_millis(100));
    drain(&mut rx_a);
    drain(&mut rx_b);

    tx_b.write_all(b"2").unwrap();
    assert!(wait_until(Duration::from_secs(2), || hits_b.load(Ordering::SeqCst) == 1));
    assert_eq!(hits_a.load(Ordering::SeqCst), 0);

    dispatcher.unregister(rx_a.as_fd()).unwrap();
    dispatcher.unregister(rx_b.as_fd()).unwrap();
}

#[test]
fn callback_may_unregister_itself() {
    let dispatcher = Dispatcher::new().unwrap();
    let (mut rx, mut tx) = pipe();
    let rx_raw = rx.as_raw_fd();
    let hits = Arc::new(AtomicUsize::new(0));

    let inner = Arc::clone(&dispatcher);
    let counter = Arc::clone(&hits);
    dispatcher
        .register(rx.as_fd(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            // SAFETY: the pipe outlives the dispatcher registration in this test.
            let fd = unsafe { std::os::fd::BorrowedFd::borrow_raw(rx_raw) };
            inner.unregister(fd).unwrap();
        })
        .unwrap();

    tx.write_all(b"a").unwrap();
    thread::sleep(Duration::from_millis(100));
    drain(&mut rx);
    tx.write_all(b"b").unwrap();
    assert!(wait_until(Duration::from_secs(2), || dispatcher.is_empty()));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn unregister_waits_for_running_callback() {
    let dispatcher = Dispatcher::new().unwrap();
    let (mut rx, mut tx) = pipe();
    let started = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));

    let (start, finish) = (Arc::clone(&started), Arc::clone(&finished));
    dispatcher
        .register(rx.as_fd(), move || {
            start.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));
            finish.store(true, Ordering::SeqCst);
        })
        .unwrap();

    tx.write_all(b"a").unwrap();
    thread::sleep(Duration::from_millis(100));
    drain(&mut rx);
    tx.write_all(b"b").unwrap();
    assert!(wait_until(Duration::from_secs(2), || started.load(Ordering::SeqCst)));

    dispatcher.unregister(rx.as_fd()).unwrap();
    assert!(finished.load(Ordering::SeqCst));
    assert!(dispatcher.is_empty());
}

#[test]
fn unregister_survives_descriptor_reuse() {
    let dispatcher = Dispatcher::new().unwrap();
    let (rx, _tx) = pipe();
    let (other, _other_tx) = pipe();
    let mut rx = OwnedFd::from(rx);
    let raw = rx.as_raw_fd();

    dispatcher.register(rx.as_fd(), || {}).unwrap();
    // Point the registered fd number at another pipe; the kernel drops the
    // old file from the epoll set when its last reference goes away.
    nix::unistd::dup2(other.as_fd(), &mut rx).unwrap();

    dispatcher.unregister(rx.as_fd()).unwrap();
    assert!(!dispatcher.is_registered(raw));
    assert!(!is_nonblocking(&File::from(rx)));
}
