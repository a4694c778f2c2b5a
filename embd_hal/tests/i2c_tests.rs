//! I²C bus behaviour against a recording device.

use embd_common::{Error, Result};
use embd_hal::i2c::{BusLink, I2cBus, I2cDevice, I2cDriver, I2cMessage, LinuxI2cBus};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    SetSlave(u8),
    Read(usize),
    Write(Vec<u8>),
    /// One `I2C_RDWR` call: (addr, flags, len, payload for writes).
    Transfer(Vec<(u8, u16, usize, Vec<u8>)>),
}

#[derive(Clone, Default)]
struct Recorder {
    ops: Arc<Mutex<Vec<Op>>>,
    /// Bytes returned by reads, cycled.
    reply: Arc<Mutex<Vec<u8>>>,
}

impl Recorder {
    fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    fn reply_with(&self, bytes: &[u8]) {
        *self.reply.lock() = bytes.to_vec();
    }

    fn fill(&self, buf: &mut [u8]) {
        let reply = self.reply.lock();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = reply.get(i).copied().unwrap_or(0);
        }
    }
}

struct MockDevice(Recorder);

impl I2cDevice for MockDevice {
    fn set_slave(&mut self, addr: u8) -> Result<()> {
        self.0.ops.lock().push(Op::SetSlave(addr));
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.0.fill(buf);
        self.0.ops.lock().push(Op::Read(buf.len()));
        Ok(buf.len())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.0.ops.lock().push(Op::Write(data.to_vec()));
        Ok(data.len())
    }

    fn transfer(&mut self, msgs: &mut [I2cMessage<'_>]) -> Result<()> {
        let mut record = Vec::new();
        for msg in msgs.iter_mut() {
            let (addr, flags, len) = (msg.addr(), msg.flags(), msg.len());
            match msg {
                I2cMessage::Write { data, .. } => record.push((addr, flags, len, data.to_vec())),
                I2cMessage::Read { buf, .. } => {
                    self.0.fill(buf);
                    record.push((addr, flags, len, Vec::new()));
                }
            }
        }
        self.0.ops.lock().push(Op::Transfer(record));
        Ok(())
    }
}

fn bus(recorder: &Recorder, write_delay: Option<Duration>) -> LinuxI2cBus {
    let recorder = recorder.clone();
    LinuxI2cBus::with_opener(1, BusLink::detached(1), write_delay, move |_| {
        Ok(Box::new(MockDevice(recorder.clone())) as Box<dyn I2cDevice>)
    })
}

#[test]
fn slave_address_is_selected_only_on_change() {
    let recorder = Recorder::default();
    let bus = bus(&recorder, None);

    bus.write_byte(0x20, 1).unwrap();
    bus.write_byte(0x20, 2).unwrap();
    bus.read_byte(0x20).unwrap();
    bus.write_byte(0x21, 3).unwrap();

    assert_eq!(
        recorder.ops(),
        vec![
            Op::SetSlave(0x20),
            Op::Write(vec![1]),
            Op::Write(vec![2]),
            Op::Read(1),
            Op::SetSlave(0x21),
            Op::Write(vec![3]),
        ]
    );
}

#[test]
fn word_write_is_one_big_endian_message() {
    let recorder = Recorder::default();
    let bus = bus(&recorder, None);

    bus.write_word_to_reg(0x20, 0x05, 0x1234).unwrap();

    assert_eq!(
        recorder.ops(),
        vec![Op::Transfer(vec![(0x20, 0, 3, vec![0x05, 0x12, 0x34])])]
    );
}

#[test]
fn register_read_is_combined_transaction() {
    let recorder = Recorder::default();
    recorder.reply_with(&[0xAB, 0xCD]);
    let bus = bus(&recorder, None);

    assert_eq!(bus.read_word_from_reg(0x48, 0x00).unwrap(), 0xABCD);
    assert_eq!(bus.read_byte_from_reg(0x48, 0x01).unwrap(), 0xAB);

    assert_eq!(
        recorder.ops(),
        vec![
            Op::Transfer(vec![(0x48, 0, 1, vec![0x00]), (0x48, 1, 2, Vec::new())]),
            Op::Transfer(vec![(0x48, 0, 1, vec![0x01]), (0x48, 1, 1, Vec::new())]),
        ]
    );
}

#[test]
fn write_bytes_is_single_write_without_delay() {
    let recorder = Recorder::default();
    let bus = bus(&recorder, None);

    bus.write_bytes(0x40, &[1, 2, 3]).unwrap();
    assert_eq!(
        recorder.ops(),
        vec![Op::SetSlave(0x40), Op::Write(vec![1, 2, 3])]
    );
}

#[test]
fn write_bytes_goes_byte_by_byte_with_delay() {
    let recorder = Recorder::default();
    let bus = bus(&recorder, Some(Duration::from_millis(1)));

    bus.write_bytes(0x40, &[1, 2, 3]).unwrap();
    assert_eq!(
        recorder.ops(),
        vec![
            Op::SetSlave(0x40),
            Op::Write(vec![1]),
            Op::Write(vec![2]),
            Op::Write(vec![3]),
        ]
    );
}

#[test]
fn read_bytes_returns_device_data() {
    let recorder = Recorder::default();
    recorder.reply_with(&[9, 8, 7]);
    let bus = bus(&recorder, None);
    assert_eq!(bus.read_bytes(0x10, 3).unwrap(), vec![9, 8, 7]);
}

#[test]
fn device_is_opened_lazily_once() {
    let opens = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opens);
    let recorder = Recorder::default();
    let bus = LinuxI2cBus::with_opener(2, BusLink::detached(2), None, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDevice(recorder.clone())) as Box<dyn I2cDevice>)
    });

    assert_eq!(opens.load(Ordering::SeqCst), 0);
    bus.write_byte(0x20, 0).unwrap();
    bus.write_byte(0x20, 0).unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 1);
}

#[test]
fn closed_bus_rejects_operations() {
    let recorder = Recorder::default();
    let bus = bus(&recorder, None);
    bus.write_byte(0x20, 0).unwrap();
    bus.close().unwrap();
    bus.close().unwrap();
    assert!(matches!(bus.write_byte(0x20, 0), Err(Error::Closed(_))));
}

#[test]
fn driver_caches_buses_until_closed() {
    let recorder = Recorder::default();
    let driver = I2cDriver::new(Box::new(move |n, link| {
        let recorder = recorder.clone();
        Ok(Arc::new(LinuxI2cBus::with_opener(n, link, None, move |_| {
            Ok(Box::new(MockDevice(recorder.clone())) as Box<dyn I2cDevice>)
        })) as Arc<dyn I2cBus>)
    }));

    let a = driver.bus(1).unwrap();
    let b = driver.bus(1).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(driver.open_buses(), 1);

    a.close().unwrap();
    assert_eq!(driver.open_buses(), 0);
    let c = driver.bus(1).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));

    driver.close().unwrap();
    assert_eq!(driver.open_buses(), 0);
    assert!(matches!(c.read_byte(0x20), Err(Error::Closed(_))));
}
