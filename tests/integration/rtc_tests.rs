//! DS1307 driver against a register-file bus mock.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use wiegand_periph::drivers::ds1307::{DS1307_ADDRESS, DateTime, Ds1307};
use wiegand_periph::error::RtcError;

use crate::mock_hw::{HwEvent, Journal, MockI2c};

fn sample() -> DateTime {
    DateTime {
        second: 45,
        minute: 30,
        hour: 21,
        day_of_week: 5,
        day_of_month: 16,
        month: 10,
        year: 26,
    }
}

#[test]
fn set_datetime_writes_bcd_from_register_zero() {
    let journal = Journal::new();
    let mut rtc = Ds1307::new(MockI2c::new(DS1307_ADDRESS, &journal));

    rtc.set_datetime(&sample()).unwrap();

    let bus = rtc.release();
    assert_eq!(
        bus.writes(),
        vec![vec![0x00, 0x45, 0x30, 0x21, 0x05, 0x16, 0x10, 0x26]]
    );
    assert_eq!(bus.regs[0] & 0x80, 0, "clock must be running");
}

#[test]
fn datetime_reads_back_what_was_set() {
    let journal = Journal::new();
    let mut rtc = Ds1307::new(MockI2c::new(DS1307_ADDRESS, &journal));

    rtc.set_datetime(&sample()).unwrap();
    assert_eq!(rtc.datetime().unwrap(), sample());
    assert!(!rtc.is_halted().unwrap());
    assert!(journal.events().contains(&HwEvent::I2cRead {
        addr: DS1307_ADDRESS,
        len: 7
    }));
}

#[test]
fn halt_sets_clock_halt_bit() {
    let journal = Journal::new();
    let mut rtc = Ds1307::new(MockI2c::new(DS1307_ADDRESS, &journal));
    rtc.set_datetime(&sample()).unwrap();

    rtc.halt().unwrap();

    assert!(rtc.is_halted().unwrap());
    // CH is masked out of the seconds value.
    assert_eq!(rtc.datetime().unwrap().second, 0);
}

#[test]
fn twelve_hour_flag_is_ignored_on_read() {
    let journal = Journal::new();
    let mut bus = MockI2c::new(DS1307_ADDRESS, &journal);
    bus.regs[..7].copy_from_slice(&[0x59, 0x59, 0x40 | 0x11, 0x07, 0x31, 0x12, 0x99]);
    let mut rtc = Ds1307::new(bus);

    let dt = rtc.datetime().unwrap();

    assert_eq!((dt.hour, dt.minute, dt.second), (11, 59, 59));
    assert_eq!((dt.day_of_month, dt.month, dt.year), (31, 12, 99));
}

#[test]
fn invalid_fields_never_reach_the_bus() {
    let journal = Journal::new();
    let mut rtc = Ds1307::new(MockI2c::new(DS1307_ADDRESS, &journal));
    let dt = DateTime {
        month: 13,
        ..sample()
    };

    assert_eq!(rtc.set_datetime(&dt), Err(RtcError::InvalidField("month")));
    assert!(journal.events().is_empty());
}

#[test]
fn bus_failure_maps_to_error_kind() {
    let journal = Journal::new();
    let mut bus = MockI2c::new(DS1307_ADDRESS, &journal);
    bus.fail = true;
    let mut rtc = Ds1307::new(bus);

    assert_eq!(
        rtc.datetime(),
        Err(RtcError::Bus(ErrorKind::NoAcknowledge(
            NoAcknowledgeSource::Address
        )))
    );
}
