use std::net::{Ipv4Addr, SocketAddrV4};

use libw5500::network::error::Error;
use libw5500::network::udp;
use libw5500::network::{Protocol, SocketFlags, SocketStatus, SocketTransport};
use rand::Rng;

use super::mock::{Call, MockChip, StepClock};

fn ready_chip() -> MockChip {
    let mut chip = MockChip::new();
    chip.open(3, Protocol::Udp, 3000, SocketFlags::empty()).unwrap();
    chip
}

fn sender() -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 9), 40000)
}

#[test]
fn echo_returns_payload_without_header() {
    let mut chip = ready_chip();
    let clock = StepClock::new();
    let mut buf = [0u8; 2048];
    let mut rng = rand::thread_rng();

    for _ in 0..16 {
        let len = rng.gen_range(1..=1472);
        let payload: Vec<u8> = (0..len).map(|_| rng.r#gen()).collect();
        chip.deliver_datagram(sender(), &payload);

        assert_eq!(udp::echo(&mut chip, &clock, 3, &mut buf, 1000), Ok(Some(len)));
        let (echoed, to) = chip.sent_to.pop().unwrap();
        assert_eq!(echoed, payload);
        assert_eq!(to, sender());
    }
}

#[test]
fn echo_times_out_quietly() {
    let mut chip = ready_chip();
    let clock = StepClock::new();
    let mut buf = [0u8; 64];
    assert_eq!(udp::echo(&mut chip, &clock, 3, &mut buf, 50), Ok(None));
    assert!(chip.sent_to.is_empty());
}

#[test]
fn header_only_datagram_is_not_echoed() {
    let mut chip = ready_chip();
    let clock = StepClock::new();
    let mut buf = [0u8; 64];
    chip.deliver_datagram(sender(), b"");
    assert_eq!(udp::echo(&mut chip, &clock, 3, &mut buf, 50), Ok(None));
    assert!(chip.sent_to.is_empty());
}

#[test]
fn status_change_closes_socket() {
    let mut chip = ready_chip();
    chip.script.push_back(SocketStatus::Closed);
    let clock = StepClock::new();
    let mut buf = [0u8; 64];
    assert_eq!(udp::echo(&mut chip, &clock, 3, &mut buf, 1000), Err(Error::ConnectionLost));
    assert_eq!(chip.calls.last(), Some(&Call::Close(3)));
}

#[test]
fn non_blocking_helpers() {
    let mut chip = MockChip::new();
    let mut buf = [0u8; 4];
    assert_eq!(udp::receive_from(&mut chip, 3, &mut buf), Err(Error::NotReady));
    assert_eq!(udp::send_to(&mut chip, 3, b"x", sender()), Err(Error::NotReady));

    let mut chip = ready_chip();
    assert_eq!(udp::receive_from(&mut chip, 3, &mut buf), Ok(None));

    chip.deliver_datagram(sender(), b"abcdef");
    assert_eq!(udp::receive_from(&mut chip, 3, &mut buf), Ok(Some((4, sender()))));
    assert_eq!(&buf, b"abcd");

    assert_eq!(udp::send_to(&mut chip, 3, b"hey", sender()), Ok(3));
    assert_eq!(chip.sent_to, vec![(b"hey".to_vec(), sender())]);
}
