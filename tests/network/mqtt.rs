use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Mutex;

use libw5500::network::SocketStatus;
use libw5500::network::application::mqtt::packet::{
    CONNACK_ACCEPTED, PINGREQ, PINGRESP, decode_remaining_length, split_frame,
};
use libw5500::network::application::mqtt::{
    CloudClient, CloudOptions, PacketIdAllocator, QoS, encode_connect, encode_publish_with,
};
use libw5500::network::error::Error;
use libw5500::network::socket::{SessionConfig, SessionEvent, SessionState, SocketSession};
use rand::Rng;

use super::mock::{MockChip, StepClock};

static RECEIVED: Mutex<Vec<(String, Vec<u8>)>> = Mutex::new(Vec::new());

fn record(topic: &str, payload: &[u8]) {
    RECEIVED.lock().unwrap().push((topic.to_string(), payload.to_vec()));
}

fn broker() -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 20), 1883)
}

fn connected_session(chip: &mut MockChip) -> SocketSession<256> {
    let mut session = SocketSession::new(SessionConfig::cloud_client(1, 5001, broker())).unwrap();
    assert_eq!(session.poll(chip), Ok(SessionEvent::Opened));
    assert_eq!(session.poll(chip), Ok(SessionEvent::Connected));
    chip.take_sent();
    session
}

#[test]
fn accepting_connack_brings_client_online() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let options = CloudOptions::new("dev-7").with_credentials("user", "pw");
    let mut cloud = CloudClient::new(options, &clock);

    chip.replies.push_back(Some(CONNACK_ACCEPTED.to_vec()));
    assert_eq!(session.poll_with(&mut chip, &mut cloud), Ok(SessionEvent::Ready));
    assert!(cloud.is_connected());
    assert!(cloud.keepalive().is_link_up());

    let connect = chip.take_sent();
    assert_eq!(connect[0], 0x10);
    assert_eq!(&connect[4..8], b"MQTT");
    assert_eq!(connect[9], 0xC2);
    assert_eq!(&connect[12..19], b"\x00\x05dev-7");
}

#[test]
fn refused_connack_closes_socket() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let mut cloud = CloudClient::new(CloudOptions::new("dev-7"), &clock);

    chip.replies.push_back(Some(vec![0x20, 0x02, 0x00, 0x05]));
    assert_eq!(session.poll_with(&mut chip, &mut cloud), Err(Error::CloudAuthFailed));
    assert!(!cloud.is_connected());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(chip.status, SocketStatus::Closed);
}

#[test]
fn missing_connack_times_out() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let mut options = CloudOptions::new("dev-7");
    options.response_timeout_ms = 300;
    let mut cloud = CloudClient::new(options, &clock);

    assert_eq!(session.poll_with(&mut chip, &mut cloud), Err(Error::CloudAuthFailed));
    assert_eq!(chip.closes(), 1);
}

#[test]
fn oversized_connack_is_rejected() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let mut cloud = CloudClient::new(CloudOptions::new("dev-7"), &clock);

    chip.replies.push_back(Some(vec![0x20, 0x02, 0x00, 0x00, 0xD0]));
    assert_eq!(session.poll_with(&mut chip, &mut cloud), Err(Error::CloudAuthFailed));
}

#[test]
fn inbound_publish_reaches_callback() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let mut cloud = CloudClient::new(CloudOptions::new("dev-7"), &clock).on_publish(record);
    chip.replies.push_back(Some(CONNACK_ACCEPTED.to_vec()));
    session.poll_with(&mut chip, &mut cloud).unwrap();

    // PUBLISH qos0 "cmd/led" = "on", followed by a PINGRESP in the same read
    let mut frame = vec![0x30, 11, 0, 7];
    frame.extend_from_slice(b"cmd/led");
    frame.extend_from_slice(b"on");
    frame.extend_from_slice(&PINGRESP);
    chip.deliver(&frame);

    assert_eq!(
        session.poll_with(&mut chip, &mut cloud),
        Ok(SessionEvent::Received(frame.len()))
    );
    let received = RECEIVED.lock().unwrap();
    assert!(received.contains(&("cmd/led".to_string(), b"on".to_vec())));
}

#[test]
fn publish_and_keep_alive_between_polls() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let mut cloud = CloudClient::new(CloudOptions::new("dev-7"), &clock);

    assert_eq!(
        session.with_link(&mut chip, |link, buf| cloud.publish(link, buf, "t", b"x", QoS::AtMostOnce, false)),
        Err(Error::NotReady)
    );

    chip.replies.push_back(Some(CONNACK_ACCEPTED.to_vec()));
    session.poll_with(&mut chip, &mut cloud).unwrap();
    chip.take_sent();

    let sent = session
        .with_link(&mut chip, |link, buf| {
            cloud.publish(link, buf, "dev/temp", b"23.5", QoS::AtMostOnce, false)
        })
        .unwrap()
        .unwrap();
    assert_eq!(sent, 16);
    let packet = chip.take_sent();
    assert_eq!(&packet[..4], &[0x30u8, 14, 0x00, 0x08]);
    assert_eq!(&packet[4..12], b"dev/temp");
    assert_eq!(&packet[12..], b"23.5");

    chip.replies.push_back(Some(PINGRESP.to_vec()));
    assert_eq!(session.with_link(&mut chip, |link, _| cloud.keep_alive(link)), Ok(true));
    assert_eq!(chip.take_sent(), PINGREQ.to_vec());
}

#[test]
fn reconnect_sends_connect_before_any_publish() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let mut cloud = CloudClient::new(CloudOptions::new("dev-7"), &clock);
    chip.replies.push_back(Some(CONNACK_ACCEPTED.to_vec()));
    assert_eq!(session.poll_with(&mut chip, &mut cloud), Ok(SessionEvent::Ready));
    assert!(cloud.is_connected());

    chip.status = SocketStatus::Closed;
    assert_eq!(session.poll_with(&mut chip, &mut cloud), Err(Error::ConnectionLost));
    assert!(!cloud.is_connected());
    assert!(!cloud.keepalive().is_link_up());

    assert_eq!(session.poll_with(&mut chip, &mut cloud), Ok(SessionEvent::Opened));
    assert_eq!(session.poll_with(&mut chip, &mut cloud), Ok(SessionEvent::Connected));
    chip.take_sent();
    assert_eq!(
        session.with_link(&mut chip, |link, buf| cloud.publish(link, buf, "t", b"x", QoS::AtMostOnce, false)),
        Err(Error::NotReady)
    );
    assert!(chip.sent.is_empty());

    chip.replies.push_back(Some(CONNACK_ACCEPTED.to_vec()));
    assert_eq!(session.poll_with(&mut chip, &mut cloud), Ok(SessionEvent::Ready));
    assert_eq!(chip.take_sent()[0], 0x10);
    assert_eq!(
        session.with_link(&mut chip, |link, buf| cloud.publish(link, buf, "t", b"x", QoS::AtMostOnce, false)),
        Ok(Ok(6))
    );
    assert_eq!(chip.take_sent(), vec![0x30u8, 4, 0, 1, b't', b'x']);
}

#[test]
fn silent_broker_takes_client_offline() {
    let mut chip = MockChip::new();
    let clock = StepClock::new();
    let mut session = connected_session(&mut chip);
    let mut cloud = CloudClient::new(CloudOptions::new("dev-7"), &clock);
    chip.replies.push_back(Some(CONNACK_ACCEPTED.to_vec()));
    session.poll_with(&mut chip, &mut cloud).unwrap();

    assert_eq!(session.with_link(&mut chip, |link, _| cloud.keep_alive(link)), Ok(false));
    assert!(!cloud.is_connected());
    assert_eq!(cloud.keepalive().failures(), 5);
}

#[test]
fn random_publish_lengths_frame_correctly() {
    let ids = PacketIdAllocator::new();
    let mut rng = rand::thread_rng();
    let mut buf = vec![0u8; 512];

    for _ in 0..64 {
        let topic: String = (0..rng.gen_range(1..40)).map(|_| rng.gen_range('a'..='z')).collect();
        let message: Vec<u8> = (0..rng.gen_range(0..300)).map(|_| rng.r#gen()).collect();
        let qos = if rng.gen_bool(0.5) { QoS::AtLeastOnce } else { QoS::AtMostOnce };

        let len = encode_publish_with(&ids, &mut buf, &topic, &message, false, qos, false).unwrap();
        let (remaining, used) = decode_remaining_length(&buf[1..len]).unwrap();
        assert_eq!(1 + used + remaining, len);

        let (_, body, consumed) = split_frame(&buf[..len]).unwrap();
        assert_eq!(consumed, len);
        assert!(body.ends_with(&message));
    }
}

fn random_field(rng: &mut impl Rng, max: usize) -> String {
    if rng.gen_bool(0.3) {
        return String::new();
    }
    (0..rng.gen_range(1..=max)).map(|_| rng.gen_range('!'..='~')).collect()
}

#[test]
fn random_connect_fields_frame_correctly() {
    let mut rng = rand::thread_rng();
    let mut buf = vec![0u8; 1024];

    for _ in 0..64 {
        let client_id = random_field(&mut rng, 40);
        let username = random_field(&mut rng, 200);
        let password = random_field(&mut rng, 200);

        let len = encode_connect(&mut buf, &client_id, &username, &password).unwrap();
        let (remaining, used) = decode_remaining_length(&buf[1..len]).unwrap();
        assert_eq!(1 + used + remaining, len);

        // Past the 10-byte variable header only length-prefixed fields follow
        let mut payload = &buf[1 + used + 10..len];
        let mut fields: Vec<&[u8]> = Vec::new();
        while !payload.is_empty() {
            let n = u16::from_be_bytes([payload[0], payload[1]]) as usize;
            fields.push(&payload[2..2 + n]);
            payload = &payload[2 + n..];
        }
        let mut expected = vec![client_id.as_bytes()];
        expected.extend([username.as_bytes(), password.as_bytes()].into_iter().filter(|f| !f.is_empty()));
        assert_eq!(fields, expected);
    }
}
