mod common;

use common::decoder;
use dmp_codec::{DecodeError, DeviceMessageCodec, Transport};
use domain::{DeviceMessage, MqttMessage, ReadPropertyMessage};

#[test]
fn codec_speaks_mqtt() {
    let (decoder, _) = decoder();
    let codec = DeviceMessageCodec::new(decoder);

    assert_eq!(codec.supported_transport(), Transport::Mqtt);
}

#[test]
fn decodes_json_bytes() {
    let (decoder, _) = decoder();
    let codec = DeviceMessageCodec::new(decoder);
    let message = MqttMessage::new(
        "/device_online_status",
        br#"{"deviceId":"d1","status":"1"}"#.to_vec(),
    );

    let decoded = codec.decode(Some("d1"), &message).expect("decoded");

    assert!(matches!(decoded, DeviceMessage::DeviceOnline(ref m) if m.device_id == "d1"));
}

#[test]
fn invalid_json_is_malformed() {
    let (decoder, _) = decoder();
    let codec = DeviceMessageCodec::new(decoder);

    for payload in [&b"not json"[..], &b"[1,2,3]"[..], &b""[..]] {
        let message = MqttMessage::new("/register", payload.to_vec());
        let err = codec.decode(None, &message).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { ref topic, .. } if topic == "/register"));
    }
}

#[test]
fn encodes_to_json_bytes_and_back() {
    let (decoder, _) = decoder();
    let codec = DeviceMessageCodec::new(decoder);
    let message: DeviceMessage = ReadPropertyMessage {
        device_id: "d1".to_string(),
        message_id: "m-1".to_string(),
        timestamp: None,
        properties: vec!["temp".to_string()],
    }
    .into();

    let encoded = codec.encode(&message).expect("encoded");
    assert_eq!(encoded.topic, "/read-property");
    assert_eq!(
        String::from_utf8(encoded.payload.clone()).expect("utf8"),
        r#"{"messageId":"m-1","deviceId":"d1","properties":["temp"]}"#
    );

    let decoded = codec.decode(Some("d1"), &encoded).expect("decoded");
    assert_eq!(decoded, message);
}
