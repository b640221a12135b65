mod common;

use common::{decoder, object};
use dmp_codec::{EncodeError, encode};
use domain::{
    ChildDeviceMessage, DeviceMessage, DeviceOnlineMessage, EventMessage, FunctionInvokeMessage,
    FunctionParameter, MessageKind, ReadPropertyMessage, ReadPropertyMessageReply,
    WritePropertyMessage,
};
use serde_json::json;

fn read_property() -> DeviceMessage {
    ReadPropertyMessage {
        device_id: "d1".to_string(),
        message_id: "m-1".to_string(),
        timestamp: None,
        properties: vec!["temp".to_string(), "humidity".to_string()],
    }
    .into()
}

fn write_property() -> DeviceMessage {
    WritePropertyMessage {
        device_id: "d1".to_string(),
        message_id: "m-2".to_string(),
        timestamp: None,
        properties: object(json!({ "mode": "eco", "target": 21 })),
    }
    .into()
}

fn invoke_function() -> DeviceMessage {
    FunctionInvokeMessage {
        device_id: "d1".to_string(),
        message_id: "m-3".to_string(),
        timestamp: None,
        function_id: "setLevel".to_string(),
        inputs: vec![
            FunctionParameter::new("level", json!(3)),
            FunctionParameter::new("ramp", json!({ "ms": 500 })),
        ],
    }
    .into()
}

#[test]
fn read_property_payload_shape() {
    let encoded = encode(&read_property()).expect("encoded");

    assert_eq!(encoded.topic, "/read-property");
    assert_eq!(
        encoded.payload,
        object(json!({
            "messageId": "m-1",
            "deviceId": "d1",
            "properties": ["temp", "humidity"]
        }))
    );
}

#[test]
fn invoke_function_uses_function_and_args_fields() {
    let encoded = encode(&invoke_function()).expect("encoded");

    assert_eq!(encoded.topic, "/invoke-function");
    assert_eq!(encoded.payload.get("function"), Some(&json!("setLevel")));
    assert_eq!(
        encoded.payload.get("args"),
        Some(&json!([
            { "name": "level", "value": 3 },
            { "name": "ramp", "value": { "ms": 500 } }
        ]))
    );
    assert!(!encoded.payload.contains_key("functionId"));
}

#[test]
fn decode_is_left_inverse_of_encode() {
    let (decoder, ids) = decoder();

    for message in [read_property(), write_property(), invoke_function()] {
        let encoded = encode(&message).expect("encoded");
        let decoded = decoder
            .decode(Some("d1"), &encoded.topic, &encoded.payload)
            .expect("decoded");
        assert_eq!(decoded, message);
    }
    assert_eq!(ids.issued(), 0);
}

#[test]
fn child_message_round_trips_through_children_prefix() {
    let (decoder, _) = decoder();
    let message: DeviceMessage = ChildDeviceMessage::new(
        "gw-1",
        ChildDeviceMessage::new("gw-1", write_property()).into(),
    )
    .into();

    let encoded = encode(&message).expect("encoded");
    assert_eq!(encoded.topic, "/children/children/write-property");
    assert_eq!(encoded.payload, encode(&write_property()).expect("inner").payload);

    let decoded = decoder
        .decode(Some("gw-1"), &encoded.topic, &encoded.payload)
        .expect("decoded");
    assert_eq!(decoded, message);
}

#[test]
fn event_is_unsupported() {
    let event: DeviceMessage = EventMessage {
        device_id: "d1".to_string(),
        message_id: "e-1".to_string(),
        timestamp: None,
        event: "fire_alarm".to_string(),
        data: object(json!({ "deviceId": "d1" })),
    }
    .into();

    let err = encode(&event).unwrap_err();

    assert!(matches!(err, EncodeError::Unsupported { kind: MessageKind::Event }));
}

#[test]
fn replies_and_status_are_unsupported() {
    let reply: DeviceMessage = ReadPropertyMessageReply {
        device_id: "d1".to_string(),
        message_id: "m-1".to_string(),
        timestamp: None,
        properties: object(json!({ "temp": 20 })),
        success: true,
    }
    .into();
    let online: DeviceMessage = DeviceOnlineMessage {
        device_id: "d1".to_string(),
    }
    .into();

    assert!(matches!(
        encode(&reply),
        Err(EncodeError::Unsupported { kind: MessageKind::ReadPropertyReply })
    ));
    assert!(matches!(
        encode(&online),
        Err(EncodeError::Unsupported { kind: MessageKind::DeviceOnline })
    ));
}

#[test]
fn child_wrapping_unsupported_message_is_unsupported() {
    let online = DeviceOnlineMessage {
        device_id: "d2".to_string(),
    };
    let message: DeviceMessage = ChildDeviceMessage::new("gw-1", online.into()).into();

    let err = encode(&message).unwrap_err();

    assert!(matches!(err, EncodeError::Unsupported { kind: MessageKind::DeviceOnline }));
}
