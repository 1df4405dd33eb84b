use droidrec_engine::protocol::EventCategory;
use droidrec_engine::tokenizer::tokenize;

#[test]
fn test_tokenize_key_line() {
    let event = tokenize("[   5128.531209] /dev/input/event0: EV_KEY       KEY_BACK             DOWN")
        .unwrap();
    assert_eq!(event.category, EventCategory::Key);
    assert_eq!(event.code, "KEY_BACK");
    assert_eq!(event.value, "DOWN");
    assert!((event.timestamp - 5128.531209).abs() < 1e-9);
}

#[test]
fn test_tokenize_position_lines() {
    let x = tokenize("[ 10.000100] /dev/input/event2: EV_ABS       ABS_MT_POSITION_X    000001f4")
        .unwrap();
    assert_eq!(x.category, EventCategory::PositionX);
    assert_eq!(x.value, "000001f4");

    let y = tokenize("[ 10.000100] /dev/input/event2: EV_ABS       ABS_MT_POSITION_Y    00000a00")
        .unwrap();
    assert_eq!(y.category, EventCategory::PositionY);
    assert_eq!(y.value, "00000a00");

    let id = tokenize("[ 10.2] /dev/input/event2: EV_ABS       ABS_MT_TRACKING_ID   ffffffff")
        .unwrap();
    assert_eq!(id.category, EventCategory::TrackingId);
    assert_eq!(id.value, "ffffffff");
}

#[test]
fn test_minimal_line_without_device_prefix() {
    let event = tokenize("[0.000] EV_KEY KEY_BACK DOWN").unwrap();
    assert_eq!(event.timestamp, 0.0);
    assert_eq!(event.code, "KEY_BACK");
    assert_eq!(event.value, "DOWN");
}

#[test]
fn test_noise_is_dropped() {
    let noise = [
        "",
        "add device 1: /dev/input/event2",
        "  name:     \"sec_touchscreen\"",
        "EV_KEY KEY_A DOWN",
        "[ garbage ] EV_KEY KEY_A DOWN",
        "[   12.000] /dev/input/event2: EV_SYN       SYN_REPORT           00000000",
        "[   12.000] /dev/input/event2: EV_ABS       ABS_MT_PRESSURE      0000002a",
        "[   12.000] /dev/input/event2: EV_KEY       BTN_TOUCH            DOWN",
        "[   12.0",
    ];
    for line in noise {
        assert!(tokenize(line).is_none(), "expected {:?} to be dropped", line);
    }
}
