use dmp_config::{AppConfig, ConfigError};

#[test]
fn credentials_must_come_in_pairs() {
    unsafe {
        std::env::set_var("DMP_MQTT_USERNAME", "bridge");
        std::env::remove_var("DMP_MQTT_PASSWORD");
    }
    let err = AppConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing(ref key) if key == "DMP_MQTT_PASSWORD"));

    unsafe {
        std::env::remove_var("DMP_MQTT_USERNAME");
        std::env::set_var("DMP_MQTT_PASSWORD", "secret");
    }
    let err = AppConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing(ref key) if key == "DMP_MQTT_USERNAME"));

    unsafe {
        std::env::set_var("DMP_MQTT_USERNAME", "bridge");
    }
    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.mqtt_username.as_deref(), Some("bridge"));
    assert_eq!(config.mqtt_password.as_deref(), Some("secret"));
}
