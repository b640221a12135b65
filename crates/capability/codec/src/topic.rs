//! 协议 topic 常量。

pub const FIRE_ALARM: &str = "/fire_alarm";
pub const FAULT_ALARM: &str = "/fault_alarm";
pub const REGISTER: &str = "/register";
pub const UNREGISTER: &str = "/unregister";
pub const DEV_MSG: &str = "/dev_msg";
pub const DEVICE_ONLINE_STATUS: &str = "/device_online_status";
pub const READ_PROPERTY: &str = "/read-property";
pub const REPORT_PROPERTY: &str = "/report-property";
pub const WRITE_PROPERTY: &str = "/write-property";
pub const INVOKE_FUNCTION: &str = "/invoke-function";
pub const CHILDREN: &str = "/children";

/// 事件名（与 topic 去掉前导 `/` 相同）。
pub const EVENT_FIRE_ALARM: &str = "fire_alarm";
pub const EVENT_FAULT_ALARM: &str = "fault_alarm";
pub const EVENT_DEV_MSG: &str = "dev_msg";
