/// Server configuration constants.
/// Address and port the WebSocket endpoint binds to.
pub const BIND_ADDR: &str = "0.0.0.0";

pub const BIND_PORT: u16 = 6858;
