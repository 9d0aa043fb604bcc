//! Per-connection message handling.
//!
//! Every frame is a JSON array holding one message object keyed by its type,
//! e.g. `[{"RequestServerInfo":{"Id":1,"ClientName":"..","MessageVersion":2}}]`.
//! Only the first message of a frame is handled. Unknown types get an `Ok`.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use serial_servo::{IntensityConfig, IntensityEstimator};
use std::time::Duration;

pub const SERVER_NAME: &str = "Intiface Server";
pub const DEVICE_NAME: &str = "Venus2000 (Lustbound Adapter)";
pub const SUPPORTED_MESSAGE_VERSION: u32 = 2;
/// Client names must contain this.
pub const CLIENT_NAME_TAG: &str = "Lustbound";
/// Vibration steps advertised for the single feature, one per servo degree.
pub const VIBRATE_STEP_COUNT: u32 = 180;

pub const ERROR_INIT: u32 = 1;
pub const ERROR_MSG: u32 = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RequestServerInfo {
    client_name: String,
    message_version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VibrateCmd {
    speeds: Vec<SpeedCmd>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SpeedCmd {
    speed: f32,
}

/// Outcome of one handled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Frame to send back.
    pub response: Value,
    /// New intensity to forward to the servo, if the frame produced one.
    pub intensity: Option<f32>,
}

impl Reply {
    fn respond(response: Value) -> Self {
        Self {
            response,
            intensity: None,
        }
    }
}

pub struct Session {
    message_version: u32,
    estimator: IntensityEstimator,
}

impl Session {
    pub fn new(config: IntensityConfig) -> Self {
        Self {
            message_version: SUPPORTED_MESSAGE_VERSION,
            estimator: IntensityEstimator::new(config),
        }
    }

    /// How long to wait for the next frame before releasing the servo.
    /// `None` until the first `VibrateCmd` and again after each timeout.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.estimator
            .last_command_ms()
            .map(|_| Duration::from_millis(self.estimator.config().idle_timeout_ms as u64))
    }

    /// Drops the estimator history. Returns the intensity to send, always 0.
    pub fn on_idle(&mut self) -> f32 {
        self.estimator.reset();
        0.0
    }

    /// Handles one text frame received `now_ms` after the client connected.
    pub fn handle_text(&mut self, text: &str, now_ms: u32) -> Reply {
        let frame: Vec<Map<String, Value>> = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!("malformed frame: {err}");
                return Reply::respond(error(0, ERROR_MSG, "Malformed message frame."));
            }
        };
        let Some((kind, body)) = frame.first().and_then(|message| message.iter().next()) else {
            return Reply::respond(error(0, ERROR_MSG, "Empty message frame."));
        };
        let id = body.get("Id").and_then(Value::as_u64).unwrap_or(0);

        match kind.as_str() {
            "RequestServerInfo" => Reply::respond(self.server_info(id, body)),
            "RequestDeviceList" if self.message_version == SUPPORTED_MESSAGE_VERSION => {
                Reply::respond(device_list(id))
            }
            "VibrateCmd" => self.vibrate(id, body, now_ms),
            _ => Reply::respond(ok(id)),
        }
    }

    fn server_info(&mut self, id: u64, body: &Value) -> Value {
        let request = match RequestServerInfo::deserialize(body) {
            Ok(request) => request,
            Err(err) => return error(id, ERROR_MSG, &err.to_string()),
        };
        self.message_version = request.message_version;

        if request.message_version != SUPPORTED_MESSAGE_VERSION {
            return error(
                id,
                ERROR_INIT,
                "This server can only handle a message version 2 client.",
            );
        }
        if !request.client_name.contains(CLIENT_NAME_TAG) {
            return error(
                id,
                ERROR_INIT,
                "This server can only handle a Lustbound client.",
            );
        }
        tracing::info!("client {} connected", request.client_name);
        json!([{"ServerInfo": {
            "Id": id,
            "MessageVersion": request.message_version,
            "MaxPingTime": 0,
            "ServerName": SERVER_NAME,
        }}])
    }

    fn vibrate(&mut self, id: u64, body: &Value, now_ms: u32) -> Reply {
        let speed = match VibrateCmd::deserialize(body) {
            Ok(cmd) => cmd.speeds.first().map(|s| s.speed),
            Err(err) => return Reply::respond(error(id, ERROR_MSG, &err.to_string())),
        };
        let Some(speed) = speed else {
            return Reply::respond(error(id, ERROR_MSG, "VibrateCmd without speeds."));
        };

        Reply {
            response: ok(id),
            intensity: self.estimator.update(speed, now_ms),
        }
    }
}

fn ok(id: u64) -> Value {
    json!([{"Ok": {"Id": id}}])
}

fn error(id: u64, code: u32, message: &str) -> Value {
    json!([{"Error": {"Id": id, "ErrorCode": code, "ErrorMessage": message}}])
}

fn device_list(id: u64) -> Value {
    json!([{"DeviceList": {
        "Id": id,
        "Devices": [{
            "DeviceIndex": 0,
            "DeviceName": DEVICE_NAME,
            "DeviceMessages": {
                "VibrateCmd": {"FeatureCount": 1, "StepCount": [VIBRATE_STEP_COUNT]},
                "StopDeviceCmd": {},
            },
        }],
    }}])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(IntensityConfig::default())
    }

    fn handshake(session: &mut Session, name: &str, version: u32) -> Value {
        let frame = json!([{"RequestServerInfo": {"Id": 1, "ClientName": name, "MessageVersion": version}}]);
        session.handle_text(&frame.to_string(), 0).response
    }

    fn vibrate(speed: f32, id: u64) -> String {
        json!([{"VibrateCmd": {"Id": id, "DeviceIndex": 0, "Speeds": [{"Index": 0, "Speed": speed}]}}])
            .to_string()
    }

    #[test]
    fn accepts_lustbound_v2_client() {
        let response = handshake(&mut session(), "Lustbound 1.2", 2);
        assert_eq!(response[0]["ServerInfo"]["Id"], 1);
        assert_eq!(response[0]["ServerInfo"]["ServerName"], SERVER_NAME);
        assert_eq!(response[0]["ServerInfo"]["MessageVersion"], 2);
    }

    #[test]
    fn rejects_other_message_versions() {
        let mut session = session();
        let response = handshake(&mut session, "Lustbound", 3);
        assert_eq!(response[0]["Error"]["ErrorCode"], ERROR_INIT);
        assert_eq!(response[0]["Error"]["Id"], 1);

        // device list is only served to v2 clients
        let list = session.handle_text(r#"[{"RequestDeviceList":{"Id":2}}]"#, 0);
        assert_eq!(list.response, json!([{"Ok": {"Id": 2}}]));
    }

    #[test]
    fn rejects_other_clients() {
        let response = handshake(&mut session(), "Intiface Central", 2);
        assert_eq!(response[0]["Error"]["ErrorCode"], ERROR_INIT);
        assert_eq!(
            response[0]["Error"]["ErrorMessage"],
            "This server can only handle a Lustbound client."
        );
    }

    #[test]
    fn lists_single_vibrator() {
        let reply = session().handle_text(r#"[{"RequestDeviceList":{"Id":7}}]"#, 0);
        let device = &reply.response[0]["DeviceList"]["Devices"][0];
        assert_eq!(reply.response[0]["DeviceList"]["Id"], 7);
        assert_eq!(device["DeviceName"], DEVICE_NAME);
        assert_eq!(device["DeviceMessages"]["VibrateCmd"]["StepCount"], json!([180]));
        assert_eq!(device["DeviceMessages"]["StopDeviceCmd"], json!({}));
        assert_eq!(reply.intensity, None);
    }

    #[test]
    fn unknown_messages_get_ok() {
        let reply = session().handle_text(r#"[{"StartScanning":{"Id":4}}]"#, 0);
        assert_eq!(reply.response, json!([{"Ok": {"Id": 4}}]));
    }

    #[test]
    fn malformed_frames_get_error() {
        let mut session = session();
        for text in ["not json", "[]", "[{}]"] {
            let reply = session.handle_text(text, 0);
            assert_eq!(reply.response[0]["Error"]["ErrorCode"], ERROR_MSG);
        }
        let reply = session.handle_text(r#"[{"VibrateCmd":{"Id":5,"Speeds":[]}}]"#, 0);
        assert_eq!(reply.response[0]["Error"]["Id"], 5);
    }

    #[test]
    fn vibrate_feeds_estimator_and_arms_timeout() {
        let mut session = session();
        assert_eq!(session.idle_timeout(), None);

        let first = session.handle_text(&vibrate(0.25, 10), 0);
        assert_eq!(first.response, json!([{"Ok": {"Id": 10}}]));
        assert_eq!(first.intensity, Some(0.0));
        assert_eq!(session.idle_timeout(), Some(Duration::from_millis(100)));

        let second = session.handle_text(&vibrate(0.75, 11), 50);
        assert!(second.intensity.unwrap() > 0.0);
    }

    #[test]
    fn quiet_vibrate_still_arms_timeout() {
        let mut session = session();
        let reply = session.handle_text(&vibrate(0.0, 1), 0);
        assert_eq!(reply.intensity, None);
        assert!(session.idle_timeout().is_some());
    }

    #[test]
    fn idle_releases_and_disarms() {
        let mut session = session();
        session.handle_text(&vibrate(0.25, 1), 0);
        session.handle_text(&vibrate(0.75, 2), 10);
        assert_eq!(session.on_idle(), 0.0);
        assert_eq!(session.idle_timeout(), None);
        // history is gone, the next sample starts from scratch
        assert_eq!(session.handle_text(&vibrate(0.75, 3), 20).intensity, Some(0.0));
    }
}
